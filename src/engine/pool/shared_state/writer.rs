//! ### English
//! Producer-side (render thread) mutations of `SharedPoolState`.
//!
//! ### 中文
//! `SharedPoolState` 的生产者侧（渲染线程）写操作。

use std::sync::atomic::{Ordering, fence};

use super::super::{POOL_CAPACITY, SlotRole};
use super::{SharedPoolState, SlotInfo};
use crate::engine::error::ResourceError;

impl SharedPoolState {
    /// ### English
    /// Copies a freshly created unit's description into `slot` and marks it Idle.
    ///
    /// #### Parameters
    /// - `slot`: Slot index.
    /// - `generation`: Pool generation the unit belongs to (non-zero).
    /// - `info`: Unit description.
    ///
    /// ### 中文
    /// 将新建 unit 的描述信息复制到 `slot`，并将其标记为 Idle。
    ///
    /// #### 参数
    /// - `slot`：槽位索引。
    /// - `generation`：unit 所属的 pool 代次（非 0）。
    /// - `info`：unit 描述信息。
    pub(crate) fn install(&self, slot: usize, generation: u64, info: SlotInfo) {
        let atomics = &self.slots[slot];
        atomics.generation.store(0, Ordering::Relaxed);
        fence(Ordering::Release);

        atomics.unit_id.store(info.unit_id.0, Ordering::Relaxed);
        atomics
            .texture_id
            .store(info.image.texture, Ordering::Relaxed);
        atomics
            .texture_target
            .store(info.image.target, Ordering::Relaxed);
        atomics
            .pixel_buffer
            .store(info.image.pixel_buffer.0, Ordering::Relaxed);
        atomics.width.store(info.width, Ordering::Relaxed);
        atomics.height.store(info.height, Ordering::Relaxed);
        atomics.frame_seq.store(0, Ordering::Relaxed);

        atomics.generation.store(generation, Ordering::Release);
        atomics
            .role
            .store(SlotRole::Idle as u8, Ordering::Release);
    }

    /// ### English
    /// Withdraws the current pointer and empties every slot.
    /// Must run before the units themselves are destroyed.
    ///
    /// ### 中文
    /// 撤回 current 指针并清空所有槽位。
    /// 必须在销毁 unit 本身之前执行。
    pub(crate) fn evict_all(&self) {
        self.meta.current_packed.store(0, Ordering::Release);
        for atomics in &self.slots {
            atomics
                .role
                .store(SlotRole::Empty as u8, Ordering::Release);
            atomics.generation.store(0, Ordering::Release);
        }
    }

    /// ### English
    /// Idle -> InFlight. Returns `false` if the slot is not Idle.
    ///
    /// ### 中文
    /// Idle -> InFlight。若槽位不是 Idle 则返回 `false`。
    pub(crate) fn begin_write(&self, slot: usize) -> bool {
        slot < POOL_CAPACITY
            && self.slots[slot]
                .role
                .compare_exchange(
                    SlotRole::Idle as u8,
                    SlotRole::InFlight as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
    }

    /// ### English
    /// InFlight -> Current, demoting the previous current unit to Idle.
    ///
    /// Fails with `StaleUnit` if the slot no longer belongs to `generation` or is not InFlight.
    ///
    /// #### Parameters
    /// - `slot`: Leased slot index.
    /// - `generation`: Generation recorded in the lease.
    /// - `frame_seq`: New frame sequence number (non-zero).
    ///
    /// ### 中文
    /// InFlight -> Current，同时将之前的 current unit 降为 Idle。
    ///
    /// 若槽位已不属于 `generation` 或不是 InFlight，返回 `StaleUnit`。
    ///
    /// #### 参数
    /// - `slot`：租约对应的槽位索引。
    /// - `generation`：租约记录的代次。
    /// - `frame_seq`：新的帧序号（非 0）。
    pub(crate) fn publish(
        &self,
        slot: usize,
        generation: u64,
        frame_seq: u64,
    ) -> Result<(), ResourceError> {
        let stale = ResourceError::StaleUnit { slot, generation };
        if slot >= POOL_CAPACITY || generation == 0 {
            return Err(stale);
        }

        let atomics = &self.slots[slot];
        if atomics.generation.load(Ordering::Relaxed) != generation {
            return Err(stale);
        }

        atomics.frame_seq.store(frame_seq, Ordering::Release);
        if atomics
            .role
            .compare_exchange(
                SlotRole::InFlight as u8,
                SlotRole::Current as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(stale);
        }

        let previous = self
            .meta
            .current_packed
            .swap(super::pack_current(generation, slot), Ordering::AcqRel);
        if previous != 0 {
            let (previous_generation, previous_slot) = super::unpack_current(previous);
            if previous_generation == generation && previous_slot != slot {
                let _ = self.slots[previous_slot].role.compare_exchange(
                    SlotRole::Current as u8,
                    SlotRole::Idle as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
        }
        Ok(())
    }

    /// ### English
    /// InFlight -> Idle without touching the current pointer. Returns `false` for stale leases.
    ///
    /// ### 中文
    /// InFlight -> Idle，不改动 current 指针。对过期租约返回 `false`。
    pub(crate) fn abandon(&self, slot: usize, generation: u64) -> bool {
        if slot >= POOL_CAPACITY {
            return false;
        }
        let atomics = &self.slots[slot];
        if atomics.generation.load(Ordering::Relaxed) != generation {
            return false;
        }
        atomics
            .role
            .compare_exchange(
                SlotRole::InFlight as u8,
                SlotRole::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// ### English
    /// Loads the last published sequence of a slot (producer-side LRU heuristic).
    ///
    /// ### 中文
    /// 读取槽位最近一次发布的序号（生产者侧 LRU 启发式用）。
    pub(crate) fn slot_seq_relaxed(&self, slot: usize) -> u64 {
        self.slots[slot].frame_seq.load(Ordering::Relaxed)
    }
}
