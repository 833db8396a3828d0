use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::cache;

use super::{POOL_CAPACITY, RoleCounts, SlotRole};
use slot::SlotAtomics;

pub(crate) use slot::SlotInfo;

const CACHE_PAD_U64_BYTES: usize = cache::pad_after::<AtomicU64>();

const SLOT_INDEX_BITS: u64 = 2;

#[inline]
fn pack_current(generation: u64, slot: usize) -> u64 {
    (generation << SLOT_INDEX_BITS) | (slot as u64 & ((1u64 << SLOT_INDEX_BITS) - 1))
}

#[inline]
fn unpack_current(packed: u64) -> (u64, usize) {
    (
        packed >> SLOT_INDEX_BITS,
        (packed & ((1u64 << SLOT_INDEX_BITS) - 1)) as usize,
    )
}

/// ### English
/// Lock-free role/metadata table shared between the render thread and compositor threads.
///
/// Only the render thread writes. Readers validate the slot generation after copying fields, so a
/// concurrent rebuild yields `None` rather than a torn or destroyed surface.
///
/// ### 中文
/// 渲染线程与合成器线程共享的无锁角色/元数据表。
///
/// 只有渲染线程写入。读者在复制字段后再次校验槽位代次，因此并发重建时返回 `None`，
/// 而不是撕裂的或已销毁的 surface。
#[repr(C)]
pub struct SharedPoolState {
    /// ### English
    /// Per-slot atomics.
    ///
    /// ### 中文
    /// 每个槽位的原子状态。
    slots: [SlotAtomics; POOL_CAPACITY],
    meta: PoolMeta,
}

#[repr(C, align(64))]
struct PoolMeta {
    /// ### English
    /// Packed `(generation, slot)` of the current unit; 0 = nothing published.
    ///
    /// ### 中文
    /// 当前 unit 的 packed `(generation, slot)`；0 表示尚未发布。
    current_packed: AtomicU64,
    _pad_current: [u8; CACHE_PAD_U64_BYTES],
}

impl SharedPoolState {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| SlotAtomics::new()),
            meta: PoolMeta {
                current_packed: AtomicU64::new(0),
                _pad_current: [0; CACHE_PAD_U64_BYTES],
            },
        }
    }

    /// ### English
    /// Loads a slot role with Acquire ordering.
    ///
    /// ### 中文
    /// 以 Acquire 顺序读取槽位角色。
    pub fn role(&self, slot: usize) -> SlotRole {
        match self.slots.get(slot) {
            Some(atomics) => SlotRole::from_u8(atomics.role.load(Ordering::Acquire)),
            None => SlotRole::Empty,
        }
    }

    pub fn role_counts(&self) -> RoleCounts {
        let mut counts = RoleCounts::default();
        for slot in 0..POOL_CAPACITY {
            match self.role(slot) {
                SlotRole::Empty => counts.empty += 1,
                SlotRole::Idle => counts.idle += 1,
                SlotRole::InFlight => counts.in_flight += 1,
                SlotRole::Current => counts.current += 1,
            }
        }
        counts
    }
}

impl Default for SharedPoolState {
    fn default() -> Self {
        Self::new()
    }
}

mod peek;
mod slot;
mod writer;
