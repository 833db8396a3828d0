use std::sync::atomic::{Ordering, fence};

use super::super::{DisplaySurface, POOL_CAPACITY, SlotRole};
use super::SharedPoolState;
use crate::engine::device::PixelBufferHandle;
use crate::engine::surface::UnitId;

impl SharedPoolState {
    /// ### English
    /// Returns the most recently published surface without blocking (any thread).
    ///
    /// Returns `None` if nothing was published in the live generation, or if the pool was rebuilt
    /// or a newer frame was published while the fields were being copied. Only a Current unit is
    /// ever returned, so `frame_seq` never goes backwards between calls.
    ///
    /// ### 中文
    /// 非阻塞地返回最近一次发布的 surface（任意线程可调用）。
    ///
    /// 若当前代次尚未发布任何帧，或复制字段期间 pool 被重建、有更新的帧发布，则返回 `None`。
    /// 只会返回 Current 的 unit，因此多次调用之间 `frame_seq` 不会倒退。
    pub fn peek_current(&self) -> Option<DisplaySurface> {
        let packed = self.meta.current_packed.load(Ordering::Acquire);
        if packed == 0 {
            return None;
        }
        let (generation, slot) = super::unpack_current(packed);
        if slot >= POOL_CAPACITY {
            return None;
        }

        let atomics = &self.slots[slot];
        if atomics.generation.load(Ordering::Acquire) != generation {
            return None;
        }
        if SlotRole::from_u8(atomics.role.load(Ordering::Acquire)) != SlotRole::Current {
            return None;
        }

        let surface = DisplaySurface {
            unit_id: UnitId(atomics.unit_id.load(Ordering::Relaxed)),
            texture_id: atomics.texture_id.load(Ordering::Relaxed),
            texture_target: atomics.texture_target.load(Ordering::Relaxed),
            pixel_buffer: PixelBufferHandle(atomics.pixel_buffer.load(Ordering::Relaxed)),
            width: atomics.width.load(Ordering::Relaxed),
            height: atomics.height.load(Ordering::Relaxed),
            frame_seq: atomics.frame_seq.load(Ordering::Relaxed),
        };

        /*
        ### English
        Seqlock-style validation: the copy is only trusted if the slot still belongs to the same
        generation and is still the published one after the fields were read. A `frame_seq` from a
        later reuse of this slot is a release store made after `current_packed` moved away, so the
        recheck below then sees a different word unless that later frame has itself been published.

        ### 中文
        类 seqlock 校验：只有读取完成后槽位仍属于同一代次、且仍是已发布的那个槽位，复制出的字段才可信。
        若读到的是该槽位后续复用时写入的 `frame_seq`，它是在 `current_packed` 移走之后以 release
        写入的，因此除非那一帧本身也已发布，下面的复查会看到不同的值。
        */
        fence(Ordering::Acquire);
        if atomics.generation.load(Ordering::Relaxed) != generation
            || self.meta.current_packed.load(Ordering::Relaxed) != packed
        {
            return None;
        }

        (surface.frame_seq != 0).then_some(surface)
    }
}
