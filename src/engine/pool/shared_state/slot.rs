use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64};

use crate::engine::device::ImageInfo;
use crate::engine::pool::SlotRole;
use crate::engine::surface::UnitId;

/// ### English
/// Plain values copied into a slot when a unit is installed.
///
/// ### 中文
/// 安装 unit 时复制进槽位的纯值信息。
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlotInfo {
    pub unit_id: UnitId,
    pub image: ImageInfo,
    pub width: u32,
    pub height: u32,
}

#[repr(C, align(64))]
pub(super) struct SlotAtomics {
    /// ### English
    /// Slot role (`SlotRole as u8`).
    ///
    /// ### 中文
    /// 槽位角色（`SlotRole as u8`）。
    pub(super) role: AtomicU8,
    /// ### English
    /// Pool generation the installed unit belongs to; 0 while empty or being rewritten.
    ///
    /// ### 中文
    /// 已安装 unit 所属的 pool 代次；为空或正在改写时为 0。
    pub(super) generation: AtomicU64,
    pub(super) unit_id: AtomicU64,
    /// ### English
    /// GL texture name aliasing the pixel buffer.
    ///
    /// ### 中文
    /// 与像素缓冲区共享存储的 GL 纹理名。
    pub(super) texture_id: AtomicU32,
    pub(super) texture_target: AtomicU32,
    pub(super) pixel_buffer: AtomicU64,
    /// ### English
    /// Sequence of the last frame published from this slot (0 = never published).
    ///
    /// ### 中文
    /// 该槽位最近一次发布帧的序号（0 = 从未发布）。
    pub(super) frame_seq: AtomicU64,
    pub(super) width: AtomicU32,
    pub(super) height: AtomicU32,
}

impl SlotAtomics {
    pub(super) fn new() -> Self {
        Self {
            role: AtomicU8::new(SlotRole::Empty as u8),
            generation: AtomicU64::new(0),
            unit_id: AtomicU64::new(0),
            texture_id: AtomicU32::new(0),
            texture_target: AtomicU32::new(0),
            pixel_buffer: AtomicU64::new(0),
            frame_seq: AtomicU64::new(0),
            width: AtomicU32::new(0),
            height: AtomicU32::new(0),
        }
    }
}
