/// ### English
/// Rotation pool: three surface units cycled between the render thread (producer) and the
/// compositor (consumer). Role bookkeeping lives in lock-free shared state so the consumer can
/// peek the current surface without blocking the producer.
///
/// ### 中文
/// 轮转池：三个 surface unit 在渲染线程（生产者）与合成器（消费者）之间循环使用。
/// 角色信息保存在无锁共享状态中，消费者可以在不阻塞生产者的情况下查看当前 surface。
mod rotation;
mod shared_state;

pub use rotation::RotationPool;
pub use shared_state::SharedPoolState;

use dpi::PhysicalSize;

use crate::engine::device::{GlName, PixelBufferHandle};
use crate::engine::surface::UnitId;

/// ### English
/// Fixed pool capacity (triple buffering).
///
/// ### 中文
/// 固定的 pool 容量（三缓冲）。
pub const POOL_CAPACITY: usize = 3;

/// ### English
/// Role of one pool slot.
///
/// ### 中文
/// 单个 pool 槽位的角色。
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRole {
    /// ### English
    /// No unit (pool never built, cleared, or being rebuilt).
    ///
    /// ### 中文
    /// 没有 unit（pool 尚未构建、已清空或正在重建）。
    Empty = 0,
    /// ### English
    /// Unit available for the next draw.
    ///
    /// ### 中文
    /// unit 可用于下一次绘制。
    Idle = 1,
    /// ### English
    /// Unit leased to the producer and being drawn into.
    ///
    /// ### 中文
    /// unit 已租给生产者，正在绘制。
    InFlight = 2,
    /// ### English
    /// Unit holding the most recently published frame.
    ///
    /// ### 中文
    /// unit 持有最近一次发布的帧。
    Current = 3,
}

impl SlotRole {
    #[inline]
    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Idle,
            2 => Self::InFlight,
            3 => Self::Current,
            _ => Self::Empty,
        }
    }
}

/// ### English
/// Plain-value handle the compositor uses to display the current frame.
///
/// ### 中文
/// 合成器用于显示当前帧的纯值句柄。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySurface {
    pub unit_id: UnitId,
    /// ### English
    /// GL texture name (render context namespace).
    ///
    /// ### 中文
    /// GL 纹理名（渲染上下文命名空间）。
    pub texture_id: GlName,
    pub texture_target: u32,
    /// ### English
    /// Compositor-shareable pixel buffer handle.
    ///
    /// ### 中文
    /// 可与合成器共享的像素缓冲区句柄。
    pub pixel_buffer: PixelBufferHandle,
    pub width: u32,
    pub height: u32,
    /// ### English
    /// Sequence number of the published frame (monotonic per pool, starts at 1).
    ///
    /// ### 中文
    /// 已发布帧的序号（每个 pool 单调递增，从 1 开始）。
    pub frame_seq: u64,
}

/// ### English
/// Exclusive permission to draw into one unit. Consumed by `publish` or `abandon`.
///
/// ### 中文
/// 对单个 unit 的独占绘制许可。由 `publish` 或 `abandon` 消费。
#[derive(Debug, PartialEq, Eq)]
pub struct WriteLease {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
    unit_id: UnitId,
    framebuffer: GlName,
    size: PhysicalSize<u32>,
}

impl WriteLease {
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    pub fn framebuffer(&self) -> GlName {
        self.framebuffer
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }
}

/// ### English
/// Result of a pool rebuild request.
///
/// ### 中文
/// pool 重建请求的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReinitOutcome {
    /// ### English
    /// All units were replaced with units of the new size.
    ///
    /// ### 中文
    /// 所有 unit 都已替换为新尺寸的 unit。
    Rebuilt,
    /// ### English
    /// The size had a zero dimension; the pool was left untouched.
    ///
    /// ### 中文
    /// 尺寸存在零维度；pool 保持不变。
    Rejected,
}

/// ### English
/// Snapshot of how many slots are in each role.
///
/// ### 中文
/// 各角色槽位数量的快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub empty: usize,
    pub idle: usize,
    pub in_flight: usize,
    pub current: usize,
}

impl RoleCounts {
    pub fn total(&self) -> usize {
        self.empty + self.idle + self.in_flight + self.current
    }
}
