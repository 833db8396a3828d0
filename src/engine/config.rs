//! ### English
//! Bridge configuration (built from Rust callers or from C ABI parameters).
//!
//! ### 中文
//! 桥接层配置（由 Rust 调用方或 C ABI 参数构建）。

use dpi::PhysicalSize;

use crate::engine::flags;

/// ### English
/// Default interval (in drawn frames) between detailed frame log lines.
///
/// ### 中文
/// 详细帧日志的默认间隔（按已绘制帧数计）。
pub const DEFAULT_LOG_INTERVAL_FRAMES: u32 = 20;

/// ### English
/// Size used when the embedder passes a degenerate initial size.
///
/// ### 中文
/// 宿主传入退化初始尺寸时使用的兜底尺寸。
pub const FALLBACK_INITIAL_SIZE: PhysicalSize<u32> = PhysicalSize::new(1, 1);

/// ### English
/// Configuration for one bridge instance.
///
/// ### 中文
/// 单个桥接实例的配置。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// ### English
    /// Size of the first pool built during initialization.
    ///
    /// ### 中文
    /// 初始化时构建的第一个 pool 的尺寸。
    pub initial_size: PhysicalSize<u32>,
    /// ### English
    /// Detailed frame logs are emitted once every this many frames (0 disables them).
    ///
    /// ### 中文
    /// 每隔多少帧输出一次详细帧日志（0 表示关闭）。
    pub log_interval_frames: u32,
    /// ### English
    /// Retry a failing unit once before failing a pool rebuild.
    ///
    /// ### 中文
    /// pool 重建时对失败的 unit 重试一次。
    pub retry_unit_creation: bool,
    /// ### English
    /// Request a redraw after each successful resize.
    ///
    /// ### 中文
    /// 每次 resize 成功后请求重绘。
    pub redraw_after_resize: bool,
    /// ### English
    /// Name of the dedicated render thread.
    ///
    /// ### 中文
    /// 独立渲染线程的名称。
    pub thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            initial_size: FALLBACK_INITIAL_SIZE,
            log_interval_frames: DEFAULT_LOG_INTERVAL_FRAMES,
            retry_unit_creation: false,
            redraw_after_resize: true,
            thread_name: "VideoTextureRender".to_string(),
        }
    }
}

impl BridgeConfig {
    /// ### English
    /// Builds a config from C ABI parameters.
    ///
    /// #### Parameters
    /// - `initial_size`: Requested first pool size (degenerate sizes fall back to 1x1).
    /// - `flags`: `VIDEO_TEXTURE_FLAG_*` bitmask.
    /// - `log_interval_frames`: Detailed log interval (`0` means the default interval).
    ///
    /// ### 中文
    /// 由 C ABI 参数构建配置。
    ///
    /// #### 参数
    /// - `initial_size`：首个 pool 的尺寸（退化尺寸回退为 1x1）。
    /// - `flags`：`VIDEO_TEXTURE_FLAG_*` 位掩码。
    /// - `log_interval_frames`：详细日志间隔（`0` 表示使用默认间隔）。
    pub fn from_flags(initial_size: PhysicalSize<u32>, flags: u32, log_interval_frames: u32) -> Self {
        let initial_size = if initial_size.width == 0 || initial_size.height == 0 {
            FALLBACK_INITIAL_SIZE
        } else {
            initial_size
        };
        let log_interval_frames = if log_interval_frames == 0 {
            DEFAULT_LOG_INTERVAL_FRAMES
        } else {
            log_interval_frames
        };

        Self {
            initial_size,
            log_interval_frames,
            retry_unit_creation: (flags & flags::VIDEO_TEXTURE_FLAG_RETRY_UNIT_CREATION) != 0,
            redraw_after_resize: (flags & flags::VIDEO_TEXTURE_FLAG_NO_REDRAW_AFTER_RESIZE) == 0,
            ..Self::default()
        }
    }
}
