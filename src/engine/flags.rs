//! ### English
//! Bitflags controlling optional bridge behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制桥接层可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Retry a failing surface unit once before failing the whole pool rebuild.
///
/// Without this flag a single incomplete framebuffer fails the rebuild and leaves the pool empty
/// until the next resize.
///
/// ### 中文
/// 重建 pool 时，某个 surface unit 创建失败会先重试一次，再判定整次重建失败。
///
/// 未设置该标志时，只要有一个 framebuffer 不完整，整次重建即失败，pool 保持为空直到下一次 resize。
pub const VIDEO_TEXTURE_FLAG_RETRY_UNIT_CREATION: u32 = 1 << 0;

/// ### English
/// Do not request a redraw after a successful resize (wait for the renderer's next notification).
///
/// ### 中文
/// resize 成功后不主动请求重绘（等待渲染器的下一次通知）。
pub const VIDEO_TEXTURE_FLAG_NO_REDRAW_AFTER_RESIZE: u32 = 1 << 1;

/// ### English
/// Mask of all known flags; unknown bits are ignored.
///
/// ### 中文
/// 所有已知标志的掩码；未知位会被忽略。
pub const VIDEO_TEXTURE_FLAG_ALL: u32 =
    VIDEO_TEXTURE_FLAG_RETRY_UNIT_CREATION | VIDEO_TEXTURE_FLAG_NO_REDRAW_AFTER_RESIZE;
