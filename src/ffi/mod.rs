//! ### English
//! C ABI surface for `video_texture_bridge`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Strings passed by the embedder must be NUL-terminated UTF-8 (C string).
//!
//! ### 中文
//! `video_texture_bridge` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 宿主传入的字符串必须是以 NUL 结尾的 UTF-8（C 字符串）。
mod abi;
mod bridge;
mod hooks;
mod renderer;

use std::ffi::{CStr, c_char};

use crate::engine::pool::DisplaySurface;
use crate::engine::runtime::BridgeRuntime;

#[repr(C)]
/// ### English
/// Opaque bridge handle owning the dedicated render thread.
///
/// ### 中文
/// 不透明桥接句柄，持有独立的渲染线程。
pub struct VideoTextureBridge {
    /// ### English
    /// Runtime that owns the render thread.
    ///
    /// ### 中文
    /// 持有渲染线程的运行时。
    runtime: BridgeRuntime,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// ### English
/// Latest completed frame, as handed to the compositor.
///
/// The texture name lives in the bridge's render context namespace; compositors in another
/// context or process import `pixel_buffer` instead.
///
/// ### 中文
/// 交给合成器的最近完成帧。
///
/// 纹理名属于桥接渲染上下文的命名空间；位于其他上下文或进程的合成器应改为导入 `pixel_buffer`。
pub struct VideoTextureSurface {
    /// ### English
    /// Pool-unique unit identifier.
    ///
    /// ### 中文
    /// pool 内唯一的 unit 标识。
    pub unit_id: u64,
    pub texture_id: u32,
    /// ### English
    /// GL texture target (`GL_TEXTURE_2D` or `GL_TEXTURE_RECTANGLE`).
    ///
    /// ### 中文
    /// GL 纹理目标（`GL_TEXTURE_2D` 或 `GL_TEXTURE_RECTANGLE`）。
    pub texture_target: u32,
    /// ### English
    /// Compositor-shareable pixel buffer handle (IOSurface id / dmabuf-backed surface id).
    ///
    /// ### 中文
    /// 可与合成器共享的像素缓冲句柄（IOSurface id / dmabuf surface id）。
    pub pixel_buffer: u64,
    pub width: u32,
    pub height: u32,
    /// ### English
    /// Monotonic frame sequence number (newer frames have larger values).
    ///
    /// ### 中文
    /// 单调递增的帧序号（越新的帧值越大）。
    pub frame_seq: u64,
}

/// ### English
/// C ABI version for `video_texture_bridge`.
///
/// ### 中文
/// `video_texture_bridge` 的 C ABI 版本号。
const VIDEO_TEXTURE_ABI_VERSION: u32 = 1;

impl From<DisplaySurface> for VideoTextureSurface {
    fn from(value: DisplaySurface) -> Self {
        Self {
            unit_id: value.unit_id.0,
            texture_id: value.texture_id,
            texture_target: value.texture_target,
            pixel_buffer: value.pixel_buffer.0,
            width: value.width,
            height: value.height,
            frame_seq: value.frame_seq,
        }
    }
}

/// ### English
/// Converts an optional NUL-terminated UTF-8 C string into `&str`.
///
/// Returns `None` for NULL pointers, invalid UTF-8, or empty strings.
///
/// # Safety
/// `ptr` must be valid and point to a NUL-terminated string for the duration of `'a`.
///
/// ### 中文
/// 将可选的 NUL 结尾 UTF-8 C 字符串转换为 `&str`。
///
/// 对 NULL 指针、UTF-8 非法或空字符串返回 `None`。
///
/// # Safety
/// `ptr` 在 `'a` 期间必须有效，并指向以 NUL 结尾的字符串。
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }

    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if value.is_empty() {
        return None;
    }

    Some(value)
}
