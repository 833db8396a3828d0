//! ### English
//! Graphics device abstraction used by surface units, the rotation pool and the render bridge.
//!
//! The production implementation is [`RenderContext`] (surfman device/context + gleam GL table).
//!
//! ### 中文
//! surface unit、轮转池与渲染桥共用的图形设备抽象。
//!
//! 生产实现为 [`RenderContext`]（surfman device/context + gleam GL 函数表）。
use std::ffi::c_void;

use dpi::PhysicalSize;

use crate::engine::error::{BridgeResult, RenderError};

mod render_context;
#[cfg(test)]
pub(crate) mod software;

pub use render_context::RenderContext;

/// ### English
/// GL object name (`GLuint`).
///
/// ### 中文
/// GL 对象名（`GLuint`）。
pub type GlName = u32;

/// ### English
/// `GL_FRAMEBUFFER_COMPLETE`.
///
/// ### 中文
/// `GL_FRAMEBUFFER_COMPLETE`。
pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;

/// ### English
/// Platform handle of a compositor-shareable pixel buffer (IOSurface id on macOS).
///
/// ### 中文
/// 可与合成器共享的像素缓冲区的平台句柄（macOS 上为 IOSurface id）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelBufferHandle(pub u64);

/// ### English
/// Plain-value description of a shared image (copied into the pool for the consumer).
///
/// ### 中文
/// 共享图像的纯值描述（复制进 pool 供消费者读取）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageInfo {
    /// ### English
    /// GL texture name sampling the pixel buffer.
    ///
    /// ### 中文
    /// 采样该像素缓冲区的 GL 纹理名。
    pub texture: GlName,
    /// ### English
    /// GL texture target (`TEXTURE_2D` or `TEXTURE_RECTANGLE`).
    ///
    /// ### 中文
    /// GL 纹理目标（`TEXTURE_2D` 或 `TEXTURE_RECTANGLE`）。
    pub target: u32,
    /// ### English
    /// Platform pixel buffer aliasing the texture storage.
    ///
    /// ### 中文
    /// 与纹理存储共享内存的平台像素缓冲区。
    pub pixel_buffer: PixelBufferHandle,
}

/// ### English
/// Proc-address loader handed to the external renderer.
///
/// ### 中文
/// 交给外部渲染器的函数地址加载器。
pub type ProcLoader = std::rc::Rc<dyn Fn(&str) -> *const c_void>;

/// ### English
/// Graphics device/context seam.
///
/// All methods must be called on the thread that owns the device (the render thread). Methods that
/// issue GL commands expect the context to be current (`make_current`).
///
/// ### 中文
/// 图形设备/上下文抽象层。
///
/// 所有方法都必须在持有设备的线程（渲染线程）调用；发出 GL 命令的方法要求上下文已 current
/// （`make_current`）。
pub trait GpuDevice: 'static {
    /// ### English
    /// Owned pixel buffer + texture pair; released by `destroy_shared_image`.
    ///
    /// ### 中文
    /// 持有的像素缓冲区 + 纹理组合；由 `destroy_shared_image` 释放。
    type SharedImage;

    fn make_current(&self) -> Result<(), RenderError>;

    fn release_current(&self);

    /// ### English
    /// Resolves a GL entry point for the external renderer (NULL if unknown).
    ///
    /// ### 中文
    /// 为外部渲染器解析 GL 入口地址（未知则返回 NULL）。
    fn proc_address(&self, name: &str) -> *const c_void;

    /// ### English
    /// Allocates a compositor-shareable pixel buffer and wraps it as a sampleable texture.
    ///
    /// ### 中文
    /// 分配可与合成器共享的像素缓冲区，并将其包装为可采样纹理。
    fn create_shared_image(&self, size: PhysicalSize<u32>) -> BridgeResult<Self::SharedImage>;

    fn image_info(&self, image: &Self::SharedImage) -> ImageInfo;

    /// ### English
    /// Releases the texture first, then the pixel buffer.
    ///
    /// ### 中文
    /// 先释放纹理，再释放像素缓冲区。
    fn destroy_shared_image(&self, image: Self::SharedImage);

    fn create_depth_stencil(&self, size: PhysicalSize<u32>) -> BridgeResult<GlName>;

    fn delete_depth_stencil(&self, renderbuffer: GlName);

    /// ### English
    /// Creates a framebuffer with `image` as color attachment and `depth_stencil` as depth/stencil.
    /// Completeness is checked separately via `framebuffer_status`.
    ///
    /// ### 中文
    /// 创建 framebuffer：`image` 作为颜色附件，`depth_stencil` 作为深度/模板附件。
    /// 完整性通过 `framebuffer_status` 单独检查。
    fn create_framebuffer(&self, image: &ImageInfo, depth_stencil: GlName) -> BridgeResult<GlName>;

    fn framebuffer_status(&self, framebuffer: GlName) -> u32;

    fn delete_framebuffer(&self, framebuffer: GlName);

    /// ### English
    /// Binds `framebuffer`, sets the viewport to `size` and enables source-alpha blending.
    ///
    /// ### 中文
    /// 绑定 `framebuffer`，将视口设为 `size`，并启用 source-alpha 混合。
    fn begin_draw(&self, framebuffer: GlName, size: PhysicalSize<u32>);

    /// ### English
    /// Flushes the pipeline and unbinds the draw framebuffer.
    ///
    /// ### 中文
    /// flush 管线并解绑绘制 framebuffer。
    fn end_draw(&self);

    /// ### English
    /// Returns and clears the pending graphics error, if any.
    ///
    /// ### 中文
    /// 返回并清除待处理的图形错误（若有）。
    fn take_error(&self) -> Option<u32>;

    /// ### English
    /// Reads back the color attachment as tightly packed RGBA8 rows (bottom row first).
    ///
    /// ### 中文
    /// 以紧密排列的 RGBA8 行读回颜色附件（最底行在前）。
    fn read_pixels(&self, framebuffer: GlName, size: PhysicalSize<u32>) -> Vec<u8>;
}

/// ### English
/// Drains the device error state and logs it with `label`.
///
/// Returns the first error code observed, as a transient `RenderError`.
///
/// ### 中文
/// 读取并清空设备错误状态，并带上 `label` 记录日志。
///
/// 返回观察到的第一个错误码（作为瞬时 `RenderError`）。
pub fn check_error<D: GpuDevice + ?Sized>(
    device: &D,
    label: &'static str,
) -> Result<(), RenderError> {
    let Some(code) = device.take_error() else {
        return Ok(());
    };
    tracing::warn!(label, code = format_args!("0x{code:04x}"), "graphics error");

    /*
    ### English
    GL may queue several error flags; drain them so the next check starts clean.

    ### 中文
    GL 可能累积多个错误标记；全部取出，确保下一次检查从干净状态开始。
    */
    while let Some(extra) = device.take_error() {
        tracing::warn!(label, code = format_args!("0x{extra:04x}"), "graphics error");
    }

    Err(RenderError::Graphics { label, code })
}
