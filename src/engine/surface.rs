//! ### English
//! GPU surface unit: a compositor-shareable pixel buffer, the texture aliasing it, a
//! depth-stencil renderbuffer and the framebuffer tying them together.
//!
//! ### 中文
//! GPU surface unit：可与合成器共享的像素缓冲区、与之共享存储的纹理、深度/模板 renderbuffer，
//! 以及将它们组合在一起的 framebuffer。

use std::fmt;
use std::rc::Rc;

use dpi::PhysicalSize;

use crate::engine::device::{self, FRAMEBUFFER_COMPLETE, GlName, GpuDevice, ImageInfo};
use crate::engine::error::{BridgeError, BridgeResult, ResourceError};

/// ### English
/// Identity of one surface unit. Never reused within a pool.
///
/// ### 中文
/// 单个 surface unit 的标识。在同一个 pool 内不会复用。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// ### English
/// One renderable + displayable GPU surface.
///
/// Resources are created in order pixel buffer/texture, depth-stencil, framebuffer, and
/// released in reverse order on drop (with the owning context made current first).
///
/// ### 中文
/// 一个既可渲染又可显示的 GPU surface。
///
/// 资源按 像素缓冲区/纹理 → 深度模板 → framebuffer 的顺序创建，Drop 时先使所属上下文 current，
/// 再按相反顺序释放。
pub struct SurfaceUnit<D: GpuDevice> {
    /// ### English
    /// Owning context; keeps it alive until every unit is gone.
    ///
    /// ### 中文
    /// 所属上下文；保证其存活到所有 unit 销毁之后。
    context: Rc<D>,
    id: UnitId,
    size: PhysicalSize<u32>,
    image: Option<D::SharedImage>,
    image_info: ImageInfo,
    depth_stencil: Option<GlName>,
    framebuffer: Option<GlName>,
}

impl<D: GpuDevice> SurfaceUnit<D> {
    /// ### English
    /// Creates a complete unit of `size`.
    ///
    /// Partial resources are released on any failure (the half-built unit is dropped).
    ///
    /// #### Parameters
    /// - `context`: Render context that owns the GL objects.
    /// - `id`: Identity assigned by the pool.
    /// - `size`: Pixel size; both dimensions must be non-zero.
    ///
    /// ### 中文
    /// 创建一个尺寸为 `size` 的完整 unit。
    ///
    /// 任一步失败时都会释放已创建的部分资源（半成品 unit 被 drop）。
    ///
    /// #### 参数
    /// - `context`：持有 GL 对象的渲染上下文。
    /// - `id`：pool 分配的标识。
    /// - `size`：像素尺寸；宽高都必须非零。
    pub fn create(context: &Rc<D>, id: UnitId, size: PhysicalSize<u32>) -> BridgeResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(ResourceError::InvalidSize {
                width: size.width,
                height: size.height,
            }
            .into());
        }

        context.make_current()?;

        let mut unit = Self {
            context: context.clone(),
            id,
            size,
            image: None,
            image_info: ImageInfo::default(),
            depth_stencil: None,
            framebuffer: None,
        };

        let image = context.create_shared_image(size)?;
        unit.image_info = context.image_info(&image);
        unit.image = Some(image);

        let depth_stencil = context.create_depth_stencil(size)?;
        unit.depth_stencil = Some(depth_stencil);

        let framebuffer = context.create_framebuffer(&unit.image_info, depth_stencil)?;
        unit.framebuffer = Some(framebuffer);

        let status = context.framebuffer_status(framebuffer);
        if status != FRAMEBUFFER_COMPLETE {
            tracing::error!(
                unit = %id,
                status = format_args!("0x{status:04x}"),
                width = size.width,
                height = size.height,
                "framebuffer incomplete"
            );
            return Err(ResourceError::FramebufferIncomplete { status }.into());
        }

        if let Err(err) = device::check_error(context.as_ref(), "SurfaceUnit::create") {
            return Err(BridgeError::allocation(format!("{id}: {err}")));
        }

        tracing::debug!(
            unit = %id,
            framebuffer,
            texture = unit.image_info.texture,
            pixel_buffer = unit.image_info.pixel_buffer.0,
            "surface unit created"
        );
        Ok(unit)
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// ### English
    /// Framebuffer to draw into. Always present on a unit returned by `create`.
    ///
    /// ### 中文
    /// 用于绘制的 framebuffer。`create` 返回的 unit 上始终存在。
    pub fn framebuffer(&self) -> GlName {
        self.framebuffer.unwrap_or(0)
    }

    pub fn image_info(&self) -> ImageInfo {
        self.image_info
    }

    /// ### English
    /// Reads the unit's pixels back (RGBA8, bottom row first). Diagnostic use.
    ///
    /// ### 中文
    /// 读回该 unit 的像素（RGBA8，最底行在前）。用于诊断。
    pub fn read_pixels(&self) -> Vec<u8> {
        if self.context.make_current().is_err() {
            return Vec::new();
        }
        self.context.read_pixels(self.framebuffer(), self.size)
    }
}

impl<D: GpuDevice> Drop for SurfaceUnit<D> {
    fn drop(&mut self) {
        if let Err(err) = self.context.make_current() {
            tracing::warn!(unit = %self.id, %err, "releasing surface unit without a current context");
        }

        if let Some(framebuffer) = self.framebuffer.take() {
            self.context.delete_framebuffer(framebuffer);
        }
        if let Some(renderbuffer) = self.depth_stencil.take() {
            self.context.delete_depth_stencil(renderbuffer);
        }
        if let Some(image) = self.image.take() {
            self.context.destroy_shared_image(image);
        }

        let _ = device::check_error(self.context.as_ref(), "SurfaceUnit::drop");
        tracing::trace!(unit = %self.id, "surface unit released");
    }
}
