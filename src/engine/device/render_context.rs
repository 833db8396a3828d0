//! ### English
//! Offscreen render context backed by surfman.
//! Owns the surfman device + context the external renderer draws with, and allocates the
//! compositor-shareable surfaces that back each surface unit.
//!
//! ### 中文
//! 基于 surfman 的离屏渲染上下文。
//! 持有外部渲染器绘制所用的 surfman device + context，并分配支撑每个 surface unit 的、
//! 可与合成器共享的 surface。

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::rc::Rc;

use dpi::PhysicalSize;
use euclid::default::Size2D;
use gleam::gl::{self, Gl};
use surfman::{
    Connection, Context, ContextAttributeFlags, ContextAttributes, Device, GLApi, GLVersion,
    Surface, SurfaceAccess, SurfaceTexture, SurfaceType,
};

use super::{GlName, GpuDevice, ImageInfo, PixelBufferHandle};
use crate::engine::error::{BridgeError, BridgeResult, RenderError, ResourceError};

/// ### English
/// Requested context version (core profile on desktop GL).
///
/// ### 中文
/// 请求的上下文版本（桌面 GL 上为 core profile）。
const CONTEXT_VERSION: (u8, u8) = (3, 2);

fn to_surface_size(size: PhysicalSize<u32>) -> BridgeResult<Size2D<i32>> {
    let width = i32::try_from(size.width);
    let height = i32::try_from(size.height);
    match (width, height) {
        (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok(Size2D::new(width, height)),
        _ => Err(BridgeError::Resource(ResourceError::InvalidSize {
            width: size.width,
            height: size.height,
        })),
    }
}

/// ### English
/// A surfman surface wrapped as a GL texture, plus its copied description.
///
/// ### 中文
/// 包装为 GL 纹理的 surfman surface，以及其描述信息副本。
pub struct SurfmanImage {
    surface_texture: SurfaceTexture,
    info: ImageInfo,
}

/// ### English
/// Owns the surfman device/context and the gleam GL table used on the render thread.
///
/// ### 中文
/// 持有 surfman device/context 以及渲染线程使用的 gleam GL 函数表。
pub struct RenderContext {
    /// ### English
    /// surfman device (adapter-bound).
    ///
    /// ### 中文
    /// surfman device（绑定 adapter）。
    device: Device,
    /// ### English
    /// surfman context; `RefCell` because surfman mutates it when binding/wrapping surfaces.
    ///
    /// ### 中文
    /// surfman context；surfman 在绑定/包装 surface 时需要可变借用，因此使用 `RefCell`。
    context: RefCell<Context>,
    /// ### English
    /// gleam GL API wrapper.
    ///
    /// ### 中文
    /// gleam GL API 封装。
    gl: Rc<dyn Gl>,
    /// ### English
    /// Whether this context is known to be current on the owning thread.
    ///
    /// ### 中文
    /// 该上下文是否已知在所属线程上为 current。
    current: Cell<bool>,
}

impl RenderContext {
    /// ### English
    /// Creates connection, adapter, device and context, binds a 1x1 surface and loads GL.
    /// Must be called on the thread that will own the context (render thread).
    ///
    /// ### 中文
    /// 创建 connection、adapter、device 与 context，绑定 1x1 surface 并加载 GL。
    /// 必须在将要持有该上下文的线程（渲染线程）中调用。
    pub fn new() -> BridgeResult<Rc<Self>> {
        let connection = Connection::new()
            .map_err(|err| BridgeError::bootstrap(format!("surfman connection: {err:?}")))?;
        let adapter = connection
            .create_adapter()
            .map_err(|err| BridgeError::bootstrap(format!("surfman adapter: {err:?}")))?;
        let device = connection
            .create_device(&adapter)
            .map_err(|err| BridgeError::bootstrap(format!("surfman device: {err:?}")))?;

        let attributes = ContextAttributes {
            version: GLVersion::new(CONTEXT_VERSION.0, CONTEXT_VERSION.1),
            flags: ContextAttributeFlags::ALPHA
                | ContextAttributeFlags::DEPTH
                | ContextAttributeFlags::STENCIL,
        };
        let descriptor = device
            .create_context_descriptor(&attributes)
            .map_err(|err| BridgeError::bootstrap(format!("context descriptor: {err:?}")))?;
        let mut context = device
            .create_context(&descriptor, None)
            .map_err(|err| BridgeError::bootstrap(format!("context: {err:?}")))?;

        /*
        ### English
        Some backends refuse to make a surfaceless context current; bind a tiny generic surface.
        Draws always target unit framebuffers, never this surface.

        ### 中文
        部分后端不允许无 surface 的 context 成为 current，因此绑定一个极小的 generic surface。
        绘制始终指向 unit 的 framebuffer，而不是该 surface。
        */
        let surface = match device.create_surface(
            &context,
            SurfaceAccess::GPUOnly,
            SurfaceType::Generic {
                size: Size2D::new(1, 1),
            },
        ) {
            Ok(surface) => surface,
            Err(err) => {
                let _ = device.destroy_context(&mut context);
                return Err(BridgeError::bootstrap(format!("context surface: {err:?}")));
            }
        };
        if let Err((err, mut surface)) = device.bind_surface_to_context(&mut context, surface) {
            let _ = device.destroy_surface(&mut context, &mut surface);
            let _ = device.destroy_context(&mut context);
            return Err(BridgeError::bootstrap(format!("bind context surface: {err:?}")));
        }

        if let Err(err) = device.make_context_current(&context) {
            Self::destroy_context(&device, &mut context);
            return Err(BridgeError::bootstrap(format!("make current: {err:?}")));
        }

        let gl: Rc<dyn Gl> = unsafe {
            match device.gl_api() {
                GLApi::GLES => {
                    gl::GlesFns::load_with(|name| device.get_proc_address(&context, name))
                }
                GLApi::GL => gl::GlFns::load_with(|name| device.get_proc_address(&context, name)),
            }
        };

        tracing::info!(
            version = %gl.get_string(gl::VERSION),
            renderer = %gl.get_string(gl::RENDERER),
            "render context ready"
        );

        Ok(Rc::new(Self {
            device,
            context: RefCell::new(context),
            gl,
            current: Cell::new(true),
        }))
    }

    fn destroy_context(device: &Device, context: &mut Context) {
        match device.unbind_surface_from_context(context) {
            Ok(Some(mut surface)) => {
                if let Err(err) = device.destroy_surface(context, &mut surface) {
                    tracing::warn!(?err, "failed to destroy context surface");
                    std::mem::forget(surface);
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(?err, "failed to unbind context surface"),
        }
        if let Err(err) = device.destroy_context(context) {
            tracing::error!(?err, "failed to destroy render context");
        }
    }

    fn release_surface(&self, context: &mut Context, mut surface: Surface) {
        if let Err(err) = self.device.destroy_surface(context, &mut surface) {
            tracing::warn!(?err, "failed to destroy shared surface; leaking it");
            std::mem::forget(surface);
        }
    }
}

impl GpuDevice for RenderContext {
    type SharedImage = SurfmanImage;

    fn make_current(&self) -> Result<(), RenderError> {
        if self.current.get() {
            return Ok(());
        }
        let context = self.context.borrow();
        self.device
            .make_context_current(&context)
            .map_err(|err| RenderError::MakeCurrent(format!("{err:?}")))?;
        self.current.set(true);
        Ok(())
    }

    fn release_current(&self) {
        if !self.current.replace(false) {
            return;
        }
        if let Err(err) = self.device.make_no_context_current() {
            tracing::warn!(?err, "failed to release render context");
        }
    }

    fn proc_address(&self, name: &str) -> *const c_void {
        let context = self.context.borrow();
        self.device.get_proc_address(&context, name)
    }

    fn create_shared_image(&self, size: PhysicalSize<u32>) -> BridgeResult<SurfmanImage> {
        let surface_size = to_surface_size(size)?;
        let mut context = self.context.borrow_mut();

        let surface = self
            .device
            .create_surface(
                &context,
                SurfaceAccess::GPUOnly,
                SurfaceType::Generic { size: surface_size },
            )
            .map_err(|err| {
                BridgeError::allocation(format!(
                    "shared surface {}x{}: {err:?}",
                    size.width, size.height
                ))
            })?;
        let pixel_buffer = PixelBufferHandle(self.device.surface_info(&surface).id.0 as u64);

        let surface_texture = match self.device.create_surface_texture(&mut context, surface) {
            Ok(surface_texture) => surface_texture,
            Err((err, surface)) => {
                self.release_surface(&mut context, surface);
                return Err(BridgeError::allocation(format!(
                    "surface texture: {err:?}"
                )));
            }
        };

        let texture = self
            .device
            .surface_texture_object(&surface_texture)
            .map(|texture| texture.0.get())
            .unwrap_or(0);
        let target = self.device.surface_gl_texture_target();

        self.gl.bind_texture(target, texture);
        self.gl
            .tex_parameter_i(target, gl::TEXTURE_MIN_FILTER, gl::LINEAR as gl::GLint);
        self.gl
            .tex_parameter_i(target, gl::TEXTURE_MAG_FILTER, gl::LINEAR as gl::GLint);
        self.gl
            .tex_parameter_i(target, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as gl::GLint);
        self.gl
            .tex_parameter_i(target, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as gl::GLint);
        self.gl.bind_texture(target, 0);

        Ok(SurfmanImage {
            surface_texture,
            info: ImageInfo {
                texture,
                target,
                pixel_buffer,
            },
        })
    }

    fn image_info(&self, image: &SurfmanImage) -> ImageInfo {
        image.info
    }

    fn destroy_shared_image(&self, image: SurfmanImage) {
        let mut context = self.context.borrow_mut();
        match self
            .device
            .destroy_surface_texture(&mut context, image.surface_texture)
        {
            Ok(surface) => self.release_surface(&mut context, surface),
            Err((err, surface_texture)) => {
                tracing::warn!(?err, "failed to destroy surface texture; leaking it");
                std::mem::forget(surface_texture);
            }
        }
    }

    fn create_depth_stencil(&self, size: PhysicalSize<u32>) -> BridgeResult<GlName> {
        let Some(&renderbuffer) = self.gl.gen_renderbuffers(1).first() else {
            return Err(BridgeError::allocation("gen_renderbuffers returned nothing"));
        };
        self.gl.bind_renderbuffer(gl::RENDERBUFFER, renderbuffer);
        self.gl.renderbuffer_storage(
            gl::RENDERBUFFER,
            gl::DEPTH24_STENCIL8,
            size.width as gl::GLsizei,
            size.height as gl::GLsizei,
        );
        self.gl.bind_renderbuffer(gl::RENDERBUFFER, 0);
        Ok(renderbuffer)
    }

    fn delete_depth_stencil(&self, renderbuffer: GlName) {
        self.gl.delete_renderbuffers(&[renderbuffer]);
    }

    fn create_framebuffer(&self, image: &ImageInfo, depth_stencil: GlName) -> BridgeResult<GlName> {
        let Some(&framebuffer) = self.gl.gen_framebuffers(1).first() else {
            return Err(BridgeError::allocation("gen_framebuffers returned nothing"));
        };
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
        self.gl.framebuffer_texture_2d(
            gl::FRAMEBUFFER,
            gl::COLOR_ATTACHMENT0,
            image.target,
            image.texture,
            0,
        );
        self.gl.framebuffer_renderbuffer(
            gl::FRAMEBUFFER,
            gl::DEPTH_STENCIL_ATTACHMENT,
            gl::RENDERBUFFER,
            depth_stencil,
        );
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, 0);
        Ok(framebuffer)
    }

    fn framebuffer_status(&self, framebuffer: GlName) -> u32 {
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
        let status = self.gl.check_frame_buffer_status(gl::FRAMEBUFFER);
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, 0);
        status
    }

    fn delete_framebuffer(&self, framebuffer: GlName) {
        self.gl.delete_framebuffers(&[framebuffer]);
    }

    fn begin_draw(&self, framebuffer: GlName, size: PhysicalSize<u32>) {
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
        self.gl
            .viewport(0, 0, size.width as gl::GLsizei, size.height as gl::GLsizei);
        self.gl.enable(gl::BLEND);
        self.gl.blend_func(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
    }

    fn end_draw(&self) {
        self.gl.flush();
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, 0);
    }

    fn take_error(&self) -> Option<u32> {
        match self.gl.get_error() {
            gl::NO_ERROR => None,
            code => Some(code),
        }
    }

    fn read_pixels(&self, framebuffer: GlName, size: PhysicalSize<u32>) -> Vec<u8> {
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
        let pixels = self.gl.read_pixels(
            0,
            0,
            size.width as gl::GLsizei,
            size.height as gl::GLsizei,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
        );
        self.gl.bind_framebuffer(gl::FRAMEBUFFER, 0);
        pixels
    }
}

impl Drop for RenderContext {
    /// ### English
    /// Destroys the context surface and the context. Runs after every unit and the renderer
    /// session released their `Rc`.
    ///
    /// ### 中文
    /// 销毁上下文 surface 与上下文本身。在所有 unit 与渲染会话释放其 `Rc` 之后执行。
    fn drop(&mut self) {
        let context = self.context.get_mut();
        if let Err(err) = self.device.make_context_current(context) {
            tracing::warn!(?err, "render context could not be made current for teardown");
        }
        Self::destroy_context(&self.device, context);
        tracing::debug!("render context destroyed");
    }
}
