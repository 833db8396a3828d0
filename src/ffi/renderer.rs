//! ### English
//! Adapts the embedder's renderer function table (an mpv-style render API) to [`VideoRenderer`].
//!
//! ### 中文
//! 将宿主提供的渲染器函数表（mpv 风格渲染 API）适配为 [`VideoRenderer`]。

use std::ffi::{CStr, c_char, c_void};

use crate::engine::device::ProcLoader;
use crate::engine::error::RenderError;
use crate::engine::renderer::{RenderTarget, VideoRenderer};
use crate::engine::signal::FrameNotifier;

/// ### English
/// GL symbol resolver handed to the embedder's renderer.
///
/// ### 中文
/// 交给宿主渲染器的 GL 符号解析函数。
pub type VideoTextureGetProcAddressFn =
    unsafe extern "C" fn(ctx: *mut c_void, name: *const c_char) -> *mut c_void;

/// ### English
/// Frame-ready callback; safe to call from any thread while the session is alive.
///
/// ### 中文
/// frame-ready 回调；会话存活期间可在任意线程调用。
pub type VideoTextureFrameReadyFn = unsafe extern "C" fn(ctx: *mut c_void);

pub type VideoTextureCreateSessionFn = unsafe extern "C" fn(
    user_data: *mut c_void,
    get_proc_address: VideoTextureGetProcAddressFn,
    get_proc_address_ctx: *mut c_void,
    on_frame_ready: VideoTextureFrameReadyFn,
    on_frame_ready_ctx: *mut c_void,
) -> *mut c_void;

pub type VideoTextureRenderFn = unsafe extern "C" fn(
    user_data: *mut c_void,
    session: *mut c_void,
    fbo: u32,
    width: u32,
    height: u32,
) -> i32;

pub type VideoTextureDestroySessionFn =
    unsafe extern "C" fn(user_data: *mut c_void, session: *mut c_void);

#[repr(C)]
#[derive(Clone, Copy)]
/// ### English
/// Renderer function table supplied by the embedder.
///
/// All functions are called on the render thread. `render` returns `0` on success; any other value
/// drops the frame.
///
/// ### 中文
/// 宿主提供的渲染器函数表。
///
/// 所有函数都在渲染线程上调用。`render` 成功时返回 `0`；其他值会丢弃该帧。
pub struct VideoTextureRendererApi {
    pub user_data: *mut c_void,
    pub create_session: Option<VideoTextureCreateSessionFn>,
    pub render: Option<VideoTextureRenderFn>,
    pub destroy_session: Option<VideoTextureDestroySessionFn>,
}

/// ### English
/// Validated copy of [`VideoTextureRendererApi`] that can move to the render thread.
///
/// ### 中文
/// 经过校验、可移动到渲染线程的 [`VideoTextureRendererApi`] 副本。
#[derive(Clone, Copy)]
pub(super) struct RendererTable {
    /// ### English
    /// `user_data` stored as an integer (raw pointers are not `Send`).
    ///
    /// ### 中文
    /// 以整数形式保存的 `user_data`（裸指针不是 `Send`）。
    user_data: usize,
    create_session: VideoTextureCreateSessionFn,
    render: VideoTextureRenderFn,
    destroy_session: VideoTextureDestroySessionFn,
}

impl RendererTable {
    /// ### English
    /// Returns `None` if any function pointer is missing.
    ///
    /// ### 中文
    /// 若缺少任一函数指针则返回 `None`。
    pub(super) fn from_api(api: &VideoTextureRendererApi) -> Option<Self> {
        Some(Self {
            user_data: api.user_data as usize,
            create_session: api.create_session?,
            render: api.render?,
            destroy_session: api.destroy_session?,
        })
    }

    fn user_data(&self) -> *mut c_void {
        self.user_data as *mut c_void
    }
}

/// ### English
/// [`VideoRenderer`] backed by the embedder's function table.
///
/// ### 中文
/// 基于宿主函数表的 [`VideoRenderer`]。
pub(super) struct EmbedderRenderer {
    table: RendererTable,
}

/// ### English
/// Embedder session plus the callback contexts it was given.
/// The boxes keep the context pointers stable until the session is destroyed.
///
/// ### 中文
/// 宿主会话以及传给它的回调上下文。
/// Box 保证上下文指针在会话销毁前保持稳定。
pub(super) struct EmbedderSession {
    handle: *mut c_void,
    loader: Box<ProcLoader>,
    notifier: Box<FrameNotifier>,
}

impl EmbedderRenderer {
    pub(super) fn new(table: RendererTable) -> Self {
        Self { table }
    }
}

impl VideoRenderer for EmbedderRenderer {
    type Session = EmbedderSession;

    fn create_session(
        &mut self,
        loader: ProcLoader,
        notifier: FrameNotifier,
    ) -> Result<EmbedderSession, RenderError> {
        let loader = Box::new(loader);
        let notifier = Box::new(notifier);

        let handle = unsafe {
            (self.table.create_session)(
                self.table.user_data(),
                proc_address_trampoline,
                &*loader as *const ProcLoader as *mut c_void,
                frame_ready_trampoline,
                &*notifier as *const FrameNotifier as *mut c_void,
            )
        };
        if handle.is_null() {
            return Err(RenderError::Session(
                "embedder returned a null session".to_string(),
            ));
        }

        Ok(EmbedderSession {
            handle,
            loader,
            notifier,
        })
    }

    fn render_into(
        &mut self,
        session: &mut EmbedderSession,
        target: RenderTarget,
    ) -> Result<(), RenderError> {
        let code = unsafe {
            (self.table.render)(
                self.table.user_data(),
                session.handle,
                target.framebuffer,
                target.size.width,
                target.size.height,
            )
        };
        if code != 0 {
            return Err(RenderError::Renderer(code));
        }
        Ok(())
    }

    fn destroy_session(&mut self, session: EmbedderSession) {
        unsafe { (self.table.destroy_session)(self.table.user_data(), session.handle) };
        drop(session.notifier);
        drop(session.loader);
    }
}

/// ### English
/// Resolves a GL symbol through the bridge's render context.
///
/// # Safety
/// `ctx` must be the loader pointer passed to `create_session`; `name` must be NUL-terminated.
///
/// ### 中文
/// 通过桥接渲染上下文解析 GL 符号。
///
/// # Safety
/// `ctx` 必须是传给 `create_session` 的 loader 指针；`name` 必须以 NUL 结尾。
unsafe extern "C" fn proc_address_trampoline(ctx: *mut c_void, name: *const c_char) -> *mut c_void {
    if ctx.is_null() || name.is_null() {
        return std::ptr::null_mut();
    }

    let loader = unsafe { &*(ctx as *const ProcLoader) };
    let Ok(name) = unsafe { CStr::from_ptr(name) }.to_str() else {
        return std::ptr::null_mut();
    };

    let address = loader(name);
    if address.is_null() {
        tracing::warn!(symbol = name, "unresolved GL symbol");
    }
    address as *mut c_void
}

/// ### English
/// Forwards the embedder's frame-ready callback to the bridge's notifier.
///
/// # Safety
/// `ctx` must be the notifier pointer passed to `create_session`, and the session must be alive.
///
/// ### 中文
/// 将宿主的 frame-ready 回调转发给桥接通知器。
///
/// # Safety
/// `ctx` 必须是传给 `create_session` 的 notifier 指针，且会话仍然存活。
unsafe extern "C" fn frame_ready_trampoline(ctx: *mut c_void) {
    if ctx.is_null() {
        return;
    }

    let notifier = unsafe { &*(ctx as *const FrameNotifier) };
    notifier.notify();
}
