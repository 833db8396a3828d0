//! ### English
//! Seam to the external video renderer (an mpv-style render API).
//!
//! ### 中文
//! 与外部视频渲染器（mpv 风格渲染 API）之间的抽象层。

use dpi::PhysicalSize;

use crate::engine::device::{GlName, ProcLoader};
use crate::engine::error::RenderError;
use crate::engine::signal::FrameNotifier;

/// ### English
/// Where the renderer must draw one frame.
///
/// ### 中文
/// 渲染器绘制单帧的目标。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub framebuffer: GlName,
    pub size: PhysicalSize<u32>,
}

/// ### English
/// External renderer driven by the render bridge. All methods run on the render thread with the
/// render context current.
///
/// ### 中文
/// 由渲染桥驱动的外部渲染器。所有方法都在渲染线程上、渲染上下文 current 的情况下调用。
pub trait VideoRenderer {
    /// ### English
    /// Renderer-side state bound to the render context.
    ///
    /// ### 中文
    /// 绑定到渲染上下文的渲染器侧状态。
    type Session;

    /// ### English
    /// Creates the render session.
    ///
    /// #### Parameters
    /// - `loader`: Resolves GL entry points of the render context.
    /// - `notifier`: Call whenever a new frame is ready (any thread).
    ///
    /// ### 中文
    /// 创建渲染会话。
    ///
    /// #### 参数
    /// - `loader`：解析渲染上下文的 GL 入口地址。
    /// - `notifier`：每当有新帧就绪时调用（任意线程）。
    fn create_session(
        &mut self,
        loader: ProcLoader,
        notifier: FrameNotifier,
    ) -> Result<Self::Session, RenderError>;

    /// ### English
    /// Draws the next frame into `target` (framebuffer already bound, viewport set).
    ///
    /// ### 中文
    /// 将下一帧绘制到 `target`（framebuffer 已绑定，视口已设置）。
    fn render_into(
        &mut self,
        session: &mut Self::Session,
        target: RenderTarget,
    ) -> Result<(), RenderError>;

    /// ### English
    /// Unregisters the frame-ready callback and releases the session.
    ///
    /// ### 中文
    /// 注销 frame-ready 回调并释放会话。
    fn destroy_session(&mut self, session: Self::Session);
}
