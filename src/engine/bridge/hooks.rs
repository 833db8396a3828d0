use dpi::PhysicalSize;

use crate::engine::pool::DisplaySurface;

type FramePublishedHook = Box<dyn Fn(&DisplaySurface) + Send>;
type ResizedHook = Box<dyn Fn(PhysicalSize<u32>) + Send>;

/// ### English
/// Compositor notifications, invoked on the render thread.
///
/// The embedder is expected to redispatch to its UI thread.
///
/// ### 中文
/// 合成器通知回调，在渲染线程上调用。
///
/// 宿主应自行转发到其 UI 线程。
#[derive(Default)]
pub struct CompositorHooks {
    frame_published: Option<FramePublishedHook>,
    resized: Option<ResizedHook>,
}

impl CompositorHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// ### English
    /// Called after each published frame ("frame available").
    ///
    /// ### 中文
    /// 每发布一帧后调用（“frame available”）。
    pub fn on_frame_published(mut self, hook: impl Fn(&DisplaySurface) + Send + 'static) -> Self {
        self.frame_published = Some(Box::new(hook));
        self
    }

    /// ### English
    /// Called after the pool was rebuilt at a new size.
    ///
    /// ### 中文
    /// pool 按新尺寸重建完成后调用。
    pub fn on_resized(mut self, hook: impl Fn(PhysicalSize<u32>) + Send + 'static) -> Self {
        self.resized = Some(Box::new(hook));
        self
    }

    pub(crate) fn frame_published(&self, surface: &DisplaySurface) {
        if let Some(hook) = &self.frame_published {
            hook(surface);
        }
    }

    pub(crate) fn resized(&self, size: PhysicalSize<u32>) {
        if let Some(hook) = &self.resized {
            hook(size);
        }
    }
}
