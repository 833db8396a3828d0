use std::ffi::c_void;

use crate::engine::bridge::CompositorHooks;

use super::VideoTextureSurface;

#[repr(C)]
#[derive(Clone, Copy)]
/// ### English
/// Compositor notifications. Both callbacks run on the render thread; the embedder is expected to
/// redispatch to its UI thread. Either may be NULL.
///
/// ### 中文
/// 合成器通知。两个回调都在渲染线程上执行，宿主应自行转发到 UI 线程。均可为 NULL。
pub struct VideoTextureCompositorHooks {
    pub user_data: *mut c_void,
    /// ### English
    /// A new frame became current. `surface` is only valid during the call.
    ///
    /// ### 中文
    /// 新帧成为 current。`surface` 仅在回调期间有效。
    pub on_frame_available:
        Option<unsafe extern "C" fn(user_data: *mut c_void, surface: *const VideoTextureSurface)>,
    pub on_resized: Option<unsafe extern "C" fn(user_data: *mut c_void, width: u32, height: u32)>,
}

impl VideoTextureCompositorHooks {
    pub(super) fn into_hooks(self) -> CompositorHooks {
        let user_data = self.user_data as usize;
        let mut hooks = CompositorHooks::new();

        if let Some(on_frame_available) = self.on_frame_available {
            hooks = hooks.on_frame_published(move |surface| {
                let surface = VideoTextureSurface::from(*surface);
                unsafe { on_frame_available(user_data as *mut c_void, &surface) };
            });
        }
        if let Some(on_resized) = self.on_resized {
            hooks = hooks.on_resized(move |size| {
                unsafe { on_resized(user_data as *mut c_void, size.width, size.height) };
            });
        }

        hooks
    }
}
