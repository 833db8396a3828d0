//! ### English
//! C ABI bindings for the bridge lifecycle and compositor reads.
//!
//! ### 中文
//! 桥接生命周期与合成器读取相关的 C ABI 绑定。

use dpi::PhysicalSize;

use super::hooks::VideoTextureCompositorHooks;
use super::renderer::{EmbedderRenderer, RendererTable, VideoTextureRendererApi};
use super::{VideoTextureBridge, VideoTextureSurface};
use crate::engine::bridge::CompositorHooks;
use crate::engine::config::BridgeConfig;
use crate::engine::device::RenderContext;
use crate::engine::resize;
use crate::engine::runtime::BridgeRuntime;

#[unsafe(no_mangle)]
/// ### English
/// Creates a bridge: spawns the render thread, creates the render context and renderer session,
/// and builds the initial surface pool.
///
/// Returns NULL if `renderer` is NULL or incomplete, or if bootstrap fails. `hooks` may be NULL.
/// A `width`/`height` of 0 falls back to 1x1. `flags` is a `VIDEO_TEXTURE_FLAG_*` bitmask;
/// `log_interval_frames` of 0 selects the default detailed-log interval.
///
/// ### 中文
/// 创建桥接：启动渲染线程，创建渲染上下文与渲染器会话，并构建初始 surface pool。
///
/// `renderer` 为 NULL 或不完整、或启动失败时返回 NULL。`hooks` 可为 NULL。
/// `width`/`height` 为 0 时回退为 1x1。`flags` 为 `VIDEO_TEXTURE_FLAG_*` 位掩码；
/// `log_interval_frames` 为 0 时使用默认的详细日志间隔。
pub unsafe extern "C" fn video_texture_bridge_create(
    renderer: *const VideoTextureRendererApi,
    hooks: *const VideoTextureCompositorHooks,
    width: u32,
    height: u32,
    flags: u32,
    log_interval_frames: u32,
) -> *mut VideoTextureBridge {
    if renderer.is_null() {
        return std::ptr::null_mut();
    }

    let Some(table) = RendererTable::from_api(unsafe { &*renderer }) else {
        tracing::error!("renderer function table is incomplete");
        return std::ptr::null_mut();
    };
    let hooks = if hooks.is_null() {
        CompositorHooks::new()
    } else {
        unsafe { *hooks }.into_hooks()
    };
    let config =
        BridgeConfig::from_flags(PhysicalSize::new(width, height), flags, log_interval_frames);

    let runtime = BridgeRuntime::spawn(
        move || Ok((RenderContext::new()?, EmbedderRenderer::new(table))),
        hooks,
        config,
    );
    match runtime {
        Ok(runtime) => Box::into_raw(Box::new(VideoTextureBridge { runtime })),
        Err(err) => {
            tracing::error!(%err, "video texture bridge bootstrap failed");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a bridge created by `video_texture_bridge_create`.
///
/// Blocks until the render thread has released every unit, destroyed the renderer session and
/// dropped the render context. Surfaces previously returned must not be used afterwards.
///
/// ### 中文
/// 销毁由 `video_texture_bridge_create` 创建的桥接。
///
/// 阻塞直到渲染线程释放全部 unit、销毁渲染器会话并释放渲染上下文。之前返回的 surface 之后不可再使用。
pub unsafe extern "C" fn video_texture_bridge_destroy(bridge: *mut VideoTextureBridge) {
    if bridge.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(bridge));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Queues a pool rebuild at `width`x`height`.
///
/// Returns `false` for negative dimensions or a shut-down bridge. A zero dimension is accepted and
/// ignored by the render thread (the previous pool stays).
///
/// ### 中文
/// 排队一次 `width`x`height` 的 pool 重建。
///
/// 尺寸为负或桥接已关闭时返回 `false`。尺寸为 0 会被接受，但渲染线程会忽略它（保留原 pool）。
pub unsafe extern "C" fn video_texture_bridge_resize(
    bridge: *mut VideoTextureBridge,
    width: i32,
    height: i32,
) -> bool {
    if bridge.is_null() {
        return false;
    }

    let Some(size) = resize::size_from_signed(width, height) else {
        tracing::warn!(width, height, "rejecting resize with negative dimension");
        return false;
    };
    unsafe { (*bridge).runtime.handle() }
        .request_resize(size)
        .is_ok()
}

#[unsafe(no_mangle)]
/// ### English
/// Writes the latest completed frame into `out`. Never blocks.
///
/// Returns `false` (leaving `out` untouched) when nothing is displayable.
///
/// ### 中文
/// 将最近完成的帧写入 `out`。从不阻塞。
///
/// 没有可显示内容时返回 `false`（不修改 `out`）。
pub unsafe extern "C" fn video_texture_bridge_current_surface(
    bridge: *mut VideoTextureBridge,
    out: *mut VideoTextureSurface,
) -> bool {
    if bridge.is_null() || out.is_null() {
        return false;
    }

    let Some(surface) = unsafe { (*bridge).runtime.handle() }.current_surface() else {
        return false;
    };
    unsafe { *out = surface.into() };
    true
}

#[unsafe(no_mangle)]
/// ### English
/// Requests a redraw, coalesced with pending renderer notifications.
///
/// ### 中文
/// 请求一次重绘，与待处理的渲染器通知合并。
pub unsafe extern "C" fn video_texture_bridge_request_redraw(bridge: *mut VideoTextureBridge) {
    if bridge.is_null() {
        return;
    }

    if unsafe { (*bridge).runtime.handle() }.request_redraw().is_err() {
        tracing::debug!("redraw requested on a shut-down bridge");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_arguments_are_rejected() {
        unsafe {
            assert!(
                video_texture_bridge_create(std::ptr::null(), std::ptr::null(), 4, 4, 0, 0)
                    .is_null()
            );
            assert!(!video_texture_bridge_resize(std::ptr::null_mut(), 4, 4));
            let mut out = VideoTextureSurface::default();
            assert!(!video_texture_bridge_current_surface(
                std::ptr::null_mut(),
                &mut out
            ));
            assert_eq!(out, VideoTextureSurface::default());
            video_texture_bridge_request_redraw(std::ptr::null_mut());
            video_texture_bridge_destroy(std::ptr::null_mut());
        }
    }

    #[test]
    fn incomplete_renderer_table_is_rejected() {
        let api = VideoTextureRendererApi {
            user_data: std::ptr::null_mut(),
            create_session: None,
            render: None,
            destroy_session: None,
        };
        let bridge =
            unsafe { video_texture_bridge_create(&api, std::ptr::null(), 4, 4, 0, 0) };
        assert!(bridge.is_null());
    }
}
