//! ### English
//! Dedicated render thread: owns the render context, renderer session and pool units, and drives
//! draws from frame-ready signals.
//!
//! ### 中文
//! 独立渲染线程：持有渲染上下文、渲染器会话与 pool unit，并根据 frame-ready 信号驱动绘制。

use std::rc::Rc;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::engine::bridge::{CompositorHooks, RenderBridge};
use crate::engine::config::BridgeConfig;
use crate::engine::device::GpuDevice;
use crate::engine::error::BridgeResult;
use crate::engine::pool::SharedPoolState;
use crate::engine::renderer::VideoRenderer;

use super::command::Command;

/// ### English
/// Render thread entry function.
/// Returns after `Shutdown`, after every handle is dropped, or on initialization failure.
///
/// #### Parameters
/// - `factory`: Creates the render context and renderer on this thread.
/// - `hooks`: Compositor notifications.
/// - `config`: Bridge configuration.
/// - `commands`: Command receiver.
/// - `init`: Reports initialization success (with the shared pool state) or failure.
///
/// ### 中文
/// 渲染线程入口函数。
/// 收到 `Shutdown`、所有句柄被 drop 或初始化失败时返回。
///
/// #### 参数
/// - `factory`：在本线程上创建渲染上下文与渲染器。
/// - `hooks`：合成器通知回调。
/// - `config`：桥接配置。
/// - `commands`：命令接收端。
/// - `init`：回报初始化成功（附带共享 pool 状态）或失败。
pub(super) fn run_render_thread<D, R, F>(
    factory: F,
    hooks: CompositorHooks,
    config: BridgeConfig,
    commands: Receiver<Command>,
    init: Sender<BridgeResult<Arc<SharedPoolState>>>,
) where
    D: GpuDevice,
    R: VideoRenderer,
    F: FnOnce() -> BridgeResult<(Rc<D>, R)>,
{
    let bridge = factory()
        .and_then(|(context, renderer)| RenderBridge::initialize(context, renderer, hooks, &config));
    let mut bridge = match bridge {
        Ok(bridge) => bridge,
        Err(err) => {
            tracing::error!(%err, "render thread failed to initialize");
            let _ = init.send(Err(err));
            return;
        }
    };

    if init.send(Ok(bridge.shared_state())).is_err() {
        tracing::warn!("runtime gave up waiting for initialization");
        bridge.teardown();
        return;
    }
    drop(init);

    let frame_ready = bridge.frame_ready_receiver();
    loop {
        crossbeam_channel::select! {
            recv(commands) -> command => match command {
                Ok(Command::Resize { size, reply }) => {
                    let result = bridge.resize(size);
                    if let Err(err) = &result {
                        tracing::error!(%err, width = size.width, height = size.height, "resize failed");
                    }
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                Ok(Command::RequestRedraw) => bridge.request_redraw(),
                Ok(Command::Shutdown) | Err(_) => break,
            },
            recv(frame_ready) -> _ => match bridge.surface_size() {
                Some(size) => {
                    bridge.draw_frame(size);
                }
                None => tracing::trace!("frame ready without a surface pool"),
            },
        }
    }

    bridge.teardown();
}
