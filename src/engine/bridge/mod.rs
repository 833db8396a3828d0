//! ### English
//! Render bridge: owns the render context, the renderer session and the rotation pool on the render
//! thread, and turns frame-ready notifications into published frames.
//!
//! ### 中文
//! 渲染桥：在渲染线程上持有渲染上下文、渲染器会话与轮转池，并将 frame-ready 通知转换为已发布的帧。

mod counter;
mod draw;
mod hooks;

pub use counter::{FrameCounter, FrameStats};
pub use draw::DrawOutcome;
pub use hooks::CompositorHooks;

use std::rc::Rc;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use dpi::PhysicalSize;

use crate::engine::config::BridgeConfig;
use crate::engine::device::{GpuDevice, ProcLoader};
use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::pool::{RotationPool, SharedPoolState};
use crate::engine::renderer::VideoRenderer;
use crate::engine::resize::{ResizeController, ResizeOutcome};
use crate::engine::signal::FrameReadySignal;

/// ### English
/// Render-thread state of one bridge instance.
///
/// ### 中文
/// 单个桥接实例在渲染线程上的状态。
pub struct RenderBridge<D: GpuDevice, R: VideoRenderer> {
    /// ### English
    /// Render context; `None` after teardown.
    ///
    /// ### 中文
    /// 渲染上下文；teardown 之后为 `None`。
    context: Option<Rc<D>>,
    renderer: R,
    session: Option<R::Session>,
    /// ### English
    /// Units are owned here; `None` after teardown.
    ///
    /// ### 中文
    /// unit 归这里所有；teardown 之后为 `None`。
    pool: Option<RotationPool<D>>,
    shared: Arc<SharedPoolState>,
    signal: FrameReadySignal,
    resize: ResizeController,
    hooks: CompositorHooks,
    counter: FrameCounter,
}

impl<D: GpuDevice, R: VideoRenderer> RenderBridge<D, R> {
    /// ### English
    /// Creates the renderer session and builds the initial pool.
    ///
    /// Session creation failure is a bootstrap error. A failing initial pool build is logged and
    /// leaves the pool empty until the next resize.
    ///
    /// #### Parameters
    /// - `context`: Render context created on the calling (render) thread.
    /// - `renderer`: External renderer.
    /// - `hooks`: Compositor notifications.
    /// - `config`: Bridge configuration.
    ///
    /// ### 中文
    /// 创建渲染器会话并构建初始 pool。
    ///
    /// 会话创建失败属于启动错误。初始 pool 构建失败只记录日志，pool 保持为空直到下一次 resize。
    ///
    /// #### 参数
    /// - `context`：在调用线程（渲染线程）上创建的渲染上下文。
    /// - `renderer`：外部渲染器。
    /// - `hooks`：合成器通知回调。
    /// - `config`：桥接配置。
    pub fn initialize(
        context: Rc<D>,
        mut renderer: R,
        hooks: CompositorHooks,
        config: &BridgeConfig,
    ) -> BridgeResult<Self> {
        context
            .make_current()
            .map_err(|err| BridgeError::bootstrap(format!("render context: {err}")))?;

        let signal = FrameReadySignal::new();
        let loader: ProcLoader = {
            let context = context.clone();
            Rc::new(move |name: &str| context.proc_address(name))
        };
        let session = renderer
            .create_session(loader, signal.notifier())
            .map_err(|err| BridgeError::bootstrap(format!("render session: {err}")))?;

        let shared = Arc::new(SharedPoolState::new());
        let pool = RotationPool::new(context.clone(), shared.clone(), config.retry_unit_creation);

        let mut bridge = Self {
            context: Some(context),
            renderer,
            session: Some(session),
            pool: Some(pool),
            shared,
            signal,
            resize: ResizeController::new(config.redraw_after_resize),
            hooks,
            counter: FrameCounter::new(config.log_interval_frames),
        };

        if let Err(err) = bridge.resize(config.initial_size) {
            tracing::error!(%err, "initial surface pool could not be built");
        }
        if let Some(context) = &bridge.context {
            context.release_current();
        }

        tracing::info!(
            width = config.initial_size.width,
            height = config.initial_size.height,
            "render bridge initialized"
        );
        Ok(bridge)
    }

    /// ### English
    /// Lock-free state the consumer reads (`current_surface`).
    ///
    /// ### 中文
    /// 消费者读取的无锁状态（`current_surface`）。
    pub fn shared_state(&self) -> Arc<SharedPoolState> {
        self.shared.clone()
    }

    /// ### English
    /// Receiver yielding one message per coalesced frame-ready notification.
    ///
    /// ### 中文
    /// 每个（已合并的）frame-ready 通知对应一条消息的接收端。
    pub fn frame_ready_receiver(&self) -> Receiver<()> {
        self.signal.receiver()
    }

    /// ### English
    /// Size of the live pool; `None` while empty or after teardown.
    ///
    /// ### 中文
    /// 当前 pool 的尺寸；为空或 teardown 之后为 `None`。
    pub fn surface_size(&self) -> Option<PhysicalSize<u32>> {
        self.pool.as_ref().and_then(RotationPool::size)
    }

    pub fn pool(&self) -> Option<&RotationPool<D>> {
        self.pool.as_ref()
    }

    pub fn stats(&self) -> FrameStats {
        self.counter.stats()
    }

    pub fn is_torn_down(&self) -> bool {
        self.context.is_none()
    }

    /// ### English
    /// Queues a draw as if the renderer had notified (coalesced with pending notifications).
    ///
    /// ### 中文
    /// 如同渲染器发出通知一样排队一次绘制（与待处理通知合并）。
    pub fn request_redraw(&self) {
        if !self.signal.notifier().notify() {
            tracing::trace!("redraw requested after teardown; ignored");
        }
    }

    /// ### English
    /// Rebuilds the pool at `new_size`, then notifies the compositor and requests a redraw.
    ///
    /// ### 中文
    /// 以 `new_size` 重建 pool，随后通知合成器并请求重绘。
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> BridgeResult<ResizeOutcome> {
        let Some(pool) = self.pool.as_mut() else {
            return Err(BridgeError::ShutDown);
        };

        let outcome = self.resize.on_resize(pool, new_size)?;
        if outcome == ResizeOutcome::Resized {
            self.hooks.resized(new_size);
            if self.resize.redraw_after_resize() {
                self.request_redraw();
            }
        }
        Ok(outcome)
    }

    /// ### English
    /// Releases units, closes the frame-ready signal, destroys the session and drops the context.
    /// Idempotent.
    ///
    /// ### 中文
    /// 释放 unit，关闭 frame-ready 信号，销毁会话并释放上下文。可重复调用。
    pub fn teardown(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };

        drop(self.pool.take());
        self.signal.close();

        if let Some(session) = self.session.take() {
            if let Err(err) = context.make_current() {
                tracing::warn!(%err, "destroying render session without a current context");
            }
            self.renderer.destroy_session(session);
        }
        context.release_current();

        let stats = self.counter.stats();
        tracing::info!(
            published = stats.published,
            dropped = stats.dropped,
            skipped = stats.skipped,
            "render bridge torn down"
        );
        drop(context);
    }
}

impl<D: GpuDevice, R: VideoRenderer> Drop for RenderBridge<D, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
