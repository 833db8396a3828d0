//! ### English
//! Dedicated render thread orchestration (public API).
//!
//! ### 中文
//! 独立渲染线程编排（对外公开 API）。

mod command;
mod handle;
mod render_thread;

pub use handle::BridgeHandle;

use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;

use crate::engine::bridge::CompositorHooks;
use crate::engine::config::BridgeConfig;
use crate::engine::device::GpuDevice;
use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::renderer::VideoRenderer;

use command::Command;

const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// ### English
/// Owns the dedicated render thread of one bridge instance.
///
/// ### 中文
/// 持有单个桥接实例的独立渲染线程。
pub struct BridgeRuntime {
    handle: BridgeHandle,
    /// ### English
    /// Join handle for the render thread (`None` after shutdown).
    ///
    /// ### 中文
    /// 渲染线程的 join handle（shutdown 之后为 `None`）。
    thread: Option<thread::JoinHandle<()>>,
}

impl BridgeRuntime {
    /// ### English
    /// Spawns the render thread and blocks until the bridge is initialized (or times out).
    ///
    /// The render context and renderer are created by `factory` on the render thread, so neither
    /// needs to be `Send`.
    ///
    /// #### Parameters
    /// - `factory`: Creates the render context and renderer.
    /// - `hooks`: Compositor notifications (called on the render thread).
    /// - `config`: Bridge configuration.
    ///
    /// ### 中文
    /// 启动渲染线程，并阻塞等待桥接初始化完成（或超时）。
    ///
    /// 渲染上下文与渲染器由 `factory` 在渲染线程上创建，因此二者都不需要 `Send`。
    ///
    /// #### 参数
    /// - `factory`：创建渲染上下文与渲染器。
    /// - `hooks`：合成器通知回调（在渲染线程上调用）。
    /// - `config`：桥接配置。
    pub fn spawn<D, R, F>(factory: F, hooks: CompositorHooks, config: BridgeConfig) -> BridgeResult<Self>
    where
        D: GpuDevice + 'static,
        R: VideoRenderer + 'static,
        F: FnOnce() -> BridgeResult<(Rc<D>, R)> + Send + 'static,
    {
        let (command_tx, command_rx) = channel::unbounded();
        let (init_tx, init_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                render_thread::run_render_thread(factory, hooks, config, command_rx, init_tx);
            })
            .map_err(|err| BridgeError::bootstrap(format!("spawn render thread: {err}")))?;

        match init_rx.recv_timeout(INIT_TIMEOUT) {
            Ok(Ok(shared)) => Ok(Self {
                handle: BridgeHandle::new(command_tx, shared),
                thread: Some(thread),
            }),
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                drop(init_rx);
                let _ = command_tx.send(Command::Shutdown);
                let _ = thread.join();
                Err(BridgeError::bootstrap("timed out initializing render thread"))
            }
            Err(channel::RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                Err(BridgeError::bootstrap("render thread exited during initialization"))
            }
        }
    }

    /// ### English
    /// Thread-safe handle for compositor threads.
    ///
    /// ### 中文
    /// 供合成器线程使用的线程安全句柄。
    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// ### English
    /// Tears the bridge down on the render thread and joins it. Idempotent.
    ///
    /// Outstanding handles keep working for reads (`current_surface` returns `None`) and report
    /// `ShutDown` for commands.
    ///
    /// ### 中文
    /// 在渲染线程上销毁桥接并 join 线程。可重复调用。
    ///
    /// 未释放的句柄仍可读取（`current_surface` 返回 `None`），发送命令时返回 `ShutDown`。
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.handle.shutdown();
        if thread.join().is_err() {
            tracing::error!("render thread panicked");
        }
    }
}

impl Drop for BridgeRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use dpi::PhysicalSize;

    use super::*;
    use crate::engine::device::software::SoftwareDevice;
    use crate::engine::pool::DisplaySurface;
    use crate::engine::resize::ResizeOutcome;
    use crate::engine::signal::FrameNotifier;
    use crate::engine::testing::SolidColorRenderer;

    const WAIT: Duration = Duration::from_secs(5);

    fn config(width: u32, height: u32) -> BridgeConfig {
        BridgeConfig {
            initial_size: PhysicalSize::new(width, height),
            ..BridgeConfig::default()
        }
    }

    fn spawn_solid(
        config: BridgeConfig,
        hooks: CompositorHooks,
    ) -> (BridgeRuntime, channel::Receiver<FrameNotifier>) {
        let (notifier_tx, notifier_rx) = channel::bounded(1);
        let runtime = BridgeRuntime::spawn(
            move || {
                let device = Rc::new(SoftwareDevice::new());
                let renderer =
                    SolidColorRenderer::new(device.clone(), [255, 0, 0, 255]).with_notifier_out(notifier_tx);
                Ok((device, renderer))
            },
            hooks,
            config,
        )
        .expect("runtime spawns");
        (runtime, notifier_rx)
    }

    fn wait_for(handle: &BridgeHandle, accept: impl Fn(&DisplaySurface) -> bool) -> DisplaySurface {
        let deadline = Instant::now() + WAIT;
        loop {
            if let Some(surface) = handle.current_surface() {
                if accept(&surface) {
                    return surface;
                }
            }
            assert!(Instant::now() < deadline, "timed out waiting for a surface");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn first_frame_is_drawn_after_startup() {
        let (runtime, _notifier) = spawn_solid(config(64, 32), CompositorHooks::new());
        let handle = runtime.handle();

        let surface = wait_for(&handle, |_| true);
        assert_eq!((surface.width, surface.height), (64, 32));
        assert!(surface.frame_seq >= 1);
    }

    #[test]
    fn renderer_notifications_publish_newer_frames() {
        let (frames_tx, frames_rx) = channel::unbounded();
        let hooks = CompositorHooks::new().on_frame_published(move |surface| {
            let _ = frames_tx.send(surface.frame_seq);
        });
        let (runtime, notifier) = spawn_solid(config(16, 16), hooks);
        let handle = runtime.handle();
        let notifier = notifier.recv_timeout(WAIT).expect("session created");

        let first = frames_rx.recv_timeout(WAIT).expect("initial frame");
        assert!(notifier.notify());
        let second = frames_rx.recv_timeout(WAIT).expect("notified frame");
        assert!(second > first);

        let surface = wait_for(&handle, |surface| surface.frame_seq >= second);
        assert_eq!(surface.frame_seq, second);
    }

    #[test]
    fn resize_round_trips_through_the_render_thread() {
        let (resized_tx, resized_rx) = channel::unbounded();
        let hooks = CompositorHooks::new().on_resized(move |size| {
            let _ = resized_tx.send(size);
        });
        let (runtime, _notifier) = spawn_solid(config(8, 8), hooks);
        let handle = runtime.handle();
        assert_eq!(resized_rx.recv_timeout(WAIT), Ok(PhysicalSize::new(8, 8)));

        let outcome = handle.resize(PhysicalSize::new(40, 20)).expect("resize succeeds");
        assert_eq!(outcome, ResizeOutcome::Resized);
        assert_eq!(resized_rx.recv_timeout(WAIT), Ok(PhysicalSize::new(40, 20)));

        let surface = wait_for(&handle, |surface| surface.width == 40);
        assert_eq!(surface.height, 20);
    }

    #[test]
    fn degenerate_resize_is_ignored() {
        let (runtime, _notifier) = spawn_solid(config(8, 8), CompositorHooks::new());
        let handle = runtime.handle();

        let outcome = handle.resize(PhysicalSize::new(0, 10)).expect("resize answered");
        assert_eq!(outcome, ResizeOutcome::Ignored);
        let surface = wait_for(&handle, |_| true);
        assert_eq!((surface.width, surface.height), (8, 8));
    }

    #[test]
    fn factory_failure_is_reported_by_spawn() {
        let result = BridgeRuntime::spawn(
            || -> BridgeResult<(Rc<SoftwareDevice>, SolidColorRenderer)> {
                Err(BridgeError::bootstrap("no adapter"))
            },
            CompositorHooks::new(),
            BridgeConfig::default(),
        );
        assert!(matches!(result, Err(BridgeError::Bootstrap(ref msg)) if msg == "no adapter"));
    }

    #[test]
    fn refused_session_is_reported_by_spawn() {
        let result = BridgeRuntime::spawn(
            || {
                let device = Rc::new(SoftwareDevice::new());
                let renderer = SolidColorRenderer::new(device.clone(), [0, 0, 0, 255]);
                renderer.log().borrow_mut().refuse_session = true;
                Ok((device, renderer))
            },
            CompositorHooks::new(),
            BridgeConfig::default(),
        );
        assert!(matches!(result, Err(BridgeError::Bootstrap(_))));
    }

    #[test]
    fn handles_report_shutdown_after_runtime_stops() {
        let (mut runtime, notifier) = spawn_solid(config(8, 8), CompositorHooks::new());
        let handle = runtime.handle();
        let notifier = notifier.recv_timeout(WAIT).expect("session created");
        wait_for(&handle, |_| true);

        runtime.shutdown();
        runtime.shutdown();

        assert!(!runtime.is_running());
        assert!(handle.current_surface().is_none());
        assert_eq!(handle.role_counts().empty, 3);
        assert!(matches!(handle.request_redraw(), Err(BridgeError::ShutDown)));
        assert!(matches!(
            handle.resize(PhysicalSize::new(4, 4)),
            Err(BridgeError::ShutDown)
        ));
        assert!(!notifier.notify());
    }
}
