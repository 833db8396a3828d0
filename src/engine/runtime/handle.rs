use std::sync::Arc;

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::error::{BridgeError, BridgeResult};
use crate::engine::pool::{DisplaySurface, RoleCounts, SharedPoolState};
use crate::engine::resize::ResizeOutcome;

use super::command::Command;

/// ### English
/// Thread-safe handle for compositor threads.
/// Reads go straight to the lock-free pool state; everything else is a command to the render thread.
///
/// ### 中文
/// 供合成器线程使用的线程安全句柄。
/// 读取直接访问无锁 pool 状态；其余操作都以命令形式发送到渲染线程。
#[derive(Clone)]
pub struct BridgeHandle {
    commands: channel::Sender<Command>,
    shared: Arc<SharedPoolState>,
}

impl BridgeHandle {
    pub(super) fn new(commands: channel::Sender<Command>, shared: Arc<SharedPoolState>) -> Self {
        Self { commands, shared }
    }

    /// ### English
    /// Latest completed frame, or `None` if nothing is displayable. Never blocks.
    ///
    /// ### 中文
    /// 最近完成的帧；没有可显示内容时为 `None`。从不阻塞。
    pub fn current_surface(&self) -> Option<DisplaySurface> {
        self.shared.peek_current()
    }

    pub fn role_counts(&self) -> RoleCounts {
        self.shared.role_counts()
    }

    /// ### English
    /// Rebuilds the pool at `size` and waits for the render thread's answer.
    ///
    /// ### 中文
    /// 以 `size` 重建 pool，并等待渲染线程的结果。
    pub fn resize(&self, size: PhysicalSize<u32>) -> BridgeResult<ResizeOutcome> {
        let (reply, response) = channel::bounded(1);
        self.send(Command::Resize {
            size,
            reply: Some(reply),
        })?;
        response.recv().map_err(|_| BridgeError::ShutDown)?
    }

    /// ### English
    /// Queues a pool rebuild without waiting.
    ///
    /// ### 中文
    /// 排队一次 pool 重建，不等待结果。
    pub fn request_resize(&self, size: PhysicalSize<u32>) -> BridgeResult<()> {
        self.send(Command::Resize { size, reply: None })
    }

    pub fn request_redraw(&self) -> BridgeResult<()> {
        self.send(Command::RequestRedraw)
    }

    pub(super) fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    fn send(&self, command: Command) -> BridgeResult<()> {
        self.commands
            .send(command)
            .map_err(|_| BridgeError::ShutDown)
    }
}
