//! ### English
//! Internal command protocol between compositor threads and the dedicated render thread.
//!
//! ### 中文
//! 合成器线程与独立渲染线程之间的内部命令协议。

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::error::BridgeResult;
use crate::engine::resize::ResizeOutcome;

/// ### English
/// Commands sent to the render thread. They share one event loop with frame-ready signals, which
/// serializes resizes against draws.
///
/// ### 中文
/// 发送到渲染线程的命令。它们与 frame-ready 信号共用同一个事件循环，从而使 resize 与绘制串行化。
pub(super) enum Command {
    /// ### English
    /// Rebuilds the rotation pool.
    ///
    /// ### 中文
    /// 重建轮转池。
    Resize {
        /// ### English
        /// New size in physical pixels.
        ///
        /// ### 中文
        /// 新尺寸（物理像素）。
        size: PhysicalSize<u32>,
        /// ### English
        /// Optional reply channel for synchronous callers.
        ///
        /// ### 中文
        /// 同步调用方使用的可选回复通道。
        reply: Option<channel::Sender<BridgeResult<ResizeOutcome>>>,
    },
    /// ### English
    /// Queues a draw (coalesced with renderer notifications).
    ///
    /// ### 中文
    /// 排队一次绘制（与渲染器通知合并）。
    RequestRedraw,
    /// ### English
    /// Tears the bridge down and exits the render thread.
    ///
    /// ### 中文
    /// 销毁渲染桥并退出渲染线程。
    Shutdown,
}
