//! ### English
//! Coalescing frame-ready signal.
//!
//! The external renderer may notify from any thread, any number of times. At most one pending
//! notification is kept, so a burst of notifications triggers one draw on the render thread.
//!
//! ### 中文
//! 可合并的 frame-ready 信号。
//!
//! 外部渲染器可从任意线程、任意次数地通知。最多只保留一个待处理通知，因此一连串通知只会在渲染线程
//! 触发一次绘制。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{self as channel, Receiver, Sender, TrySendError};

/// ### English
/// Render-thread side of the signal.
///
/// ### 中文
/// 信号的渲染线程一侧。
pub struct FrameReadySignal {
    tx: Sender<()>,
    rx: Receiver<()>,
    closed: Arc<AtomicBool>,
}

/// ### English
/// Cloneable, thread-safe notifier handed to the external renderer.
///
/// ### 中文
/// 交给外部渲染器的可克隆、线程安全通知器。
#[derive(Clone)]
pub struct FrameNotifier {
    tx: Sender<()>,
    closed: Arc<AtomicBool>,
}

impl FrameReadySignal {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(1);
        Self {
            tx,
            rx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn notifier(&self) -> FrameNotifier {
        FrameNotifier {
            tx: self.tx.clone(),
            closed: self.closed.clone(),
        }
    }

    /// ### English
    /// Receiver to select on; each message is one (coalesced) draw request.
    ///
    /// ### 中文
    /// 用于 select 的接收端；每条消息代表一次（已合并的）绘制请求。
    pub fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }

    /// ### English
    /// Consumes a pending notification, if any.
    ///
    /// ### 中文
    /// 取走一个待处理通知（若有）。
    #[cfg(test)]
    pub fn try_take(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// ### English
    /// Unregisters every notifier; later notifications are dropped.
    ///
    /// ### 中文
    /// 注销所有通知器；之后的通知都会被丢弃。
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        while self.rx.try_recv().is_ok() {}
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for FrameReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameNotifier {
    /// ### English
    /// Requests a draw. Returns `false` once the signal has been closed.
    ///
    /// ### 中文
    /// 请求一次绘制。信号关闭后返回 `false`。
    pub fn notify(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}
