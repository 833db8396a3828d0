//! Test renderer that paints a solid color through the software device.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Sender;

use crate::engine::device::ProcLoader;
use crate::engine::device::software::SoftwareDevice;
use crate::engine::error::RenderError;
use crate::engine::renderer::{RenderTarget, VideoRenderer};
use crate::engine::signal::FrameNotifier;

#[derive(Default)]
pub(crate) struct RendererLog {
    pub sessions_created: usize,
    pub sessions_destroyed: usize,
    pub renders: Vec<RenderTarget>,
    pub notifier: Option<FrameNotifier>,
    pub resolved_gl_symbol: bool,
    /// Device resources still alive when the session was destroyed.
    pub live_resources_at_destroy: Option<usize>,
    /// Render calls pop these codes first and fail with them.
    pub fail_codes: VecDeque<i32>,
    /// Leave this graphics error pending after the next successful render.
    pub leave_error: Option<u32>,
    pub refuse_session: bool,
}

pub(crate) struct SolidColorRenderer {
    device: Rc<SoftwareDevice>,
    color: [u8; 4],
    log: Rc<RefCell<RendererLog>>,
    notifier_out: Option<Sender<FrameNotifier>>,
}

pub(crate) struct SolidColorSession {
    _loader: ProcLoader,
}

impl SolidColorRenderer {
    pub(crate) fn new(device: Rc<SoftwareDevice>, color: [u8; 4]) -> Self {
        Self {
            device,
            color,
            log: Rc::new(RefCell::new(RendererLog::default())),
            notifier_out: None,
        }
    }

    /// Ships the session's notifier to another thread once the session exists.
    pub(crate) fn with_notifier_out(mut self, tx: Sender<FrameNotifier>) -> Self {
        self.notifier_out = Some(tx);
        self
    }

    pub(crate) fn log(&self) -> Rc<RefCell<RendererLog>> {
        self.log.clone()
    }
}

impl VideoRenderer for SolidColorRenderer {
    type Session = SolidColorSession;

    fn create_session(
        &mut self,
        loader: ProcLoader,
        notifier: FrameNotifier,
    ) -> Result<SolidColorSession, RenderError> {
        let mut log = self.log.borrow_mut();
        if log.refuse_session {
            return Err(RenderError::Session("refused".to_string()));
        }
        log.sessions_created += 1;
        log.resolved_gl_symbol = !loader("glClear").is_null();
        if let Some(tx) = &self.notifier_out {
            let _ = tx.send(notifier.clone());
        }
        log.notifier = Some(notifier);
        Ok(SolidColorSession { _loader: loader })
    }

    fn render_into(
        &mut self,
        _session: &mut SolidColorSession,
        target: RenderTarget,
    ) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if let Some(code) = log.fail_codes.pop_front() {
            return Err(RenderError::Renderer(code));
        }
        assert_eq!(
            self.device.bound_framebuffer().map(|(fb, _)| fb),
            Some(target.framebuffer)
        );
        self.device.fill_bound(self.color);
        if let Some(code) = log.leave_error.take() {
            self.device.inject_error(code);
        }
        log.renders.push(target);
        Ok(())
    }

    fn destroy_session(&mut self, session: SolidColorSession) {
        let mut log = self.log.borrow_mut();
        log.sessions_destroyed += 1;
        log.notifier = None;
        log.live_resources_at_destroy = Some(self.device.live_resources());
        drop(session);
    }
}
