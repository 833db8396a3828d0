//! ### English
//! Per-frame draw path of the render bridge.
//!
//! ### 中文
//! 渲染桥的逐帧绘制路径。

use dpi::PhysicalSize;

use super::RenderBridge;
use crate::engine::device::{self, GpuDevice};
use crate::engine::error::RenderError;
use crate::engine::pool::WriteLease;
use crate::engine::renderer::{RenderTarget, VideoRenderer};
use crate::engine::surface::UnitId;

/// ### English
/// What happened to one draw request.
///
/// ### 中文
/// 一次绘制请求的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// ### English
    /// The frame was drawn and is now current.
    ///
    /// ### 中文
    /// 帧已绘制完成并成为 current。
    Published { unit: UnitId, frame_seq: u64 },
    /// ### English
    /// No unit was available (empty pool or one already in flight).
    ///
    /// ### 中文
    /// 没有可用的 unit（pool 为空或已有 unit 处于 in-flight）。
    Skipped,
    /// ### English
    /// The draw failed; the unit was returned and the previous frame stays current.
    ///
    /// ### 中文
    /// 绘制失败；unit 已归还，之前的帧保持为 current。
    Dropped,
}

impl<D: GpuDevice, R: VideoRenderer> RenderBridge<D, R> {
    /// ### English
    /// Draws the next frame into an idle unit and publishes it.
    ///
    /// Never fails: renderer and graphics errors are logged and become `Dropped`.
    ///
    /// #### Parameters
    /// - `target_size`: Size passed to the renderer (normally the pool size).
    ///
    /// ### 中文
    /// 将下一帧绘制到一个空闲 unit 并发布。
    ///
    /// 从不失败：渲染器与图形错误会被记录并转为 `Dropped`。
    ///
    /// #### 参数
    /// - `target_size`：传给渲染器的尺寸（通常为 pool 尺寸）。
    pub fn draw_frame(&mut self, target_size: PhysicalSize<u32>) -> DrawOutcome {
        let Some(context) = self.context.clone() else {
            return DrawOutcome::Skipped;
        };
        let Some(lease) = self.pool.as_mut().and_then(|pool| pool.acquire_for_write()) else {
            self.counter.record_skipped();
            tracing::debug!("no idle surface unit; frame dropped");
            return DrawOutcome::Skipped;
        };

        let index = self.counter.begin_frame();
        if self.counter.is_detailed(index) {
            tracing::debug!(
                frame = index,
                unit = %lease.unit_id(),
                framebuffer = lease.framebuffer(),
                width = target_size.width,
                height = target_size.height,
                "rendering frame"
            );
        }

        let rendered = self.render_lease(context.as_ref(), &lease, target_size);
        let outcome = match rendered {
            Ok(()) => self.publish_lease(lease),
            Err(err) => {
                tracing::warn!(frame = index, unit = %lease.unit_id(), %err, "frame dropped");
                if let Some(pool) = self.pool.as_mut() {
                    pool.abandon(lease);
                }
                self.counter.record_dropped();
                DrawOutcome::Dropped
            }
        };
        context.release_current();
        outcome
    }

    fn render_lease(
        &mut self,
        context: &D,
        lease: &WriteLease,
        target_size: PhysicalSize<u32>,
    ) -> Result<(), RenderError> {
        context.make_current()?;
        let Some(session) = self.session.as_mut() else {
            return Err(RenderError::Session("session already destroyed".to_string()));
        };

        context.begin_draw(lease.framebuffer(), lease.size());
        let rendered = self.renderer.render_into(
            session,
            RenderTarget {
                framebuffer: lease.framebuffer(),
                size: target_size,
            },
        );
        let checked = rendered.and_then(|()| device::check_error(context, "render_into"));
        context.end_draw();
        checked
    }

    fn publish_lease(&mut self, lease: WriteLease) -> DrawOutcome {
        let Some(pool) = self.pool.as_mut() else {
            return DrawOutcome::Dropped;
        };
        let unit = lease.unit_id();
        match pool.publish(lease) {
            Ok(frame_seq) => {
                self.counter.record_published();
                tracing::trace!(%unit, frame_seq, "frame published");
                if let Some(surface) = pool.peek_current() {
                    self.hooks.frame_published(&surface);
                }
                DrawOutcome::Published { unit, frame_seq }
            }
            Err(err) => {
                tracing::warn!(%unit, %err, "publish rejected");
                self.counter.record_dropped();
                DrawOutcome::Dropped
            }
        }
    }
}
