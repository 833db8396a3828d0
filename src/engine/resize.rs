//! ### English
//! Resize controller: validates size changes and rebuilds the rotation pool.
//!
//! ### 中文
//! Resize 控制器：校验尺寸变化并重建轮转池。

use dpi::PhysicalSize;

use crate::engine::device::GpuDevice;
use crate::engine::error::BridgeResult;
use crate::engine::pool::{ReinitOutcome, RotationPool};

/// ### English
/// Result of a resize request.
///
/// ### 中文
/// resize 请求的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// ### English
    /// The pool was rebuilt at the new size.
    ///
    /// ### 中文
    /// pool 已按新尺寸重建。
    Resized,
    /// ### English
    /// Degenerate size; the previous pool is kept.
    ///
    /// ### 中文
    /// 退化尺寸；保留之前的 pool。
    Ignored,
}

/// ### English
/// Converts C ABI signed dimensions; negative values are rejected.
///
/// ### 中文
/// 转换 C ABI 的有符号尺寸；负值会被拒绝。
pub fn size_from_signed(width: i32, height: i32) -> Option<PhysicalSize<u32>> {
    Some(PhysicalSize::new(
        u32::try_from(width).ok()?,
        u32::try_from(height).ok()?,
    ))
}

/// ### English
/// Applies size changes to a rotation pool.
///
/// ### 中文
/// 将尺寸变化应用到轮转池。
#[derive(Clone, Copy, Debug)]
pub struct ResizeController {
    redraw_after_resize: bool,
}

impl ResizeController {
    pub fn new(redraw_after_resize: bool) -> Self {
        Self {
            redraw_after_resize,
        }
    }

    /// ### English
    /// Whether a redraw should be requested after a successful resize.
    ///
    /// ### 中文
    /// resize 成功后是否应请求重绘。
    pub fn redraw_after_resize(&self) -> bool {
        self.redraw_after_resize
    }

    /// ### English
    /// Rebuilds `pool` at `new_size`.
    ///
    /// Rebuilding to the current size still replaces every unit. On failure the pool is left empty
    /// and the error is returned.
    ///
    /// #### Parameters
    /// - `pool`: Pool to rebuild (render thread).
    /// - `new_size`: Requested size in pixels.
    ///
    /// ### 中文
    /// 以 `new_size` 重建 `pool`。
    ///
    /// 即使尺寸与当前相同也会替换所有 unit。失败时 pool 保持为空并返回错误。
    ///
    /// #### 参数
    /// - `pool`：要重建的 pool（渲染线程）。
    /// - `new_size`：请求的像素尺寸。
    pub fn on_resize<D: GpuDevice>(
        &self,
        pool: &mut RotationPool<D>,
        new_size: PhysicalSize<u32>,
    ) -> BridgeResult<ResizeOutcome> {
        if new_size.width == 0 || new_size.height == 0 {
            tracing::info!(
                width = new_size.width,
                height = new_size.height,
                "ignoring resize to a degenerate size"
            );
            return Ok(ResizeOutcome::Ignored);
        }

        match pool.reinit(new_size)? {
            ReinitOutcome::Rebuilt => Ok(ResizeOutcome::Resized),
            ReinitOutcome::Rejected => Ok(ResizeOutcome::Ignored),
        }
    }
}
