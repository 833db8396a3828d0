//! ### English
//! Error taxonomy for the bridge (bootstrap / resource / transient render failures).
//!
//! ### 中文
//! 桥接层的错误分类（启动失败 / 资源失败 / 瞬时渲染失败）。

/// ### English
/// Result alias used across the engine.
///
/// ### 中文
/// 引擎内通用的 Result 别名。
pub type BridgeResult<T> = Result<T, BridgeError>;

/// ### English
/// Top-level bridge error.
///
/// ### 中文
/// 桥接层顶层错误。
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// ### English
    /// The graphics connection/device/context could not be created. Fatal for the bridge.
    ///
    /// ### 中文
    /// 无法创建图形连接/设备/上下文。对桥接层而言是致命错误。
    #[error("bootstrap error: {0}")]
    Bootstrap(String),

    /// ### English
    /// A surface unit could not be created, or a lease refers to a unit that no longer exists.
    ///
    /// ### 中文
    /// 无法创建 surface unit，或租约引用的 unit 已不存在。
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// ### English
    /// A transient draw failure (renderer or graphics API).
    ///
    /// ### 中文
    /// 瞬时绘制失败（渲染器或图形 API）。
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// ### English
    /// The render thread has already exited.
    ///
    /// ### 中文
    /// 渲染线程已退出。
    #[error("bridge is shut down")]
    ShutDown,
}

/// ### English
/// Resource-creation class errors.
///
/// ### 中文
/// 资源创建类错误。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("framebuffer incomplete (status 0x{status:04x})")]
    FramebufferIncomplete { status: u32 },

    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// ### English
    /// The lease was issued for a pool generation that has since been rebuilt or torn down.
    ///
    /// ### 中文
    /// 租约所属的 pool 代次已被重建或销毁。
    #[error("stale surface unit (slot {slot}, generation {generation})")]
    StaleUnit { slot: usize, generation: u64 },
}

/// ### English
/// Transient render errors. Logged and turned into a dropped frame; never fatal.
///
/// ### 中文
/// 瞬时渲染错误。记录日志并视为丢帧；从不致命。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("renderer returned error code {0}")]
    Renderer(i32),

    #[error("graphics error 0x{code:04x} in {label}")]
    Graphics { label: &'static str, code: u32 },

    #[error("failed to make the render context current: {0}")]
    MakeCurrent(String),

    #[error("render session unavailable: {0}")]
    Session(String),
}

impl BridgeError {
    pub fn bootstrap(msg: impl Into<String>) -> Self {
        Self::Bootstrap(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Resource(ResourceError::Allocation(msg.into()))
    }

    /// ### English
    /// Returns whether this error belongs to the resource-creation class.
    ///
    /// ### 中文
    /// 返回该错误是否属于资源创建类。
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            BridgeError::bootstrap("no adapter")
                .to_string()
                .starts_with("bootstrap error:")
        );
        assert!(
            BridgeError::allocation("x")
                .to_string()
                .starts_with("resource error: allocation failed")
        );
        let stale = BridgeError::from(ResourceError::StaleUnit {
            slot: 1,
            generation: 7,
        });
        assert!(stale.is_resource());
        assert!(stale.to_string().contains("generation 7"));
    }

    #[test]
    fn framebuffer_status_is_hex() {
        let err = ResourceError::FramebufferIncomplete { status: 0x8cd6 };
        assert_eq!(err.to_string(), "framebuffer incomplete (status 0x8cd6)");
    }

    #[test]
    fn render_errors_are_not_resource_errors() {
        let err = BridgeError::from(RenderError::Renderer(-3));
        assert!(!err.is_resource());
        assert_eq!(err.to_string(), "render error: renderer returned error code -3");
    }
}
