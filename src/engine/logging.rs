//! ### English
//! Optional `tracing` subscriber installation for embedders that have no subscriber of their own.
//!
//! ### 中文
//! 为没有自带订阅者的宿主提供可选的 `tracing` 订阅者安装。

use tracing_subscriber::EnvFilter;

/// ### English
/// Filter used when neither an explicit filter nor `RUST_LOG` is provided.
///
/// ### 中文
/// 未提供显式过滤器且未设置 `RUST_LOG` 时使用的过滤器。
const DEFAULT_FILTER: &str = "info";

/// ### English
/// Resolves the effective filter directive string.
///
/// Priority: explicit `filter` (non-empty) > `RUST_LOG` > [`DEFAULT_FILTER`].
///
/// ### 中文
/// 解析最终生效的过滤指令字符串。
///
/// 优先级：显式 `filter`（非空）> `RUST_LOG` > [`DEFAULT_FILTER`]。
fn resolve_filter(filter: Option<&str>) -> String {
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        return filter.to_string();
    }

    std::env::var("RUST_LOG")
        .ok()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// ### English
/// Installs a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed (by us or by the host process).
///
/// #### Parameters
/// - `filter`: Optional `EnvFilter` directive string (e.g. `"video_texture_bridge=debug"`).
///
/// ### 中文
/// 安装全局 fmt 订阅者。
///
/// 若全局订阅者已安装（无论由本库还是宿主进程安装），返回 `false`。
///
/// #### 参数
/// - `filter`：可选的 `EnvFilter` 指令字符串（如 `"video_texture_bridge=debug"`）。
pub fn init(filter: Option<&str>) -> bool {
    let directives = resolve_filter(filter);
    let env_filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
