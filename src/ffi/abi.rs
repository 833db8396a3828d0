use std::ffi::c_char;

use crate::engine::logging;

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn video_texture_abi_version() -> u32 {
    super::VIDEO_TEXTURE_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Installs a global `tracing` subscriber writing to stderr.
///
/// `filter` is an optional `EnvFilter` directive string; NULL or empty falls back to `RUST_LOG`,
/// then `info`. Returns `false` if a subscriber is already installed.
///
/// ### 中文
/// 安装写入 stderr 的全局 `tracing` 订阅者。
///
/// `filter` 为可选的 `EnvFilter` 指令字符串；NULL 或空字符串时依次回退到 `RUST_LOG` 与 `info`。
/// 若已安装订阅者则返回 `false`。
pub unsafe extern "C" fn video_texture_init_logging(filter: *const c_char) -> bool {
    let filter = unsafe { super::cstr_to_str(filter) };
    logging::init(filter)
}
