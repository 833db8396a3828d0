//! ### English
//! Cache-line padding helpers for the lock-free pool state.
//!
//! ### 中文
//! 无锁 pool 状态使用的 cache line padding 工具。

/// ### English
/// The cache line size we optimize for (bytes).
///
/// ### 中文
/// 作为优化目标的 cache line 大小（字节）。
pub(crate) const CACHE_LINE_BYTES: usize = 64;

/// ### English
/// Returns the padding bytes needed to advance to the next cache-line boundary.
///
/// #### Parameters
/// - `bytes_used`: Number of bytes already occupied by preceding fields.
///
/// ### 中文
/// 返回将偏移推进到下一个 cache line 边界所需的 padding 字节数。
///
/// #### 参数
/// - `bytes_used`：前置字段已占用的字节数。
#[inline]
pub(crate) const fn pad_to_cache_line(bytes_used: usize) -> usize {
    let rem = bytes_used % CACHE_LINE_BYTES;
    if rem == 0 { 0 } else { CACHE_LINE_BYTES - rem }
}

/// ### English
/// Padding after a single field of type `T`, used to keep the published-current word on its own
/// cache line, away from the per-slot atomics the producer rewrites.
///
/// ### 中文
/// 单个 `T` 字段之后的 padding，用于让 current 字独占一个 cache line，
/// 与生产者频繁改写的各槽位原子量分离。
#[inline]
pub(crate) const fn pad_after<T>() -> usize {
    pad_to_cache_line(std::mem::size_of::<T>())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use super::*;

    #[test]
    fn padding_reaches_the_next_line() {
        assert_eq!(pad_to_cache_line(0), 0);
        assert_eq!(pad_to_cache_line(1), 63);
        assert_eq!(pad_to_cache_line(64), 0);
        assert_eq!(pad_after::<AtomicU64>(), 56);
    }
}
