/// ### English
/// Engine modules: render-thread bridge, surface pool, GPU device seam and runtime.
///
/// ### 中文
/// 引擎模块：渲染线程桥接、surface pool、GPU 设备抽象与运行时。
pub mod bridge;
pub(crate) mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod flags;
pub mod logging;
pub mod pool;
pub mod renderer;
pub mod resize;
pub mod runtime;
pub mod signal;
pub mod surface;
#[cfg(test)]
mod testing;
