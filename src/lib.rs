/// ### English
/// `video_texture_bridge` crate root.
/// Renders video frames from an external renderer into compositor-shareable GPU surfaces through a
/// triple-buffered rotation pool. Exposes the C ABI via `ffi`; core implementation lives under
/// `engine`.
///
/// ### 中文
/// `video_texture_bridge` 的 crate 根。
/// 通过三缓冲轮转池，将外部渲染器输出的视频帧渲染到可与合成器共享的 GPU surface 中。
/// 通过 `ffi` 导出 C ABI；核心实现位于 `engine` 模块。
pub mod engine;
mod ffi;
