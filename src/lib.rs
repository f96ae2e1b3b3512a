//! 播放器视频输出后端
//!
//! 解码后的 YUV 帧通过两种可互换的后端显示到窗口：
//!
//! - [`output::GlOutput`]：三平面纹理 + 片段着色器做 YUV→RGB，标清/高清按画面高度选矩阵，
//!   纹理惰性上传；
//! - [`output::OverlayOutput`]：显示子系统提供的硬件 Overlay，分配时校验布局，
//!   写入后复制右边界。
//!
//! 两个后端实现同一个 [`output::VideoOutput`] 接口。字幕叠加通过 [`blend::Compositor`]，
//! 像素格式转换通过 [`convert::FrameConverter`]。

pub mod blend;
pub mod convert;
pub mod core;
pub mod output;

#[cfg(test)]
mod testing;

pub use crate::blend::{AlphaBlend, Compositor};
pub use crate::convert::{FrameConverter, SoftScaler};
pub use crate::core::{OutputConfig, OutputError, Result};
pub use crate::output::{BackendKind, SurfaceFlags, VideoOutput};
