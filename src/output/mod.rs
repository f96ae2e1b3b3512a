//! 视频输出后端
//!
//! 播放器只通过 [`VideoOutput`] 的五个操作与后端交互：分配、释放、填充、
//! 显示、叠加字幕。具体用哪个后端由调用方构造哪个实现决定；
//! 后端分配失败时不会自动回退，由调用方换用另一个后端。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use crate::convert::FrameConverter;
use crate::core::{Rect, Result, Subtitle, VideoFrame};

pub mod color;
pub mod gl;
pub mod overlay;

pub use color::{ColorMatrix, ColorMatrixKind};
pub use gl::{GlDevice, GlOutput, GlTexture, GlowDevice};
pub use overlay::{DisplaySubsystem, MemoryDisplay, OverlayOutput, OverlaySurface, OverlayTexture};

/// 后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU 着色器后端
    Gl,
    /// 硬件 Overlay 后端
    Overlay,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Gl => "OpenGL 着色器",
            BackendKind::Overlay => "硬件 Overlay",
        }
    }
}

/// 创建显示表面时需要请求的标志
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceFlags(u32);

impl SurfaceFlags {
    pub const HW_SURFACE: Self = Self(1 << 0);
    pub const ASYNC_BLIT: Self = Self(1 << 1);
    pub const HW_ACCEL: Self = Self(1 << 2);
    /// 可编程渲染表面（OpenGL 上下文）
    pub const OPENGL: Self = Self(1 << 3);
    pub const GL_DOUBLEBUFFER: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }
}

impl BitOr for SurfaceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for SurfaceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::HW_SURFACE, "HW_SURFACE"),
            (Self::ASYNC_BLIT, "ASYNC_BLIT"),
            (Self::HW_ACCEL, "HW_ACCEL"),
            (Self::OPENGL, "OPENGL"),
            (Self::GL_DOUBLEBUFFER, "GL_DOUBLEBUFFER"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "SurfaceFlags({})", set.join(" | "))
    }
}

/// 视频输出后端接口
///
/// 所有操作都必须在拥有 GL 上下文 / 显示表面的线程上调用。
/// 纹理句柄的类型绑定在后端上，一个句柄不可能被另一个后端使用。
pub trait VideoOutput {
    /// 后端私有的纹理句柄
    type Texture;

    /// 创建显示表面时需要请求的标志
    const SURFACE_FLAGS: SurfaceFlags;

    /// 按解码分辨率分配纹理
    fn alloc_texture(&mut self, width: u32, height: u32) -> Result<Self::Texture>;

    /// 释放纹理；对 `None` 调用是空操作，所以重复释放是安全的
    fn free_texture(&mut self, texture: &mut Option<Self::Texture>);

    /// 用解码帧填充纹理
    ///
    /// 有 `converter` 时由它把源帧转换到后端自己的缓冲区；
    /// 没有时源帧必须已经是后端的原生格式。
    fn fill_texture(
        &mut self,
        texture: &mut Self::Texture,
        frame: &Arc<VideoFrame>,
        converter: Option<&mut dyn FrameConverter>,
    ) -> Result<()>;

    /// 把当前内容显示到目标矩形
    fn display_texture(&mut self, texture: &mut Self::Texture, rect: Rect) -> Result<()>;

    /// 按顺序把字幕的每个矩形叠加到纹理内容上
    fn blend_texture(&mut self, texture: &mut Self::Texture, subtitle: &Subtitle) -> Result<()>;
}
