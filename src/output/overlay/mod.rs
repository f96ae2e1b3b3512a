//! 硬件 Overlay 后端
//!
//! 显示子系统给出的 Overlay 可能比请求的小，分配时必须校验布局；
//! 行跨度大于画面宽度时，每次写入后把最右一列复制到填充区。

use log::{debug, info, warn};
use std::sync::Arc;

use crate::blend::{AlphaBlend, Compositor};
use crate::convert::FrameConverter;
use crate::core::{chroma_extent, OutputError, PlanarViewMut, Rect, Result, Subtitle, VideoFrame};
use crate::output::{SurfaceFlags, VideoOutput};

pub mod memory;
pub mod surface;

pub use memory::{Framebuffer, MemoryDisplay, MemoryOverlay};
pub use surface::{DisplaySubsystem, OverlayFormat, OverlayLock, OverlaySurface};

/// 检查显示子系统给出的表面能否容纳 `width x height` 的画面
///
/// 亮度行跨度不小于宽度，且亮度平面与下一个平面的间距不小于
/// `height * pitch`。
pub fn validate_layout<S: OverlaySurface>(surface: &S, width: u32, height: u32) -> Result<()> {
    let pitch = surface.pitches()[0];
    let origins = surface.plane_origins();
    let plane_gap = origins[0].abs_diff(origins[1]);

    let fits = pitch >= width as usize
        && (height as usize)
            .checked_mul(pitch)
            .is_some_and(|needed| plane_gap >= needed);
    if !fits {
        return Err(OutputError::UnderAllocation {
            width,
            height,
            pitch,
            plane_gap,
        });
    }
    Ok(())
}

/// 用每行最后一个有效像素填满该行的跨度填充区
pub fn duplicate_right_border(picture: &mut PlanarViewMut<'_>) {
    let (w, h) = (picture.width as usize, picture.height as usize);
    for (index, plane) in picture.planes.iter_mut().enumerate() {
        let (width, rows) = if index == 0 { (w, h) } else { (chroma_extent(w), chroma_extent(h)) };
        let pitch = picture.strides[index];
        if width == 0 || pitch <= width {
            continue;
        }

        for row in 0..rows {
            let start = row * pitch;
            let end = (start + pitch).min(plane.len());
            if start + width > end {
                break;
            }
            let line = &mut plane[start..end];
            let last = line[width - 1];
            line[width..].fill(last);
        }
    }
}

/// Overlay 后端的纹理句柄
#[derive(Debug)]
pub struct OverlayTexture<T> {
    surface: T,
    width: u32,
    height: u32,
}

impl<T> OverlayTexture<T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }
}

/// 硬件 Overlay 后端
pub struct OverlayOutput<S: DisplaySubsystem> {
    display: S,
    compositor: Box<dyn Compositor>,
}

impl<S: DisplaySubsystem> OverlayOutput<S> {
    pub fn new(display: S) -> Self {
        Self {
            display,
            compositor: Box::new(AlphaBlend),
        }
    }

    pub fn with_compositor(mut self, compositor: Box<dyn Compositor>) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn display(&self) -> &S {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut S {
        &mut self.display
    }
}

impl<S: DisplaySubsystem> VideoOutput for OverlayOutput<S> {
    type Texture = OverlayTexture<S::Surface>;

    const SURFACE_FLAGS: SurfaceFlags = SurfaceFlags::HW_SURFACE
        .union(SurfaceFlags::ASYNC_BLIT)
        .union(SurfaceFlags::HW_ACCEL);

    fn alloc_texture(&mut self, width: u32, height: u32) -> Result<Self::Texture> {
        if width == 0 || height == 0 {
            return Err(OutputError::InvalidDimensions { width, height });
        }

        let Some(surface) = self.display.create_overlay(width, height, OverlayFormat::Yv12) else {
            warn!("显示子系统无法提供 {}x{} 的 Overlay", width, height);
            return Err(OutputError::OverlayUnavailable);
        };

        if let Err(e) = validate_layout(&surface, width, height) {
            warn!("Overlay 布局不满足要求: {}", e);
            self.display.free_overlay(surface);
            return Err(e);
        }

        info!(
            "🆕 分配 Overlay: {}x{}, 跨度 {:?}",
            width,
            height,
            surface.pitches()
        );

        Ok(OverlayTexture {
            surface,
            width,
            height,
        })
    }

    fn free_texture(&mut self, texture: &mut Option<Self::Texture>) {
        if let Some(texture) = texture.take() {
            debug!("🧹 释放 Overlay: {}x{}", texture.width, texture.height);
            self.display.free_overlay(texture.surface);
        }
    }

    fn fill_texture(
        &mut self,
        texture: &mut Self::Texture,
        frame: &Arc<VideoFrame>,
        converter: Option<&mut dyn FrameConverter>,
    ) -> Result<()> {
        let (width, height) = (texture.width, texture.height);
        let mut lock = OverlayLock::acquire(&mut texture.surface)?;
        let mut picture = lock.picture(width, height);

        match converter {
            Some(converter) => converter.convert(frame, &mut picture)?,
            None => picture.copy_from(frame)?,
        }
        duplicate_right_border(&mut picture);
        Ok(())
    }

    fn display_texture(&mut self, texture: &mut Self::Texture, rect: Rect) -> Result<()> {
        self.display.display_overlay(&mut texture.surface, rect)
    }

    fn blend_texture(&mut self, texture: &mut Self::Texture, subtitle: &Subtitle) -> Result<()> {
        let (width, height) = (texture.width, texture.height);
        let mut lock = OverlayLock::acquire(&mut texture.surface)?;
        let mut picture = lock.picture(width, height);

        for rect in &subtitle.rects {
            self.compositor.blend_rect(&mut picture, rect);
        }
        duplicate_right_border(&mut picture);
        Ok(())
    }
}
