//! 系统内存里的显示子系统
//!
//! Overlay 是一整块连续内存，三个平面按偏移排列；显示时按最近邻缩放
//! 转成 RGBA 写入共享帧缓冲。没有窗口系统时（无头运行、测试）使用。

use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;

use super::surface::{DisplaySubsystem, OverlayFormat, OverlaySurface};
use crate::core::types::align_up;
use crate::core::{chroma_extent, OutputError, Rect, Result};
use crate::output::color::ColorMatrixKind;

/// RGBA 帧缓冲
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub frames_presented: u64,
}

impl Framebuffer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            frames_presented: 0,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// 内存 Overlay 表面
#[derive(Debug)]
pub struct MemoryOverlay {
    format: OverlayFormat,
    width: u32,
    height: u32,
    pitches: [usize; 3],
    origins: [usize; 3],
    data: Vec<u8>,
    locked: bool,
    lock_count: u32,
}

impl MemoryOverlay {
    /// 按给定布局分配表面
    ///
    /// `origins` 必须递增并且都落在 `len` 字节之内；布局是否足够容纳画面
    /// 不在这里检查。
    pub fn with_layout(
        width: u32,
        height: u32,
        format: OverlayFormat,
        pitches: [usize; 3],
        origins: [usize; 3],
        len: usize,
    ) -> Result<Self> {
        if origins[0] > origins[1] || origins[1] > origins[2] || origins[2] > len {
            return Err(OutputError::Device(format!("无效的平面偏移 {:?} (总长 {})", origins, len)));
        }

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| OutputError::OutOfMemory)?;
        data.resize(len, 0);

        Ok(Self {
            format,
            width,
            height,
            pitches,
            origins,
            data,
            locked: false,
            lock_count: 0,
        })
    }

    /// 平面紧密排列、行跨度按 `pitch_align` 对齐的标准布局
    pub fn packed(width: u32, height: u32, format: OverlayFormat, pitch_align: usize) -> Result<Self> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (chroma_extent(w), chroma_extent(h));
        let luma_pitch = align_up(w, pitch_align);
        let chroma_pitch = align_up(cw, (pitch_align / 2).max(1));

        let luma_len = luma_pitch.checked_mul(h).ok_or(OutputError::OutOfMemory)?;
        let chroma_len = chroma_pitch.checked_mul(ch).ok_or(OutputError::OutOfMemory)?;
        let origins = [0, luma_len, luma_len + chroma_len];
        let len = luma_len + 2 * chroma_len;

        Self::with_layout(width, height, format, [luma_pitch, chroma_pitch, chroma_pitch], origins, len)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// 累计加锁次数
    pub fn lock_count(&self) -> u32 {
        self.lock_count
    }

    /// 按存储顺序读取第 `index` 个平面
    pub fn plane(&self, index: usize) -> &[u8] {
        let start = self.origins[index];
        let end = self.origins.get(index + 1).copied().unwrap_or(self.data.len());
        &self.data[start..end]
    }

    /// (x, y) 处的 Y、U、V 采样
    fn sample(&self, x: usize, y: usize) -> [u8; 3] {
        let order = self.format.storage_order();
        let mut yuv = [0u8; 3];
        for (component, value) in yuv.iter_mut().enumerate() {
            let index = order[component];
            let (px, py) = if component == 0 { (x, y) } else { (x / 2, y / 2) };
            *value = self
                .plane(index)
                .get(py * self.pitches[index] + px)
                .copied()
                .unwrap_or(0);
        }
        yuv
    }
}

impl OverlaySurface for MemoryOverlay {
    fn format(&self) -> OverlayFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pitches(&self) -> [usize; 3] {
        self.pitches
    }

    fn plane_origins(&self) -> [usize; 3] {
        self.origins
    }

    fn lock(&mut self) -> Result<()> {
        if self.locked {
            return Err(OutputError::Lock("Overlay 已被锁定".to_string()));
        }
        self.locked = true;
        self.lock_count += 1;
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn planes_mut(&mut self) -> [&mut [u8]; 3] {
        let [o0, o1, o2] = self.origins;
        let (head, rest) = self.data.split_at_mut(o1);
        let (second, third) = rest.split_at_mut(o2 - o1);
        [&mut head[o0..], second, third]
    }
}

/// 内存显示子系统
pub struct MemoryDisplay {
    framebuffer: Arc<Mutex<Framebuffer>>,
    pitch_align: usize,
    live_overlays: usize,
}

impl MemoryDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer: Arc::new(Mutex::new(Framebuffer::new(width, height))),
            pitch_align: 8,
            live_overlays: 0,
        }
    }

    /// Overlay 行跨度对齐（和真实硬件一样，跨度常常大于画面宽度）
    pub fn with_pitch_align(mut self, pitch_align: usize) -> Self {
        self.pitch_align = pitch_align.max(1);
        self
    }

    /// 帧缓冲的共享句柄（显示线程之外读取画面）
    pub fn framebuffer(&self) -> Arc<Mutex<Framebuffer>> {
        Arc::clone(&self.framebuffer)
    }

    pub fn live_overlays(&self) -> usize {
        self.live_overlays
    }
}

impl DisplaySubsystem for MemoryDisplay {
    type Surface = MemoryOverlay;

    fn create_overlay(&mut self, width: u32, height: u32, format: OverlayFormat) -> Option<MemoryOverlay> {
        match MemoryOverlay::packed(width, height, format, self.pitch_align) {
            Ok(surface) => {
                self.live_overlays += 1;
                debug!("创建内存 Overlay {}x{}, 跨度 {:?}", width, height, surface.pitches);
                Some(surface)
            }
            Err(e) => {
                warn!("创建内存 Overlay 失败: {}", e);
                None
            }
        }
    }

    fn free_overlay(&mut self, surface: MemoryOverlay) {
        self.live_overlays = self.live_overlays.saturating_sub(1);
        drop(surface);
    }

    fn display_overlay(&mut self, surface: &mut MemoryOverlay, rect: Rect) -> Result<()> {
        if surface.locked {
            return Err(OutputError::Lock("显示时 Overlay 仍处于锁定状态".to_string()));
        }

        let matrix = ColorMatrixKind::for_height(surface.height);
        let mut fb = self.framebuffer.lock();
        let (fb_w, fb_h) = (fb.width as i64, fb.height as i64);

        let x0 = (rect.x as i64).max(0);
        let y0 = (rect.y as i64).max(0);
        let x1 = (rect.x as i64 + rect.w as i64).min(fb_w);
        let y1 = (rect.y as i64 + rect.h as i64).min(fb_h);

        for dy in y0..y1 {
            let sy = ((dy - rect.y as i64) as usize * surface.height as usize) / rect.h as usize;
            for dx in x0..x1 {
                let sx = ((dx - rect.x as i64) as usize * surface.width as usize) / rect.w as usize;
                let [y, u, v] = surface.sample(sx, sy);
                let [r, g, b] = matrix.convert_u8(y, u, v);
                let offset = ((dy * fb_w + dx) * 4) as usize;
                fb.pixels[offset..offset + 4].copy_from_slice(&[r, g, b, 255]);
            }
        }

        fb.frames_presented += 1;
        Ok(())
    }
}
