use serde::{Deserialize, Serialize};

use super::error::{OutputError, Result};

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    RGBA,
    RGB,
    YUV420P,
    NV12,
}

impl PixelFormat {
    /// 平面数量
    pub fn plane_count(&self) -> usize {
        match self {
            PixelFormat::RGBA | PixelFormat::RGB => 1,
            PixelFormat::YUV420P => 3,
            PixelFormat::NV12 => 2,
        }
    }

    /// 第 `plane` 个平面每行的有效字节数和行数
    pub fn plane_size(&self, plane: usize, width: u32, height: u32) -> (usize, usize) {
        let (w, h) = (width as usize, height as usize);
        match self {
            PixelFormat::RGBA => (w * 4, h),
            PixelFormat::RGB => (w * 3, h),
            PixelFormat::YUV420P if plane == 0 => (w, h),
            PixelFormat::YUV420P => (chroma_extent(w), chroma_extent(h)),
            PixelFormat::NV12 if plane == 0 => (w, h),
            PixelFormat::NV12 => (chroma_extent(w) * 2, chroma_extent(h)),
        }
    }
}

/// 4:2:0 色度平面的尺寸（向上取整）
pub fn chroma_extent(luma: usize) -> usize {
    luma.div_ceil(2)
}

pub(crate) fn align_up(value: usize, align: usize) -> usize {
    let align = align.max(1);
    value.div_ceil(align) * align
}

/// 平面数据在 `len` 字节的缓冲区里放得下 `rows` 行、每行 `row_bytes` 字节
pub(crate) fn plane_fits(len: usize, stride: usize, row_bytes: usize, rows: usize) -> bool {
    if rows == 0 {
        return true;
    }
    stride >= row_bytes
        && (rows - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(row_bytes))
            .is_some_and(|needed| needed <= len)
}

/// 目标矩形（窗口坐标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// 单个图像平面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub stride: usize,     // 行跨度（字节）
}

/// 视频帧数据（平面布局）
///
/// 解码器输出通过 `Arc<VideoFrame>` 共享，后端可以直接引用而不拷贝。
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub pts: i64,           // 显示时间戳（毫秒）
    pub duration: i64,      // 帧持续时间（毫秒）
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub planes: Vec<Plane>,
}

impl VideoFrame {
    /// 分配一帧，行跨度按 `align` 对齐，内容清零
    ///
    /// 内存不足时返回 [`OutputError::OutOfMemory`] 而不是直接中止。
    pub fn alloc(format: PixelFormat, width: u32, height: u32, align: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OutputError::InvalidDimensions { width, height });
        }

        let mut planes = Vec::with_capacity(format.plane_count());
        for index in 0..format.plane_count() {
            let (row_bytes, rows) = format.plane_size(index, width, height);
            let stride = align_up(row_bytes, align);
            let len = stride.checked_mul(rows).ok_or(OutputError::OutOfMemory)?;

            let mut data = Vec::new();
            data.try_reserve_exact(len).map_err(|_| OutputError::OutOfMemory)?;
            data.resize(len, 0);
            planes.push(Plane { data, stride });
        }

        Ok(Self {
            pts: 0,
            duration: 0,
            width,
            height,
            format,
            planes,
        })
    }

    /// 生成一帧纯色 YUV420P 图像（测试图案、占位帧）
    pub fn solid_yuv(width: u32, height: u32, y: u8, u: u8, v: u8) -> Result<Self> {
        let mut frame = Self::alloc(PixelFormat::YUV420P, width, height, 16)?;
        for (plane, value) in frame.planes.iter_mut().zip([y, u, v]) {
            plane.data.fill(value);
        }
        Ok(frame)
    }

    /// 格式和尺寸是否与期望一致
    pub fn matches(&self, format: PixelFormat, width: u32, height: u32) -> bool {
        self.format == format && self.width == width && self.height == height
    }

    /// 检查平面数量和每个平面的长度、行跨度是否与格式和尺寸相符
    pub fn validate_planes(&self) -> Result<()> {
        if self.planes.len() != self.format.plane_count() {
            return Err(OutputError::FormatMismatch(format!(
                "{:?} 帧应有 {} 个平面, 实际 {} 个",
                self.format,
                self.format.plane_count(),
                self.planes.len()
            )));
        }

        for (index, plane) in self.planes.iter().enumerate() {
            let (row_bytes, rows) = self.format.plane_size(index, self.width, self.height);
            if !plane_fits(plane.data.len(), plane.stride, row_bytes, rows) {
                return Err(OutputError::FormatMismatch(format!(
                    "平面 {} 数据不完整: 长度 {}, 行跨度 {}, 需要 {} 行 x {} 字节",
                    index,
                    plane.data.len(),
                    plane.stride,
                    rows,
                    row_bytes
                )));
            }
        }
        Ok(())
    }

    /// 获取可写的 Y/U/V 平面视图（仅 YUV420P）
    pub fn view_mut(&mut self) -> Result<PlanarViewMut<'_>> {
        if self.format != PixelFormat::YUV420P {
            return Err(OutputError::FormatMismatch(format!(
                "需要 YUV420P 平面视图, 实际为 {:?}",
                self.format
            )));
        }

        let (width, height) = (self.width, self.height);
        match self.planes.as_mut_slice() {
            [y, u, v] => Ok(PlanarViewMut {
                width,
                height,
                strides: [y.stride, u.stride, v.stride],
                planes: [&mut y.data[..], &mut u.data[..], &mut v.data[..]],
            }),
            planes => Err(OutputError::FormatMismatch(format!(
                "YUV420P 帧应有 3 个平面, 实际 {} 个",
                planes.len()
            ))),
        }
    }
}

/// 可写的 YUV 4:2:0 平面视图，平面顺序固定为 Y、U、V
///
/// 缓冲区可能属于 GPU 镜像帧，也可能是加锁后的 Overlay 显存。
pub struct PlanarViewMut<'a> {
    pub width: u32,
    pub height: u32,
    pub planes: [&'a mut [u8]; 3],
    pub strides: [usize; 3],
}

impl PlanarViewMut<'_> {
    /// 从格式兼容的帧逐行拷贝（不做任何转换）
    pub fn copy_from(&mut self, src: &VideoFrame) -> Result<()> {
        if !src.matches(PixelFormat::YUV420P, self.width, self.height) {
            return Err(OutputError::FormatMismatch(format!(
                "无法直接拷贝 {:?} {}x{} 到 YUV420P {}x{}",
                src.format, src.width, src.height, self.width, self.height
            )));
        }
        src.validate_planes()?;

        for (index, (dst, src_plane)) in self.planes.iter_mut().zip(&src.planes).enumerate() {
            let (row_bytes, rows) = PixelFormat::YUV420P.plane_size(index, self.width, self.height);
            let dst_stride = self.strides[index];
            if !plane_fits(dst.len(), dst_stride, row_bytes, rows) {
                return Err(OutputError::FormatMismatch(format!("平面 {} 缓冲区过小", index)));
            }

            for row in 0..rows {
                let d = row * dst_stride;
                let s = row * src_plane.stride;
                dst[d..d + row_bytes].copy_from_slice(&src_plane.data[s..s + row_bytes]);
            }
        }

        Ok(())
    }
}

/// 位图字幕矩形（调色板索引图像）
#[derive(Debug, Clone, Default)]
pub struct SubtitleRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub pixels: Vec<u8>,        // 调色板索引
    pub linesize: usize,
    pub palette: Vec<[u8; 4]>,  // 已转换为 Y, U, V, A
}

impl SubtitleRect {
    /// 矩形内 (rx, ry) 处的 YUVA 颜色
    pub fn sample(&self, rx: usize, ry: usize) -> Option<[u8; 4]> {
        let index = *self.pixels.get(ry * self.linesize + rx)?;
        self.palette.get(index as usize).copied()
    }
}

/// 字幕（按顺序叠加的一组矩形）
#[derive(Debug, Clone, Default)]
pub struct Subtitle {
    pub pts: i64,           // 开始显示时间戳（毫秒）
    pub end_pts: i64,       // 结束显示时间戳（毫秒）
    pub rects: Vec<SubtitleRect>,
}
