//! 像素格式 / 分辨率转换上下文
//!
//! 后端在 `fill_texture` 中驱动转换器，把解码器输出写进自己的 YUV420P
//! 缓冲区（GPU 镜像帧或者 Overlay 显存）。

use crate::core::types::plane_fits;
use crate::core::{OutputError, PixelFormat, PlanarViewMut, Result, VideoFrame};

/// 转换上下文
pub trait FrameConverter {
    /// 把 `src` 转换并缩放到 `dst` 的尺寸，写入 `dst` 的三个平面
    fn convert(&mut self, src: &VideoFrame, dst: &mut PlanarViewMut<'_>) -> Result<()>;
}

/// 纯 CPU 的最近邻缩放转换器
///
/// 支持 YUV420P 和 NV12 输入，输出 YUV420P。没有 FFmpeg 时作为默认转换器。
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftScaler;

impl SoftScaler {
    fn check_source(src: &VideoFrame) -> Result<()> {
        src.validate_planes().map_err(|e| {
            OutputError::Conversion(format!("源帧 {:?} {}x{} 不可用: {}", src.format, src.width, src.height, e))
        })
    }
}

impl FrameConverter for SoftScaler {
    fn convert(&mut self, src: &VideoFrame, dst: &mut PlanarViewMut<'_>) -> Result<()> {
        if !matches!(src.format, PixelFormat::YUV420P | PixelFormat::NV12) {
            return Err(OutputError::Conversion(format!(
                "SoftScaler 不支持 {:?} 输入",
                src.format
            )));
        }
        Self::check_source(src)?;

        for index in 0..3 {
            let (dst_w, dst_h) = PixelFormat::YUV420P.plane_size(index, dst.width, dst.height);
            let (src_w, src_h) = PixelFormat::YUV420P.plane_size(index, src.width, src.height);
            let dst_stride = dst.strides[index];
            if !plane_fits(dst.planes[index].len(), dst_stride, dst_w, dst_h) {
                return Err(OutputError::Conversion(format!("目标平面 {} 缓冲区过小", index)));
            }

            // NV12 的 U/V 交错存放在第 1 个平面
            let (plane, step, offset) = match (src.format, index) {
                (PixelFormat::NV12, 0) => (&src.planes[0], 1, 0),
                (PixelFormat::NV12, _) => (&src.planes[1], 2, index - 1),
                _ => (&src.planes[index], 1, 0),
            };

            for y in 0..dst_h {
                let sy = y * src_h / dst_h;
                let src_row = &plane.data[sy * plane.stride..];
                let dst_row = &mut dst.planes[index][y * dst_stride..y * dst_stride + dst_w];
                for (x, px) in dst_row.iter_mut().enumerate() {
                    let sx = x * src_w / dst_w;
                    *px = src_row[sx * step + offset];
                }
            }
        }

        Ok(())
    }
}

#[cfg(feature = "ffmpeg")]
pub use self::sws::SwsConverter;

#[cfg(feature = "ffmpeg")]
mod sws {
    use super::FrameConverter;
    use crate::core::{OutputError, PixelFormat, PlanarViewMut, Plane, Result, VideoFrame};
    use ffmpeg_next::software::scaling;
    use ffmpeg_next::util::{format::Pixel, frame};
    use log::debug;

    impl From<PixelFormat> for Pixel {
        fn from(format: PixelFormat) -> Self {
            match format {
                PixelFormat::RGBA => Pixel::RGBA,
                PixelFormat::RGB => Pixel::RGB24,
                PixelFormat::YUV420P => Pixel::YUV420P,
                PixelFormat::NV12 => Pixel::NV12,
            }
        }
    }

    impl TryFrom<Pixel> for PixelFormat {
        type Error = OutputError;

        fn try_from(format: Pixel) -> Result<Self> {
            match format {
                Pixel::RGBA => Ok(PixelFormat::RGBA),
                Pixel::RGB24 => Ok(PixelFormat::RGB),
                Pixel::YUV420P => Ok(PixelFormat::YUV420P),
                Pixel::NV12 => Ok(PixelFormat::NV12),
                other => Err(OutputError::FormatMismatch(format!("不支持的像素格式: {:?}", other))),
            }
        }
    }

    impl VideoFrame {
        /// 从 FFmpeg 解码帧拷贝出一帧
        pub fn from_ffmpeg(src: &frame::Video) -> Result<Self> {
            let format = PixelFormat::try_from(src.format())?;
            let planes = (0..format.plane_count())
                .map(|i| Plane {
                    data: src.data(i).to_vec(),
                    stride: src.stride(i),
                })
                .collect();

            Ok(Self {
                pts: src.timestamp().unwrap_or(0),
                duration: 0,
                width: src.width(),
                height: src.height(),
                format,
                planes,
            })
        }

        /// 拷贝成 FFmpeg 帧（喂给 SwsContext）
        pub fn to_ffmpeg(&self) -> Result<frame::Video> {
            let mut out = frame::Video::new(self.format.into(), self.width, self.height);
            for (i, plane) in self.planes.iter().enumerate().take(self.format.plane_count()) {
                let (row_bytes, rows) = self.format.plane_size(i, self.width, self.height);
                let dst_stride = out.stride(i);
                let dst = out.data_mut(i);
                for row in 0..rows {
                    let s = row * plane.stride;
                    let d = row * dst_stride;
                    if s + row_bytes > plane.data.len() || d + row_bytes > dst.len() {
                        return Err(OutputError::Conversion(format!("平面 {} 数据不完整", i)));
                    }
                    dst[d..d + row_bytes].copy_from_slice(&plane.data[s..s + row_bytes]);
                }
            }
            Ok(out)
        }
    }

    /// 基于 FFmpeg SwsContext 的转换器，输出固定为 YUV420P
    pub struct SwsConverter {
        context: scaling::Context,
        output: frame::Video,
    }

    impl SwsConverter {
        pub fn new(
            src_format: Pixel,
            src_width: u32,
            src_height: u32,
            dst_width: u32,
            dst_height: u32,
        ) -> Result<Self> {
            debug!(
                "创建 SwsContext: {:?} {}x{} -> YUV420P {}x{}",
                src_format, src_width, src_height, dst_width, dst_height
            );
            let context = scaling::Context::get(
                src_format,
                src_width,
                src_height,
                Pixel::YUV420P,
                dst_width,
                dst_height,
                scaling::Flags::BICUBIC,
            )?;
            Ok(Self {
                context,
                output: frame::Video::empty(),
            })
        }

        /// 直接转换 FFmpeg 帧，省掉一次导入拷贝
        pub fn run(&mut self, src: &frame::Video, dst: &mut PlanarViewMut<'_>) -> Result<()> {
            self.context.run(src, &mut self.output)?;

            for i in 0..3 {
                let (row_bytes, rows) = PixelFormat::YUV420P.plane_size(i, dst.width, dst.height);
                let src_stride = self.output.stride(i);
                let src_data = self.output.data(i);
                let dst_stride = dst.strides[i];
                for row in 0..rows {
                    let s = row * src_stride;
                    let d = row * dst_stride;
                    if s + row_bytes > src_data.len() || d + row_bytes > dst.planes[i].len() {
                        return Err(OutputError::Conversion(format!(
                            "SwsContext 输出尺寸与目标不一致 (平面 {})",
                            i
                        )));
                    }
                    dst.planes[i][d..d + row_bytes].copy_from_slice(&src_data[s..s + row_bytes]);
                }
            }
            Ok(())
        }
    }

    impl FrameConverter for SwsConverter {
        fn convert(&mut self, src: &VideoFrame, dst: &mut PlanarViewMut<'_>) -> Result<()> {
            let input = src.to_ffmpeg()?;
            self.run(&input, dst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Plane;

    #[test]
    fn test_same_size_copy() {
        let src = VideoFrame::solid_yuv(8, 4, 1, 2, 3).unwrap();
        let mut dst = VideoFrame::alloc(PixelFormat::YUV420P, 8, 4, 32).unwrap();
        SoftScaler.convert(&src, &mut dst.view_mut().unwrap()).unwrap();
        assert_eq!(&dst.planes[0].data[..8], &[1; 8]);
        assert_eq!(&dst.planes[1].data[32..36], &[2; 4]);
        assert_eq!(&dst.planes[2].data[..4], &[3; 4]);
    }

    #[test]
    fn test_nearest_upscale() {
        let mut src = VideoFrame::alloc(PixelFormat::YUV420P, 2, 2, 1).unwrap();
        src.planes[0].data.copy_from_slice(&[10, 20, 30, 40]);
        let mut dst = VideoFrame::alloc(PixelFormat::YUV420P, 4, 4, 1).unwrap();
        SoftScaler.convert(&src, &mut dst.view_mut().unwrap()).unwrap();
        assert_eq!(&dst.planes[0].data[..4], &[10, 10, 20, 20]);
        assert_eq!(&dst.planes[0].data[12..16], &[30, 30, 40, 40]);
    }

    #[test]
    fn test_nv12_deinterleave() {
        let src = VideoFrame {
            pts: 0,
            duration: 0,
            width: 4,
            height: 2,
            format: PixelFormat::NV12,
            planes: vec![
                Plane { data: vec![16; 8], stride: 4 },
                Plane { data: vec![90, 240, 91, 241], stride: 4 },
            ],
        };
        let mut dst = VideoFrame::alloc(PixelFormat::YUV420P, 4, 2, 1).unwrap();
        SoftScaler.convert(&src, &mut dst.view_mut().unwrap()).unwrap();
        assert_eq!(dst.planes[1].data, vec![90, 91]);
        assert_eq!(dst.planes[2].data, vec![240, 241]);
    }

    #[test]
    fn test_rejects_rgba() {
        let src = VideoFrame::alloc(PixelFormat::RGBA, 2, 2, 1).unwrap();
        let mut dst = VideoFrame::alloc(PixelFormat::YUV420P, 2, 2, 1).unwrap();
        assert!(matches!(
            SoftScaler.convert(&src, &mut dst.view_mut().unwrap()),
            Err(OutputError::Conversion(_))
        ));
    }
}
