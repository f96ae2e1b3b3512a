//! GPU 着色器后端
//!
//! 解码帧在 CPU 侧保留一份 YUV420P 镜像，三个平面分别上传为单通道纹理，
//! 颜色转换在片段着色器里完成。上传是惰性的：`fill`/`blend` 只标记
//! 内容已变化，真正的上传发生在之后的第一次 `display`。

use log::{debug, info, warn};
use std::sync::Arc;

use crate::blend::{AlphaBlend, Compositor};
use crate::convert::FrameConverter;
use crate::core::{
    CapabilityError, OutputConfig, OutputError, PixelFormat, Rect, Result, Subtitle, VideoFrame,
};
use crate::output::color::ColorMatrixKind;
use crate::output::{SurfaceFlags, VideoOutput};

pub mod caps;
pub mod device;
pub mod shader;

pub use caps::{has_extension, GpuCaps};
pub use device::{GlDevice, GlowDevice};

use caps::{CapsCell, REQUIRED_TEXTURE_UNITS};

/// 行跨度能整除的最大对齐（8/4/2/1）
pub fn unpack_alignment(stride: usize) -> i32 {
    match stride {
        s if s % 8 == 0 => 8,
        s if s % 4 == 0 => 4,
        s if s % 2 == 0 => 2,
        _ => 1,
    }
}

/// CPU 侧的镜像帧
///
/// 私有缓冲区在分配纹理时就准备好；未经转换的 fill 只引用调用方的帧，
/// 写之前再把内容拷进私有缓冲区。
#[derive(Debug)]
struct Mirror {
    owned: VideoFrame,
    shared: Option<Arc<VideoFrame>>,
}

impl Mirror {
    fn new(owned: VideoFrame) -> Self {
        Self { owned, shared: None }
    }

    fn frame(&self) -> &VideoFrame {
        self.shared.as_deref().unwrap_or(&self.owned)
    }

    fn share(&mut self, frame: &Arc<VideoFrame>) {
        self.shared = Some(Arc::clone(frame));
    }

    /// 整帧覆盖用：丢掉共享引用，直接返回私有缓冲区
    fn overwrite(&mut self) -> &mut VideoFrame {
        self.shared = None;
        &mut self.owned
    }

    /// 原地修改用：共享帧的内容先拷进私有缓冲区
    fn make_writable(&mut self) -> Result<&mut VideoFrame> {
        if let Some(shared) = &self.shared {
            self.owned.view_mut()?.copy_from(shared)?;
            self.owned.pts = shared.pts;
            self.owned.duration = shared.duration;
            self.shared = None;
        }
        Ok(&mut self.owned)
    }
}

/// GPU 后端的纹理句柄
#[derive(Debug)]
pub struct GlTexture<D: GlDevice> {
    textures: [D::Texture; 3],
    mirror: Mirror,
    width: u32,
    height: u32,
    /// 内容变化后尚未上传
    upload_pending: bool,
    /// 纹理对象已经设置过参数并分配过存储
    initialized: bool,
}

impl<D: GlDevice> GlTexture<D> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_upload_pending(&self) -> bool {
        self.upload_pending
    }

    /// 镜像帧是否还引用着调用方的帧
    pub fn is_shared(&self) -> bool {
        self.mirror.shared.is_some()
    }

    /// 当前镜像帧内容
    pub fn frame(&self) -> &VideoFrame {
        self.mirror.frame()
    }
}

/// GPU 着色器后端
///
/// 一个 GL 上下文对应一个 `GlOutput`；能力协商结果保存在这里，
/// 由该上下文上分配的所有纹理共享。同一个上下文上不要创建第二个
/// `GlOutput`，否则会重复协商并再编译一份着色器程序。
pub struct GlOutput<D: GlDevice> {
    device: D,
    caps: CapsCell<D::Program>,
    compositor: Box<dyn Compositor>,
    mirror_align: usize,
}

impl<D: GlDevice> GlOutput<D> {
    pub fn new(device: D) -> Self {
        Self::with_config(device, &OutputConfig::default())
    }

    pub fn with_config(device: D, config: &OutputConfig) -> Self {
        Self {
            device,
            caps: CapsCell::new(config.retry_gpu_init),
            compositor: Box::new(AlphaBlend),
            mirror_align: config.mirror_align,
        }
    }

    /// 替换字幕混合实现
    pub fn with_compositor(mut self, compositor: Box<dyn Compositor>) -> Self {
        self.compositor = compositor;
        self
    }

    /// 显式触发能力协商（不调用时由第一次分配纹理触发）
    pub fn initialize(&mut self) -> Result<GpuCaps<D::Program>> {
        Ok(self.caps.get_or_negotiate(&mut self.device)?)
    }

    pub fn capabilities(&self) -> Option<&GpuCaps<D::Program>> {
        self.caps.get()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 创建三张纹理；任何一张失败都会删除已经创建的
    fn create_textures(&mut self) -> Result<[D::Texture; 3]> {
        let mut created = Vec::with_capacity(3);
        for _ in 0..3 {
            match self.device.create_texture() {
                Ok(texture) => created.push(texture),
                Err(e) => {
                    for texture in created {
                        self.device.delete_texture(texture);
                    }
                    return Err(OutputError::Device(format!("创建纹理失败: {}", e)));
                }
            }
        }
        created
            .try_into()
            .map_err(|_| OutputError::Device("纹理数量异常".to_string()))
    }

    /// 把镜像帧上传到三张纹理
    fn load_texture(device: &mut D, texture: &mut GlTexture<D>) {
        let frame = texture.mirror.frame();
        for (index, plane) in frame.planes.iter().enumerate().take(3) {
            let (width, height) = PixelFormat::YUV420P.plane_size(index, texture.width, texture.height);
            device.bind_texture(index as u32, texture.textures[index]);
            device.set_unpack(unpack_alignment(plane.stride), plane.stride as i32);
            if texture.initialized {
                device.tex_sub_image(width as i32, height as i32, &plane.data);
            } else {
                device.init_texture_params();
                device.tex_image(width as i32, height as i32, &plane.data);
            }
        }
        debug!(
            "📤 上传纹理 {}x{} ({})",
            texture.width,
            texture.height,
            if texture.initialized { "更新" } else { "首次" }
        );
        texture.initialized = true;
        texture.upload_pending = false;
    }
}

impl<D: GlDevice> VideoOutput for GlOutput<D> {
    type Texture = GlTexture<D>;

    const SURFACE_FLAGS: SurfaceFlags = SurfaceFlags::HW_SURFACE
        .union(SurfaceFlags::ASYNC_BLIT)
        .union(SurfaceFlags::HW_ACCEL)
        .union(SurfaceFlags::OPENGL)
        .union(SurfaceFlags::GL_DOUBLEBUFFER);

    fn alloc_texture(&mut self, width: u32, height: u32) -> Result<GlTexture<D>> {
        if width == 0 || height == 0 {
            return Err(OutputError::InvalidDimensions { width, height });
        }

        let caps = self.caps.get_or_negotiate(&mut self.device)?;
        if width as i64 > caps.max_texture_size as i64 || height as i64 > caps.max_texture_size as i64 {
            warn!("纹理尺寸 {}x{} 超出 GPU 限制 {}", width, height, caps.max_texture_size);
            return Err(CapabilityError::TextureSize {
                width,
                height,
                max: caps.max_texture_size,
            }
            .into());
        }
        if caps.max_texture_units < REQUIRED_TEXTURE_UNITS {
            warn!("纹理单元不足: {}", caps.max_texture_units);
            return Err(CapabilityError::TextureUnits {
                available: caps.max_texture_units,
                required: REQUIRED_TEXTURE_UNITS,
            }
            .into());
        }

        let textures = self.create_textures()?;
        let mirror = match VideoFrame::alloc(PixelFormat::YUV420P, width, height, self.mirror_align) {
            Ok(frame) => frame,
            Err(e) => {
                for texture in textures {
                    self.device.delete_texture(texture);
                }
                return Err(e);
            }
        };

        info!("🆕 分配 GPU 纹理: {}x{}", width, height);

        Ok(GlTexture {
            textures,
            mirror: Mirror::new(mirror),
            width,
            height,
            upload_pending: true,
            initialized: false,
        })
    }

    fn free_texture(&mut self, texture: &mut Option<GlTexture<D>>) {
        if let Some(texture) = texture.take() {
            for name in texture.textures {
                self.device.delete_texture(name);
            }
            debug!("🧹 释放 GPU 纹理: {}x{}", texture.width, texture.height);
        }
    }

    fn fill_texture(
        &mut self,
        texture: &mut GlTexture<D>,
        frame: &Arc<VideoFrame>,
        converter: Option<&mut dyn FrameConverter>,
    ) -> Result<()> {
        match converter {
            Some(converter) => {
                // 转换会覆盖全部内容，共享帧不需要先拷贝
                let mirror = texture.mirror.overwrite();
                converter.convert(frame, &mut mirror.view_mut()?)?;
                mirror.pts = frame.pts;
                mirror.duration = frame.duration;
            }
            None => {
                if !frame.matches(PixelFormat::YUV420P, texture.width, texture.height) {
                    return Err(OutputError::FormatMismatch(format!(
                        "未提供转换器时需要 YUV420P {}x{}, 实际为 {:?} {}x{}",
                        texture.width, texture.height, frame.format, frame.width, frame.height
                    )));
                }
                frame.validate_planes()?;
                texture.mirror.share(frame);
            }
        }

        texture.upload_pending = true;
        Ok(())
    }

    fn display_texture(&mut self, texture: &mut GlTexture<D>, rect: Rect) -> Result<()> {
        let program = self
            .caps
            .get()
            .map(|caps| caps.program)
            .ok_or_else(|| OutputError::Device("GPU 尚未完成初始化".to_string()))?;
        let matrix = ColorMatrixKind::for_height(texture.height);

        self.device.viewport(rect);

        if texture.upload_pending {
            Self::load_texture(&mut self.device, texture);
        }

        for (unit, name) in texture.textures.iter().enumerate() {
            self.device.bind_texture(unit as u32, *name);
        }

        self.device.use_program(program);
        self.device.set_coefficients(program, matrix.matrix());
        debug!("🎨 显示 {}x{} -> {:?}, 矩阵 {:?}", texture.width, texture.height, rect, matrix);

        self.device.clear();
        self.device.draw_quad();
        self.device.swap_buffers();
        Ok(())
    }

    fn blend_texture(&mut self, texture: &mut GlTexture<D>, subtitle: &Subtitle) -> Result<()> {
        let mirror = texture.mirror.make_writable()?;
        let mut picture = mirror.view_mut()?;
        for rect in &subtitle.rects {
            self.compositor.blend_rect(&mut picture, rect);
        }
        texture.upload_pending = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SubtitleRect;
    use crate::output::color::{BT601_TV2FULL, BT709_TV2FULL};
    use crate::testing::{FailingConverter, SoftDevice};

    fn gray_frame(width: u32, height: u32) -> Arc<VideoFrame> {
        Arc::new(VideoFrame::solid_yuv(width, height, 128, 128, 128).unwrap())
    }

    fn opaque_subtitle(value: u8) -> Subtitle {
        Subtitle {
            pts: 0,
            end_pts: 1000,
            rects: vec![SubtitleRect {
                x: 0,
                y: 0,
                w: 4,
                h: 4,
                pixels: vec![0; 16],
                linesize: 4,
                palette: vec![[value, 128, 128, 255]],
            }],
        }
    }

    #[test]
    fn test_unpack_alignment() {
        assert_eq!(unpack_alignment(352), 8);
        assert_eq!(unpack_alignment(180), 4);
        assert_eq!(unpack_alignment(178), 2);
        assert_eq!(unpack_alignment(177), 1);
    }

    #[test]
    fn test_alloc_free_releases_textures() {
        let mut output = GlOutput::new(SoftDevice::new());
        for (w, h) in [(352, 288), (1, 1), (1920, 1080), (4096, 4096)] {
            let mut texture = Some(output.alloc_texture(w, h).unwrap());
            assert_eq!(output.device().live_textures(), 3);
            output.free_texture(&mut texture);
            assert!(texture.is_none());
            assert_eq!(output.device().live_textures(), 0);
        }
    }

    #[test]
    fn test_free_is_idempotent() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = Some(output.alloc_texture(64, 64).unwrap());
        output.free_texture(&mut texture);
        output.free_texture(&mut texture);
        assert_eq!(output.device().deleted_textures, 3);
        assert_eq!(output.device().live_textures(), 0);
    }

    #[test]
    fn test_alloc_rejects_zero_size() {
        let mut output = GlOutput::new(SoftDevice::new());
        assert!(matches!(
            output.alloc_texture(0, 288),
            Err(OutputError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_alloc_rejects_oversized() {
        let mut output = GlOutput::new(SoftDevice::new());
        let err = output.alloc_texture(4097, 16).unwrap_err();
        assert!(matches!(
            err,
            OutputError::Capability(CapabilityError::TextureSize { max: 4096, .. })
        ));
        assert!(output.alloc_texture(16, 4097).is_err());
        assert_eq!(output.device().live_textures(), 0);
    }

    #[test]
    fn test_alloc_requires_three_texture_units() {
        let mut device = SoftDevice::new();
        device.max_texture_units = 2;
        let mut output = GlOutput::new(device);
        assert!(matches!(
            output.alloc_texture(64, 64),
            Err(OutputError::Capability(CapabilityError::TextureUnits { available: 2, required: 3 }))
        ));
        assert_eq!(output.device().live_textures(), 0);
    }

    #[test]
    fn test_failed_negotiation_is_cached() {
        let mut device = SoftDevice::new();
        device.missing_entry_points.push("glCompileShader");
        let mut output = GlOutput::new(device);
        assert!(output.alloc_texture(64, 64).is_err());

        output.device_mut().missing_entry_points.clear();
        assert!(output.alloc_texture(64, 64).is_err());
        assert_eq!(output.device().programs_created, 0);
        assert!(output.capabilities().is_none());
    }

    #[test]
    fn test_failed_negotiation_retried_when_configured() {
        let mut device = SoftDevice::new();
        device.missing_entry_points.push("glCompileShader");
        let config = OutputConfig {
            retry_gpu_init: true,
            ..OutputConfig::default()
        };
        let mut output = GlOutput::with_config(device, &config);
        assert!(output.alloc_texture(64, 64).is_err());

        output.device_mut().missing_entry_points.clear();
        let mut texture = Some(output.alloc_texture(64, 64).unwrap());
        output.free_texture(&mut texture);
    }

    #[test]
    fn test_initialized_once_across_textures() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut a = Some(output.alloc_texture(64, 64).unwrap());
        let mut b = Some(output.alloc_texture(128, 32).unwrap());
        assert_eq!(output.device().programs_created, 1);
        assert_eq!(output.device().extension_queries.get(), 1);
        output.free_texture(&mut a);
        output.free_texture(&mut b);
    }

    #[test]
    fn test_partial_texture_creation_is_rolled_back() {
        let mut device = SoftDevice::new();
        device.fail_texture_after = Some(2);
        let mut output = GlOutput::new(device);
        assert!(matches!(output.alloc_texture(64, 64), Err(OutputError::Device(_))));
        assert_eq!(output.device().live_textures(), 0);
        assert_eq!(output.device().deleted_textures, 2);
    }

    #[test]
    fn test_upload_only_once_per_change() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(352, 288).unwrap();
        let rect = Rect::new(0, 0, 352, 288);

        output.fill_texture(&mut texture, &gray_frame(352, 288), None).unwrap();
        assert!(texture.is_upload_pending());
        assert_eq!(output.device().plane_uploads(), 0);

        output.display_texture(&mut texture, rect).unwrap();
        output.display_texture(&mut texture, rect).unwrap();
        output.display_texture(&mut texture, rect).unwrap();
        assert_eq!(output.device().plane_uploads(), 3);
        assert_eq!(output.device().swaps, 3);

        output.blend_texture(&mut texture, &opaque_subtitle(235)).unwrap();
        output.display_texture(&mut texture, rect).unwrap();
        assert_eq!(output.device().plane_uploads(), 6);

        // 两次改动之间没有显示，只上传一次
        output.fill_texture(&mut texture, &gray_frame(352, 288), None).unwrap();
        output.blend_texture(&mut texture, &opaque_subtitle(235)).unwrap();
        output.display_texture(&mut texture, rect).unwrap();
        output.display_texture(&mut texture, rect).unwrap();
        assert_eq!(output.device().plane_uploads(), 9);

        let mut texture = Some(texture);
        output.free_texture(&mut texture);
    }

    #[test]
    fn test_first_upload_specifies_then_updates() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(100, 50).unwrap();
        let rect = Rect::new(0, 0, 100, 50);

        output.fill_texture(&mut texture, &gray_frame(100, 50), None).unwrap();
        output.display_texture(&mut texture, rect).unwrap();
        output.fill_texture(&mut texture, &gray_frame(100, 50), None).unwrap();
        output.display_texture(&mut texture, rect).unwrap();

        let device = output.device();
        assert_eq!(device.full_uploads, 3);
        assert_eq!(device.sub_uploads, 3);
        assert_eq!(device.texture_size(0), Some((100, 50)));
        assert_eq!(device.texture_size(1), Some((50, 25)));
        // solid_yuv 的行跨度按 16 对齐：112 和 64
        assert_eq!(device.unpack_history[..3], [(8, 112), (8, 64), (8, 64)]);
    }

    #[test]
    fn test_matrix_selection_boundaries() {
        let mut output = GlOutput::new(SoftDevice::new());
        for (height, expected) in [(576, &BT601_TV2FULL), (577, &BT709_TV2FULL)] {
            let mut texture = output.alloc_texture(64, height).unwrap();
            output.fill_texture(&mut texture, &gray_frame(64, height), None).unwrap();
            output.display_texture(&mut texture, Rect::new(0, 0, 8, 8)).unwrap();
            assert_eq!(output.device().last_coefficients.as_ref(), Some(expected));
            output.free_texture(&mut Some(texture));
        }
    }

    #[test]
    fn test_end_to_end_sd_gray() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(352, 288).unwrap();
        output.fill_texture(&mut texture, &gray_frame(352, 288), None).unwrap();
        output.display_texture(&mut texture, Rect::new(0, 0, 352, 288)).unwrap();

        let device = output.device();
        assert_eq!(device.last_coefficients.as_ref(), Some(&BT601_TV2FULL));
        assert_eq!(device.framebuffer.len(), 352 * 288);
        for rgb in &device.framebuffer {
            for c in rgb {
                assert!((c - 0.5114).abs() < 0.01, "通道值 {} 偏离中灰", c);
            }
        }
    }

    #[test]
    fn test_end_to_end_hd_gray() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(1280, 720).unwrap();
        output.fill_texture(&mut texture, &gray_frame(1280, 720), None).unwrap();
        output.display_texture(&mut texture, Rect::new(0, 0, 320, 180)).unwrap();

        let device = output.device();
        assert_eq!(device.last_coefficients.as_ref(), Some(&BT709_TV2FULL));
        assert_eq!(device.framebuffer.len(), 320 * 180);
        for rgb in &device.framebuffer {
            for c in rgb {
                assert!((c - 0.5114).abs() < 0.01, "通道值 {} 偏离中灰", c);
            }
        }
    }

    #[test]
    fn test_end_to_end_matrices_differ_on_color() {
        let frame = Arc::new(VideoFrame::solid_yuv(64, 8, 81, 90, 240).unwrap());
        let mut results = Vec::new();
        for height in [576, 720] {
            let mut output = GlOutput::new(SoftDevice::new());
            let mut texture = output.alloc_texture(64, height).unwrap();
            let mut scaler = crate::convert::SoftScaler;
            output.fill_texture(&mut texture, &frame, Some(&mut scaler)).unwrap();
            output.display_texture(&mut texture, Rect::new(0, 0, 4, 4)).unwrap();
            results.push(output.device().framebuffer[0]);
        }
        assert!((results[0][1] - results[1][1]).abs() > 0.05);
    }

    #[test]
    fn test_fill_without_converter_shares_frame() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(16, 16).unwrap();
        let frame = gray_frame(16, 16);
        output.fill_texture(&mut texture, &frame, None).unwrap();
        assert!(texture.is_shared());
        assert_eq!(Arc::strong_count(&frame), 2);
        output.free_texture(&mut Some(texture));
        assert_eq!(Arc::strong_count(&frame), 1);
    }

    #[test]
    fn test_fill_without_converter_rejects_mismatch() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(16, 16).unwrap();
        let err = output.fill_texture(&mut texture, &gray_frame(32, 16), None).unwrap_err();
        assert!(matches!(err, OutputError::FormatMismatch(_)));
        assert!(!texture.is_shared());
    }

    #[test]
    fn test_fill_without_converter_rejects_malformed_planes() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(16, 16).unwrap();

        let mut truncated = VideoFrame::solid_yuv(16, 16, 128, 128, 128).unwrap();
        truncated.planes[0].data.truncate(16);
        let mut narrow = VideoFrame::solid_yuv(16, 16, 128, 128, 128).unwrap();
        narrow.planes[0].stride = 8;
        let mut missing = VideoFrame::solid_yuv(16, 16, 128, 128, 128).unwrap();
        missing.planes.pop();

        for frame in [truncated, narrow, missing] {
            let frame = Arc::new(frame);
            assert!(matches!(
                output.fill_texture(&mut texture, &frame, None),
                Err(OutputError::FormatMismatch(_))
            ));
            assert!(!texture.is_shared());
            assert_eq!(Arc::strong_count(&frame), 1);
        }

        // 私有缓冲区仍然完整，显示时三个平面都会上传
        output.display_texture(&mut texture, Rect::new(0, 0, 16, 16)).unwrap();
        assert_eq!(output.device().plane_uploads(), 3);
        output.free_texture(&mut Some(texture));
    }

    #[test]
    fn test_blend_copies_shared_frame_first() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(16, 16).unwrap();
        let frame = gray_frame(16, 16);
        output.fill_texture(&mut texture, &frame, None).unwrap();
        output.blend_texture(&mut texture, &opaque_subtitle(235)).unwrap();

        assert!(!texture.is_shared());
        assert_eq!(Arc::strong_count(&frame), 1);
        assert_eq!(frame.planes[0].data[0], 128);
        assert_eq!(texture.frame().planes[0].data[0], 235);
        assert_eq!(texture.frame().planes[0].data[4], 128);
    }

    #[test]
    fn test_fill_with_converter_after_shared() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(16, 16).unwrap();
        let frame = gray_frame(16, 16);
        output.fill_texture(&mut texture, &frame, None).unwrap();

        let source = Arc::new(VideoFrame::solid_yuv(32, 32, 50, 60, 70).unwrap());
        let mut scaler = crate::convert::SoftScaler;
        output.fill_texture(&mut texture, &source, Some(&mut scaler)).unwrap();
        assert!(!texture.is_shared());
        assert_eq!(Arc::strong_count(&frame), 1);
        assert_eq!(frame.planes[0].data[0], 128);
        assert_eq!(texture.frame().planes[0].data[0], 50);
        assert_eq!(texture.frame().planes[2].data[0], 70);
    }

    #[test]
    fn test_converter_error_is_propagated() {
        let mut output = GlOutput::new(SoftDevice::new());
        let mut texture = output.alloc_texture(16, 16).unwrap();
        let err = output
            .fill_texture(&mut texture, &gray_frame(16, 16), Some(&mut FailingConverter))
            .unwrap_err();
        assert!(matches!(err, OutputError::Conversion(_)));
    }

    #[test]
    fn test_display_before_init_fails() {
        let mut device_output = GlOutput::new(SoftDevice::new());
        let mut other = GlOutput::new(SoftDevice::new());
        let mut texture = other.alloc_texture(8, 8).unwrap();
        assert!(matches!(
            device_output.display_texture(&mut texture, Rect::new(0, 0, 8, 8)),
            Err(OutputError::Device(_))
        ));
        other.free_texture(&mut Some(texture));
    }
}
