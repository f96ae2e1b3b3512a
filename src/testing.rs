//! 测试用的软件 GL 设备和可控的显示子系统

use std::cell::Cell;
use std::collections::HashMap;

use crate::convert::FrameConverter;
use crate::core::types::align_up;
use crate::core::{chroma_extent, OutputError, PlanarViewMut, Rect, Result, VideoFrame};
use crate::output::color::ColorMatrix;
use crate::output::gl::GlDevice;
use crate::output::overlay::{DisplaySubsystem, MemoryOverlay, OverlayFormat};

#[derive(Debug, Default)]
struct SoftTexture {
    width: usize,
    height: usize,
    texels: Vec<u8>,
    params_set: bool,
}

impl SoftTexture {
    fn sample(&self, x: usize, y: usize) -> f32 {
        self.texels.get(y * self.width + x).copied().unwrap_or(0) as f32 / 255.0
    }
}

/// 在 CPU 上模拟着色器的 GL 设备，记录所有调用
#[derive(Debug)]
pub struct SoftDevice {
    pub missing_entry_points: Vec<&'static str>,
    pub extensions: Option<String>,
    pub max_texture_size: i32,
    pub max_texture_units: i32,
    pub fail_compile: bool,
    /// 创建这么多纹理之后再创建就失败
    pub fail_texture_after: Option<usize>,

    pub programs_created: usize,
    pub extension_queries: Cell<usize>,
    pub created_textures: usize,
    pub deleted_textures: usize,
    pub full_uploads: usize,
    pub sub_uploads: usize,
    pub swaps: usize,
    pub unpack_history: Vec<(i32, i32)>,
    pub last_coefficients: Option<ColorMatrix>,
    pub viewport: Rect,
    /// 最近一次 draw_quad 的结果，按 viewport 行优先排列
    pub framebuffer: Vec<[f32; 3]>,

    textures: HashMap<u32, SoftTexture>,
    bound: HashMap<u32, u32>,
    active_unit: u32,
    row_length: i32,
    program: Option<u32>,
    next_texture: u32,
}

impl SoftDevice {
    pub const FULL_EXTENSIONS: &'static str =
        "GL_ARB_multitexture GL_ARB_texture_non_power_of_two GL_ARB_fragment_shader GL_EXT_framebuffer_object";

    pub fn new() -> Self {
        Self {
            missing_entry_points: Vec::new(),
            extensions: Some(Self::FULL_EXTENSIONS.to_string()),
            max_texture_size: 4096,
            max_texture_units: 8,
            fail_compile: false,
            fail_texture_after: None,
            programs_created: 0,
            extension_queries: Cell::new(0),
            created_textures: 0,
            deleted_textures: 0,
            full_uploads: 0,
            sub_uploads: 0,
            swaps: 0,
            unpack_history: Vec::new(),
            last_coefficients: None,
            viewport: Rect::default(),
            framebuffer: Vec::new(),
            textures: HashMap::new(),
            bound: HashMap::new(),
            active_unit: 0,
            row_length: 0,
            program: None,
            next_texture: 0,
        }
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn plane_uploads(&self) -> usize {
        self.full_uploads + self.sub_uploads
    }

    pub fn texture_size(&self, texture: u32) -> Option<(usize, usize)> {
        self.textures
            .get(&texture)
            .filter(|t| !t.texels.is_empty())
            .map(|t| (t.width, t.height))
    }

    fn bound_texture(&mut self) -> &mut SoftTexture {
        let name = self.bound.get(&self.active_unit).copied();
        name.and_then(|name| self.textures.get_mut(&name))
            .expect("上传时没有绑定有效纹理")
    }

    /// 按 UNPACK_ROW_LENGTH 从客户端内存取出紧密排列的纹素
    fn unpack(&self, width: i32, height: i32, pixels: &[u8]) -> Vec<u8> {
        let (w, h) = (width as usize, height as usize);
        let row_length = if self.row_length > 0 { self.row_length as usize } else { w };
        let mut texels = Vec::with_capacity(w * h);
        for row in 0..h {
            let start = row * row_length;
            texels.extend_from_slice(&pixels[start..start + w]);
        }
        texels
    }
}

impl GlDevice for SoftDevice {
    type Texture = u32;
    type Program = u32;

    fn has_entry_point(&self, name: &str) -> bool {
        !self.missing_entry_points.iter().any(|missing| *missing == name)
    }

    fn extensions(&self) -> Option<String> {
        self.extension_queries.set(self.extension_queries.get() + 1);
        self.extensions.clone()
    }

    fn max_texture_size(&self) -> i32 {
        self.max_texture_size
    }

    fn max_texture_units(&self) -> i32 {
        self.max_texture_units
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> std::result::Result<u32, String> {
        if self.fail_compile || vertex.is_empty() || fragment.is_empty() {
            return Err("0:1(1): error: syntax error".to_string());
        }
        self.programs_created += 1;
        Ok(self.programs_created as u32)
    }

    fn create_texture(&mut self) -> std::result::Result<u32, String> {
        if self.fail_texture_after.is_some_and(|limit| self.created_textures >= limit) {
            return Err("GL_OUT_OF_MEMORY".to_string());
        }
        let name = self.next_texture;
        self.next_texture += 1;
        self.created_textures += 1;
        self.textures.insert(name, SoftTexture::default());
        Ok(name)
    }

    fn delete_texture(&mut self, texture: u32) {
        if self.textures.remove(&texture).is_some() {
            self.deleted_textures += 1;
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: u32) {
        self.active_unit = unit;
        self.bound.insert(unit, texture);
    }

    fn init_texture_params(&mut self) {
        self.bound_texture().params_set = true;
    }

    fn set_unpack(&mut self, alignment: i32, row_length: i32) {
        self.row_length = row_length;
        self.unpack_history.push((alignment, row_length));
    }

    fn tex_image(&mut self, width: i32, height: i32, pixels: &[u8]) {
        let texels = self.unpack(width, height, pixels);
        let texture = self.bound_texture();
        assert!(texture.params_set, "纹理参数未初始化");
        texture.width = width as usize;
        texture.height = height as usize;
        texture.texels = texels;
        self.full_uploads += 1;
    }

    fn tex_sub_image(&mut self, width: i32, height: i32, pixels: &[u8]) {
        let texels = self.unpack(width, height, pixels);
        let texture = self.bound_texture();
        assert_eq!(
            (texture.width, texture.height),
            (width as usize, height as usize),
            "子图更新超出纹理存储"
        );
        texture.texels = texels;
        self.sub_uploads += 1;
    }

    fn viewport(&mut self, rect: Rect) {
        self.viewport = rect;
    }

    fn clear(&mut self) {
        let len = self.viewport.w as usize * self.viewport.h as usize;
        self.framebuffer.clear();
        self.framebuffer.resize(len, [0.0; 3]);
    }

    fn use_program(&mut self, program: u32) {
        self.program = Some(program);
    }

    fn set_coefficients(&mut self, _program: u32, matrix: &ColorMatrix) {
        self.last_coefficients = Some(*matrix);
    }

    fn draw_quad(&mut self) {
        let (Some(_), Some(matrix)) = (self.program, self.last_coefficients) else {
            return;
        };
        let planes: Vec<&SoftTexture> = (0..3)
            .filter_map(|unit| self.bound.get(&unit).and_then(|name| self.textures.get(name)))
            .collect();
        if planes.len() != 3 {
            return;
        }

        let (vw, vh) = (self.viewport.w as usize, self.viewport.h as usize);
        let mut pixels = Vec::with_capacity(vw * vh);
        for y in 0..vh {
            for x in 0..vw {
                let mut yuv = [0.0; 3];
                for (value, plane) in yuv.iter_mut().zip(&planes) {
                    *value = plane.sample(x * plane.width / vw, y * plane.height / vh);
                }
                pixels.push(matrix.apply(yuv).map(|c| c.clamp(0.0, 1.0)));
            }
        }
        self.framebuffer = pixels;
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }
}

/// 总是失败的转换器
pub struct FailingConverter;

impl FrameConverter for FailingConverter {
    fn convert(&mut self, _src: &VideoFrame, _dst: &mut PlanarViewMut<'_>) -> Result<()> {
        Err(OutputError::Conversion("模拟转换失败".to_string()))
    }
}

/// 可以指定行跨度和平面间距的显示子系统
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// 拒绝分配
    pub refuse: bool,
    /// 按存储顺序的行跨度
    pub pitches: Option<[usize; 3]>,
    /// 平面 0 到平面 1 的距离
    pub plane_gap: Option<usize>,
    pub created: usize,
    pub freed: usize,
    pub displayed: usize,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySubsystem for MockDisplay {
    type Surface = MemoryOverlay;

    fn create_overlay(&mut self, width: u32, height: u32, format: OverlayFormat) -> Option<MemoryOverlay> {
        if self.refuse {
            return None;
        }

        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (chroma_extent(w), chroma_extent(h));
        let pitches = self
            .pitches
            .unwrap_or([align_up(w, 8), align_up(cw, 4), align_up(cw, 4)]);
        let gap = self.plane_gap.unwrap_or(pitches[0] * h);
        let origins = [0, gap, gap + pitches[1] * ch];
        let len = origins[2] + pitches[2] * ch;

        let surface = MemoryOverlay::with_layout(width, height, format, pitches, origins, len).ok()?;
        self.created += 1;
        Some(surface)
    }

    fn free_overlay(&mut self, surface: MemoryOverlay) {
        assert!(!surface.is_locked(), "释放时 Overlay 仍被锁定");
        self.freed += 1;
    }

    fn display_overlay(&mut self, surface: &mut MemoryOverlay, _rect: Rect) -> Result<()> {
        if surface.is_locked() {
            return Err(OutputError::Lock("显示时 Overlay 仍处于锁定状态".to_string()));
        }
        self.displayed += 1;
        Ok(())
    }
}
