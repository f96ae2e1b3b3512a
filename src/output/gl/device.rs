use glow::HasContext;
use log::{debug, info};
use std::collections::HashSet;
use std::ffi::c_void;
use std::fmt;

use super::caps::REQUIRED_ENTRY_POINTS;
use super::shader::{Vertex, COEFFICIENT_UNIFORM, QUAD_VERTICES, SAMPLER_NAMES};
use crate::core::Rect;
use crate::output::color::ColorMatrix;

/// GPU 后端用到的 GL 操作
///
/// 纹理上传总是作用于最近一次 `bind_texture` 绑定的纹理，纹理格式为单通道亮度。
pub trait GlDevice {
    type Texture: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;

    /// 入口函数能否解析
    fn has_entry_point(&self, name: &str) -> bool;
    /// 空格分隔的扩展列表
    fn extensions(&self) -> Option<String>;
    fn max_texture_size(&self) -> i32;
    fn max_texture_units(&self) -> i32;
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<Self::Program, String>;

    fn create_texture(&mut self) -> Result<Self::Texture, String>;
    fn delete_texture(&mut self, texture: Self::Texture);
    fn bind_texture(&mut self, unit: u32, texture: Self::Texture);
    /// 线性过滤 + 边缘钳制
    fn init_texture_params(&mut self);
    fn set_unpack(&mut self, alignment: i32, row_length: i32);
    fn tex_image(&mut self, width: i32, height: i32, pixels: &[u8]);
    fn tex_sub_image(&mut self, width: i32, height: i32, pixels: &[u8]);

    fn viewport(&mut self, rect: Rect);
    fn clear(&mut self);
    fn use_program(&mut self, program: Self::Program);
    fn set_coefficients(&mut self, program: Self::Program, matrix: &ColorMatrix);
    fn draw_quad(&mut self);
    fn swap_buffers(&mut self);
}

/// 基于 glow 的 OpenGL 实现
pub struct GlowDevice {
    gl: glow::Context,
    entry_points: HashSet<&'static str>,
    quad: Option<glow::NativeBuffer>,
    swap: Box<dyn FnMut()>,
}

impl GlowDevice {
    /// 用窗口系统的 `get_proc_address` 创建设备
    ///
    /// `swap` 在每次显示结束时调用（交换前后缓冲）。
    ///
    /// # Safety
    ///
    /// 调用方必须保证 GL 上下文在当前线程上是 current 的，
    /// 并且之后所有操作都在这个线程上进行。
    pub unsafe fn from_loader_function<F>(mut loader: F, swap: impl FnMut() + 'static) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let entry_points = REQUIRED_ENTRY_POINTS
            .iter()
            .copied()
            .filter(|name| !loader(name).is_null())
            .collect();
        let gl = glow::Context::from_loader_function(loader);

        info!("GL 版本: {:?}", gl.version());

        Self {
            gl,
            entry_points,
            quad: None,
            swap: Box::new(swap),
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    unsafe fn compile_shader(&self, kind: u32, source: &str) -> Result<glow::NativeShader, String> {
        let shader = self.gl.create_shader(kind)?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);
        if !self.gl.get_shader_compile_status(shader) {
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            return Err(log);
        }
        Ok(shader)
    }
}

impl GlDevice for GlowDevice {
    type Texture = glow::NativeTexture;
    type Program = glow::NativeProgram;

    fn has_entry_point(&self, name: &str) -> bool {
        self.entry_points.contains(name)
    }

    fn extensions(&self) -> Option<String> {
        let extensions = self.gl.supported_extensions();
        if extensions.is_empty() {
            return None;
        }
        Some(extensions.iter().map(String::as_str).collect::<Vec<_>>().join(" "))
    }

    fn max_texture_size(&self) -> i32 {
        unsafe { self.gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) }
    }

    fn max_texture_units(&self) -> i32 {
        unsafe { self.gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS) }
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<Self::Program, String> {
        unsafe {
            let vs = self.compile_shader(glow::VERTEX_SHADER, vertex)?;
            let fs = match self.compile_shader(glow::FRAGMENT_SHADER, fragment) {
                Ok(fs) => fs,
                Err(log) => {
                    self.gl.delete_shader(vs);
                    return Err(log);
                }
            };

            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    self.gl.delete_shader(vs);
                    self.gl.delete_shader(fs);
                    return Err(e);
                }
            };
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.bind_attrib_location(program, 0, "position");
            self.gl.bind_attrib_location(program, 1, "tex_coords_in");
            self.gl.link_program(program);

            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            self.gl.delete_shader(vs);
            self.gl.delete_shader(fs);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }

            // 采样器固定绑定到纹理单元 0/1/2
            self.gl.use_program(Some(program));
            for (unit, name) in SAMPLER_NAMES.iter().enumerate() {
                let location = self.gl.get_uniform_location(program, name);
                self.gl.uniform_1_i32(location.as_ref(), unit as i32);
            }
            self.gl.use_program(None);

            if self.quad.is_none() {
                let buffer = self.gl.create_buffer()?;
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                self.gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(QUAD_VERTICES),
                    glow::STATIC_DRAW,
                );
                self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
                self.quad = Some(buffer);
            }

            debug!("YUV 着色器程序已链接: {:?}", program);
            Ok(program)
        }
    }

    fn create_texture(&mut self) -> Result<Self::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn delete_texture(&mut self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn bind_texture(&mut self, unit: u32, texture: Self::Texture) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }
    }

    fn init_texture_params(&mut self) {
        unsafe {
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        }
    }

    fn set_unpack(&mut self, alignment: i32, row_length: i32) {
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment);
            self.gl.pixel_store_i32(glow::UNPACK_ROW_LENGTH, row_length);
        }
    }

    fn tex_image(&mut self, width: i32, height: i32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::LUMINANCE as i32,
                width,
                height,
                0,
                glow::LUMINANCE,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
    }

    fn tex_sub_image(&mut self, width: i32, height: i32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                width,
                height,
                glow::LUMINANCE,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            );
        }
    }

    fn viewport(&mut self, rect: Rect) {
        unsafe { self.gl.viewport(rect.x, rect.y, rect.w as i32, rect.h as i32) }
    }

    fn clear(&mut self) {
        unsafe {
            self.gl.clear_color(0.0, 0.0, 0.0, 0.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn use_program(&mut self, program: Self::Program) {
        unsafe { self.gl.use_program(Some(program)) }
    }

    fn set_coefficients(&mut self, program: Self::Program, matrix: &ColorMatrix) {
        let values: Vec<f32> = matrix.rows().iter().flatten().copied().collect();
        unsafe {
            let location = self.gl.get_uniform_location(program, COEFFICIENT_UNIFORM);
            self.gl.uniform_4_f32_slice(location.as_ref(), &values);
        }
    }

    fn draw_quad(&mut self) {
        let stride = std::mem::size_of::<Vertex>() as i32;
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, self.quad);
            self.gl.enable_vertex_attrib_array(0);
            self.gl.vertex_attrib_pointer_f32(0, 2, glow::FLOAT, false, stride, 0);
            self.gl.enable_vertex_attrib_array(1);
            self.gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 8);
            self.gl.draw_arrays(glow::TRIANGLES, 0, QUAD_VERTICES.len() as i32);
            self.gl.disable_vertex_attrib_array(0);
            self.gl.disable_vertex_attrib_array(1);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn swap_buffers(&mut self) {
        (self.swap)();
    }
}

impl Drop for GlowDevice {
    fn drop(&mut self) {
        if let Some(buffer) = self.quad.take() {
            unsafe { self.gl.delete_buffer(buffer) }
        }
    }
}
