//! GPU 能力协商（每个 GL 上下文只做一次）

use log::{info, warn};
use once_cell::unsync::OnceCell;

use super::device::GlDevice;
use super::shader::{FRAGMENT_SHADER, VERTEX_SHADER};
use crate::core::CapabilityError;

/// 着色器程序需要的入口函数
pub const REQUIRED_ENTRY_POINTS: &[&str] = &[
    "glCreateProgram",
    "glCreateShader",
    "glShaderSource",
    "glCompileShader",
    "glLinkProgram",
    "glUseProgram",
    "glUniform4fv",
    "glDeleteProgram",
];

/// 多重纹理、非 2 的幂纹理、可编程片段阶段
pub const REQUIRED_EXTENSIONS: &[&str] = &[
    "GL_ARB_multitexture",
    "GL_ARB_texture_non_power_of_two",
    "GL_ARB_fragment_shader",
];

/// Y/U/V 三张纹理同时绑定
pub const REQUIRED_TEXTURE_UNITS: i32 = 3;

/// 扩展列表中是否有完整匹配 `name` 的一项
pub fn has_extension(extensions: &str, name: &str) -> bool {
    extensions.split(' ').any(|item| item == name)
}

/// 协商成功后得到的上下文能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuCaps<P> {
    pub max_texture_size: i32,
    pub max_texture_units: i32,
    pub program: P,
}

/// 查询入口函数、扩展和限制，最后编译着色器程序
///
/// 只有全部成功才返回结果，失败时不留下任何半初始化状态。
pub fn negotiate<D: GlDevice>(device: &mut D) -> Result<GpuCaps<D::Program>, CapabilityError> {
    if let Some(name) = REQUIRED_ENTRY_POINTS
        .iter()
        .copied()
        .find(|name| !device.has_entry_point(name))
    {
        return Err(CapabilityError::MissingEntryPoint(name));
    }

    let max_texture_size = device.max_texture_size();
    let max_texture_units = device.max_texture_units();

    let extensions = device.extensions().ok_or(CapabilityError::NoExtensionString)?;
    if let Some(name) = REQUIRED_EXTENSIONS
        .iter()
        .copied()
        .find(|name| !has_extension(&extensions, name))
    {
        return Err(CapabilityError::MissingExtension(name));
    }

    let program = device
        .create_program(VERTEX_SHADER, FRAGMENT_SHADER)
        .map_err(CapabilityError::ProgramCompile)?;

    info!(
        "✓ GPU 能力协商完成: 最大纹理 {}, 纹理单元 {}",
        max_texture_size, max_texture_units
    );

    Ok(GpuCaps {
        max_texture_size,
        max_texture_units,
        program,
    })
}

/// 协商结果缓存
///
/// 成功的结果只写入一次，之后不会重新协商。失败结果默认也缓存
/// （后续分配立刻失败），`retry_failures` 打开时下次分配会重新尝试。
pub(crate) struct CapsCell<P> {
    ready: OnceCell<GpuCaps<P>>,
    failure: Option<CapabilityError>,
    retry_failures: bool,
    attempts: u32,
}

impl<P: Copy> CapsCell<P> {
    pub(crate) fn new(retry_failures: bool) -> Self {
        Self {
            ready: OnceCell::new(),
            failure: None,
            retry_failures,
            attempts: 0,
        }
    }

    pub(crate) fn get(&self) -> Option<&GpuCaps<P>> {
        self.ready.get()
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn get_or_negotiate<D>(&mut self, device: &mut D) -> Result<GpuCaps<P>, CapabilityError>
    where
        D: GlDevice<Program = P>,
    {
        if let Some(caps) = self.ready.get() {
            return Ok(*caps);
        }
        if let Some(err) = &self.failure {
            if !self.retry_failures {
                return Err(err.clone());
            }
        }

        self.attempts += 1;
        match negotiate(device) {
            Ok(caps) => {
                self.failure = None;
                Ok(*self.ready.get_or_init(|| caps))
            }
            Err(err) => {
                warn!("GPU 能力协商失败: {}", err);
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }
}
