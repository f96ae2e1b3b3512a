use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::{OutputError, Result};
use crate::output::BackendKind;

/// 视频输出配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 首选后端
    pub backend: BackendKind,
    /// GPU 能力协商失败后，下次分配纹理时是否重新协商（例如上下文重建之后）
    pub retry_gpu_init: bool,
    /// GPU 镜像帧的行跨度对齐
    pub mirror_align: usize,
    /// 内存显示子系统分配 Overlay 时的 pitch 对齐
    pub overlay_pitch_align: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Gl,
            retry_gpu_init: false,
            mirror_align: 16,
            overlay_pitch_align: 8,
        }
    }
}

impl OutputConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("mirror_align", self.mirror_align),
            ("overlay_pitch_align", self.overlay_pitch_align),
        ] {
            if !value.is_power_of_two() {
                return Err(OutputError::Config(format!(
                    "{} 必须是 2 的幂, 当前为 {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
