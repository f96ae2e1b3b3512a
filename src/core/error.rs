use thiserror::Error;

/// GPU 能力协商失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("缺少 GL 入口函数: {0}")]
    MissingEntryPoint(&'static str),

    #[error("无法获取 GL 扩展列表")]
    NoExtensionString,

    #[error("缺少 GL 扩展: {0}")]
    MissingExtension(&'static str),

    #[error("可用纹理单元不足: {available} < {required}")]
    TextureUnits { available: i32, required: i32 },

    #[error("尺寸 {width}x{height} 超出最大纹理尺寸 {max}")]
    TextureSize { width: u32, height: u32, max: i32 },

    #[error("着色器程序编译失败: {0}")]
    ProgramCompile(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("无效的纹理尺寸: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("GPU 能力不足: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Overlay 分配不足: 请求 {width}x{height}, pitch={pitch}, 平面间距={plane_gap}")]
    UnderAllocation {
        width: u32,
        height: u32,
        pitch: usize,
        plane_gap: usize,
    },

    #[error("显示子系统无法创建 Overlay")]
    OverlayUnavailable,

    #[error("内存不足")]
    OutOfMemory,

    #[error("帧格式不匹配: {0}")]
    FormatMismatch(String),

    #[error("像素格式转换失败: {0}")]
    Conversion(String),

    #[error("GL 调用失败: {0}")]
    Device(String),

    #[error("Overlay 加锁失败: {0}")]
    Lock(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("JSON 错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg 错误: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),

    #[error("Anyhow 错误: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OutputError>;
