// 核心数据结构、错误与配置

pub mod types;
pub mod error;
pub mod config;

pub use types::*;
pub use error::*;
pub use config::OutputConfig;
