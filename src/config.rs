use crate::utils::error::ClassifierError;
use crate::Result;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 5002;

/// 默认监听地址
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5002";

/// 默认模型文件路径
pub const DEFAULT_MODEL_PATH: &str = "models/plant_disease_resnet50.onnx";

/// 请求超时时间（秒）
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
/// 开发模式下的请求超时时间（秒）
pub const DEV_REQUEST_TIMEOUT_SECS: u64 = 300;
/// 最大请求体大小 50MB
pub const MAX_REQUEST_SIZE: usize = 50 * 1024 * 1024;
/// ONNX图优化级别
pub const OPTIMIZATION_LEVEL: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: SocketAddr,

    /// 模型文件路径（微调后的ResNet-50导出的ONNX）
    pub model_path: PathBuf,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: &str,
        model_path: impl Into<PathBuf>,
        intra_threads: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let bind_addr: SocketAddr = bind_addr.parse().map_err(|e| {
            ClassifierError::Config(format!("Invalid bind address {}: {}", bind_addr, e))
        })?;

        let intra_threads = match intra_threads {
            Some(0) => {
                return Err(ClassifierError::Config(
                    "Thread count must be at least 1".to_string(),
                ))
            }
            Some(n) => n,
            None => default_intra_threads(),
        };

        Ok(Self::build(bind_addr, model_path.into(), intra_threads, dev_mode))
    }

    fn build(bind_addr: SocketAddr, model_path: PathBuf, intra_threads: usize, dev_mode: bool) -> Self {
        let onnx_config = OnnxConfig {
            intra_threads,
            optimization_level: OPTIMIZATION_LEVEL,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode {
                DEV_REQUEST_TIMEOUT_SECS
            } else {
                REQUEST_TIMEOUT_SECS
            },
            max_request_size: MAX_REQUEST_SIZE,
        };

        Self {
            bind_addr,
            model_path,
            dev_mode,
            onnx_config,
            server_config,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::build(
            SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            PathBuf::from(DEFAULT_MODEL_PATH),
            default_intra_threads(),
            false,
        )
    }
}

/// 使用75%的CPU核心
fn default_intra_threads() -> usize {
    (num_cpus::get() * 3 / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_the_fixed_port() {
        let config = Config::new(DEFAULT_BIND_ADDR, DEFAULT_MODEL_PATH, None, false).unwrap();
        assert_eq!(config.bind_addr.port(), 5002);
        assert_eq!(config.bind_addr, Config::default().bind_addr);
        assert!(config.onnx_config.intra_threads >= 1);
        assert_eq!(config.server_config.request_timeout, 60);
    }

    #[test]
    fn default_matches_default_arguments() {
        let parsed = Config::new(DEFAULT_BIND_ADDR, DEFAULT_MODEL_PATH, None, false).unwrap();
        assert_eq!(Config::default(), parsed);
        assert_eq!(parsed.server_config.max_request_size, 50 * 1024 * 1024);
        assert_eq!(parsed.onnx_config.optimization_level, 3);
    }

    #[test]
    fn dev_mode_extends_timeout() {
        let config = Config::new(DEFAULT_BIND_ADDR, DEFAULT_MODEL_PATH, Some(2), true).unwrap();
        assert_eq!(config.server_config.request_timeout, 300);
        assert_eq!(config.onnx_config.intra_threads, 2);
    }

    #[test]
    fn rejects_bad_bind_address() {
        let err = Config::new("not-an-address", DEFAULT_MODEL_PATH, None, false).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(Config::new(DEFAULT_BIND_ADDR, DEFAULT_MODEL_PATH, Some(0), false).is_err());
    }
}
