//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
    /// 健康检查中返回的服务名称
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// 上游数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 单次 HTTP 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 单个查询方式的总超时时间（秒）
    #[serde(default = "default_method_timeout")]
    pub method_timeout_secs: u64,
    /// 列表查询最多请求的品种节点数（0 表示全部）
    #[serde(default)]
    pub max_nodes: usize,
    /// 实时行情查询的合约列表
    #[serde(default = "default_spot_symbols")]
    pub spot_symbols: Vec<String>,
    /// 主力连续查询的合约列表
    #[serde(default = "default_main_symbols")]
    pub main_symbols: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 上游数据源配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_service_name() -> String { "AKShare Futures API".to_string() }
fn default_timeout() -> u64 { 10 }
fn default_connect_timeout() -> u64 { 5 }
fn default_method_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }

fn default_spot_symbols() -> Vec<String> {
    ["RB2601", "CU2601", "AL2601", "AU2602", "M2601", "I2601", "TA601", "MA601", "SA601"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_main_symbols() -> Vec<String> {
    ["RB0", "CU0", "AU0", "M0", "I0", "TA0", "MA0", "SC0", "LC0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            service_name: default_service_name(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            method_timeout_secs: default_method_timeout(),
            max_nodes: 0,
            spot_symbols: default_spot_symbols(),
            main_symbols: default_main_symbols(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析配置，缺省字段使用默认值
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 此时日志系统尚未初始化（日志级别来自配置本身），结果以消息列表返回，
    /// 由调用方在初始化日志后输出
    pub fn load() -> (Self, Vec<String>) {
        let config_paths = ["config.json", "config/config.json"];
        let mut messages = Vec::new();

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        messages.push(format!("从 {} 加载配置成功", path));
                        return (config, messages);
                    }
                    Err(e) => {
                        messages.push(format!("加载配置文件 {} 失败: {}", path, e));
                    }
                }
            }
        }

        messages.push("使用默认配置".to_string());
        (Self::default(), messages)
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
