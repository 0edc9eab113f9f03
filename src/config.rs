use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// 注册中心客户端配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Consul agent 地址，`host:port` 或完整的 `http(s)://host:port`
    #[serde(default = "default_address")]
    pub address: String,
    /// 数据中心（可选，附加为 `dc` 查询参数）
    #[serde(default)]
    pub datacenter: Option<String>,
    /// ACL token（可选，以 `X-Consul-Token` 头发送）
    #[serde(default)]
    pub token: Option<String>,
    /// 单次请求超时（秒），0 表示不限制
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

fn default_address() -> String {
    "127.0.0.1:8500".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            datacenter: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// 使用指定地址创建默认配置
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownConfig) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RegistryError::config(format!("failed to parse registry config: {e}")))
    }

    /// 从 TOML 文件加载
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::config(format!("failed to read {path}: {e}")))?;
        Self::from_toml_str(&content)
    }
}

/// 注销失败时的退出策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 尽力注销，失败只记录日志，退出码始终为 0
    #[default]
    BestEffort,
    /// 任一实例注销失败时以非零退出码结束
    Strict,
}

/// 优雅停机配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShutdownConfig {
    /// 收到终止信号并完成注销后是否直接结束进程（默认 true）
    ///
    /// 设为 false 时嵌入方必须自己等待 `wait_for_shutdown` 并退出，
    /// 否则信号被捕获后进程不会终止。
    #[serde(default = "default_exit_on_signal")]
    pub exit_on_signal: bool,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_exit_on_signal() -> bool {
    true
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            exit_on_signal: default_exit_on_signal(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ShutdownConfig {
    pub fn with_exit_on_signal(mut self, exit_on_signal: bool) -> Self {
        self.exit_on_signal = exit_on_signal;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RegistryConfig::from_toml_str("").unwrap();
        assert_eq!(config.address, "127.0.0.1:8500");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.datacenter.is_none());
        assert!(config.shutdown.exit_on_signal);
        assert_eq!(config.shutdown.failure_policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn signal_exit_is_on_unless_disabled() {
        assert!(ShutdownConfig::default().exit_on_signal);

        let config = RegistryConfig::from_toml_str(
            r#"
            [shutdown]
            failure_policy = "strict"
            "#,
        )
        .unwrap();
        assert!(config.shutdown.exit_on_signal);

        let config = RegistryConfig::from_toml_str(
            r#"
            [shutdown]
            exit_on_signal = false
            "#,
        )
        .unwrap();
        assert!(!config.shutdown.exit_on_signal);
    }

    #[test]
    fn parses_full_document() {
        let config = RegistryConfig::from_toml_str(
            r#"
            address = "http://consul.internal:8500"
            datacenter = "dc2"
            token = "secret"
            timeout_secs = 3

            [shutdown]
            exit_on_signal = false
            failure_policy = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.address, "http://consul.internal:8500");
        assert_eq!(config.datacenter.as_deref(), Some("dc2"));
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 3);
        assert!(!config.shutdown.exit_on_signal);
        assert_eq!(config.shutdown.failure_policy, FailurePolicy::Strict);
    }

    #[test]
    fn malformed_document_is_config_error() {
        let err = RegistryConfig::from_toml_str("address = [").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = RegistryConfig::load_from_file("/nonexistent/registry.toml").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}
