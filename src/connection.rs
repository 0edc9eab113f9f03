//! 注册中心连接句柄

use std::fmt;
use std::sync::Arc;

use crate::backend::{ConsulBackend, RegistryBackend};
use crate::config::RegistryConfig;
use crate::error::Result;

/// 注册中心连接
///
/// 每个进程构造一次，构造后不可变，可以在多个并发操作间克隆共享。
/// 构造时只做本地配置校验，不发起网络请求。
#[derive(Clone)]
pub struct Connection {
    backend: Arc<dyn RegistryBackend>,
    endpoint: String,
}

impl Connection {
    /// 通过 agent 地址创建连接（其它配置取默认值）
    ///
    /// # 示例
    /// ```rust
    /// use flare_registry_client::Connection;
    ///
    /// let connection = Connection::new("127.0.0.1:8500").unwrap();
    /// assert_eq!(connection.endpoint(), "http://127.0.0.1:8500/");
    /// assert!(Connection::new("").is_err());
    /// ```
    pub fn new(address: &str) -> Result<Self> {
        Self::from_config(&RegistryConfig::new(address))
    }

    /// 通过完整配置创建连接
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let backend = ConsulBackend::new(config)?;
        let endpoint = backend.base_url().to_string();
        Ok(Self {
            backend: Arc::new(backend),
            endpoint,
        })
    }

    /// 使用任意后端实现（例如 `testing` feature 下的 `InMemoryBackend`）
    pub fn with_backend(backend: Arc<dyn RegistryBackend>) -> Self {
        Self {
            backend,
            endpoint: "in-process".to_string(),
        }
    }

    /// 后端地址描述
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn backend(&self) -> &dyn RegistryBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
