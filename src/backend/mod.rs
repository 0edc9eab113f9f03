//! 注册中心后端抽象和实现

pub mod consul;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use consul::ConsulBackend;
#[cfg(any(test, feature = "testing"))]
pub use memory::{BackendCall, InMemoryBackend};

use async_trait::async_trait;
use std::collections::HashMap;

use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::filter::FilterExpression;
use crate::instance::ServiceInstance;

/// 注册中心后端 trait
///
/// 每个方法对应一次网络往返，不做重试。
/// 注意：由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// 注册服务实例，实例 ID 由描述推导
    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<()>;

    /// 注销服务实例
    async fn deregister(&self, instance_id: &str) -> Result<()>;

    /// 按过滤表达式列出本 agent 上的服务（实例 ID -> 实例）
    async fn services_with_filter(
        &self,
        filter: &FilterExpression,
    ) -> Result<HashMap<String, ServiceInstance>>;

    /// 健康查询接口列出服务实例
    ///
    /// # 参数
    /// * `service_name` - 服务名称
    /// * `passing_only` - 为 false 时返回全部实例（忽略健康状态）
    async fn health_service(
        &self,
        service_name: &str,
        passing_only: bool,
    ) -> Result<Vec<ServiceInstance>>;
}
