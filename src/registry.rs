//! 服务注册发现客户端
//!
//! 将注册、注销、过滤查询、随机解析和优雅停机组装在同一个 [`Connection`] 之上。
//! 每个进程只需要构造一个 [`ServiceRegistry`]，克隆后共享同一个停机协调器。
//!
//! 默认配置下收到 SIGINT / SIGTERM 后注销所有实例并直接结束进程。
//! 需要在退出前做其他清理时关闭 `exit_on_signal`，自己等待停机结果。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use flare_registry_client::{Connection, ServiceDescriptor, ServiceRegistry, ShutdownConfig};
//!
//! # async fn run() -> flare_registry_client::Result<()> {
//! let registry = ServiceRegistry::builder(Connection::new("127.0.0.1:8500")?)
//!     .with_shutdown_config(ShutdownConfig::default().with_exit_on_signal(false))
//!     .build();
//!
//! let _registration = registry
//!     .register(ServiceDescriptor::new("api", "127.0.0.1", 9000))
//!     .await?;
//!
//! let address = registry.resolve("billing").await?;
//! println!("billing at {address}");
//!
//! // 收到 SIGINT / SIGTERM 后所有实例已注销
//! let outcome = registry.wait_for_shutdown().await;
//! std::process::exit(outcome.exit_code(registry.shutdown_config().failure_policy));
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ShutdownConfig;
use crate::connection::Connection;
use crate::deregistrar::Deregistrar;
use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::instance::ServiceInstance;
use crate::lookup::Lookup;
use crate::observer::{RegistryObserver, TracingObserver};
use crate::registrar::{Registrar, Registration};
use crate::resolver::{Resolver, SharedRng};
use crate::shutdown::{ShutdownCoordinator, ShutdownOutcome};

/// 服务注册发现客户端
#[derive(Clone)]
pub struct ServiceRegistry {
    connection: Connection,
    registrar: Registrar,
    deregistrar: Deregistrar,
    lookup: Lookup,
    resolver: Resolver,
    coordinator: Arc<ShutdownCoordinator>,
}

impl ServiceRegistry {
    /// 使用默认观察者、熵随机源和停机配置创建
    pub fn new(connection: Connection) -> Self {
        Self::builder(connection).build()
    }

    pub fn builder(connection: Connection) -> ServiceRegistryBuilder {
        ServiceRegistryBuilder {
            connection,
            observer: Arc::new(TracingObserver),
            rng: None,
            shutdown: ShutdownConfig::default(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn shutdown_config(&self) -> &ShutdownConfig {
        self.coordinator.config()
    }

    /// 停机协调器，可交给 [`crate::ShutdownWatcher::spawn_with_trigger`] 接入自定义停机流程
    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.coordinator
    }

    /// 注册服务实例
    pub async fn register(&self, descriptor: ServiceDescriptor) -> Result<Registration> {
        self.registrar.register(descriptor).await
    }

    /// 按实例 ID 注销
    ///
    /// 成功后该实例不再由停机协调器跟踪。
    pub async fn deregister(&self, instance_id: &str) -> Result<()> {
        self.deregistrar.deregister(instance_id).await?;
        self.coordinator.untrack(instance_id);
        Ok(())
    }

    /// 按服务名过滤查询
    pub async fn filter_by_name(&self, name: &str) -> Result<HashMap<String, ServiceInstance>> {
        self.lookup.filter_by_name(name).await
    }

    /// 随机解析服务地址，返回 `address:port`
    pub async fn resolve(&self, service_name: &str) -> Result<String> {
        self.resolver.resolve(service_name).await
    }

    /// 随机解析服务实例
    pub async fn resolve_instance(&self, service_name: &str) -> Result<ServiceInstance> {
        self.resolver.resolve_instance(service_name).await
    }

    /// 当前由停机协调器跟踪的实例 ID
    pub fn active_instances(&self) -> Vec<String> {
        self.coordinator.active()
    }

    /// 立即注销所有跟踪的实例（只执行一次）
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.coordinator.shutdown().await
    }

    /// 等待停机注销完成（由信号或 [`ServiceRegistry::shutdown`] 触发）
    pub async fn wait_for_shutdown(&self) -> ShutdownOutcome {
        self.coordinator.wait().await
    }
}

/// [`ServiceRegistry`] 构建器
pub struct ServiceRegistryBuilder {
    connection: Connection,
    observer: Arc<dyn RegistryObserver>,
    rng: Option<SharedRng>,
    shutdown: ShutdownConfig,
}

impl ServiceRegistryBuilder {
    /// 设置事件观察者
    pub fn with_observer(mut self, observer: Arc<dyn RegistryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 注入随机源
    pub fn with_rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// 设置停机配置
    pub fn with_shutdown_config(mut self, shutdown: ShutdownConfig) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn build(self) -> ServiceRegistry {
        let Self {
            connection,
            observer,
            rng,
            shutdown,
        } = self;

        let deregistrar = Deregistrar::new(connection.clone(), observer.clone());
        let coordinator = Arc::new(ShutdownCoordinator::new(
            deregistrar.clone(),
            observer.clone(),
            shutdown,
        ));
        let registrar = Registrar::new(
            connection.clone(),
            observer.clone(),
            deregistrar.clone(),
            coordinator.clone(),
        );
        let lookup = Lookup::new(connection.clone(), observer.clone());
        let resolver = Resolver::new(connection.clone(), observer, rng.unwrap_or_default());

        ServiceRegistry {
            connection,
            registrar,
            deregistrar,
            lookup,
            resolver,
            coordinator,
        }
    }
}
