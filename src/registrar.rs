//! 服务注册

use std::sync::Arc;

use crate::connection::Connection;
use crate::deregistrar::Deregistrar;
use crate::descriptor::ServiceDescriptor;
use crate::error::Result;
use crate::observer::{RegistryEvent, RegistryObserver};
use crate::shutdown::ShutdownCoordinator;

/// 服务注册器
///
/// 注册成功后实例 ID 交由 [`ShutdownCoordinator`] 跟踪，
/// 首次注册成功时启动进程内唯一的信号监听任务。
#[derive(Clone)]
pub struct Registrar {
    connection: Connection,
    observer: Arc<dyn RegistryObserver>,
    deregistrar: Deregistrar,
    coordinator: Arc<ShutdownCoordinator>,
}

impl Registrar {
    pub fn new(
        connection: Connection,
        observer: Arc<dyn RegistryObserver>,
        deregistrar: Deregistrar,
        coordinator: Arc<ShutdownCoordinator>,
    ) -> Self {
        Self {
            connection,
            observer,
            deregistrar,
            coordinator,
        }
    }

    /// 注册服务实例
    ///
    /// 参数不合法时直接返回 `Validation` 错误，不发起网络请求；
    /// 注册中心失败时返回 `Backend` 错误，不重试。
    pub async fn register(&self, descriptor: ServiceDescriptor) -> Result<Registration> {
        descriptor.validate()?;
        let instance_id = descriptor.instance_id();

        self.connection.backend().register(&descriptor).await?;

        self.observer.on_event(&RegistryEvent::Registered {
            name: descriptor.name.clone(),
            instance_id: instance_id.clone(),
            address: descriptor.endpoint(),
        });

        if self.coordinator.track(&instance_id) {
            self.coordinator.ensure_watcher();
        }

        Ok(Registration {
            instance_id,
            descriptor,
            deregistrar: self.deregistrar.clone(),
            coordinator: self.coordinator.clone(),
        })
    }
}

/// 已注册实例的停机钩子
///
/// 丢弃本值不会注销实例，实例仍由停机协调器负责；
/// 需要提前下线时调用 [`Registration::deregister`]。
#[must_use = "keep the registration to deregister it explicitly"]
pub struct Registration {
    instance_id: String,
    descriptor: ServiceDescriptor,
    deregistrar: Deregistrar,
    coordinator: Arc<ShutdownCoordinator>,
}

impl Registration {
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// 立即注销，并从停机协调器中移除
    ///
    /// 注销失败时实例继续由协调器跟踪，停机时会再次尝试。
    pub async fn deregister(self) -> Result<()> {
        self.deregistrar.deregister(&self.instance_id).await?;
        self.coordinator.untrack(&self.instance_id);
        Ok(())
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("instance_id", &self.instance_id)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
