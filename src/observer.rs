//! 注册中心事件观察者
//!
//! 各组件在构造时显式接收观察者，而不是依赖全局日志器，
//! 测试可以直接断言产生的事件。默认实现 [`TracingObserver`] 输出结构化日志。

use tracing::{debug, error, info};

/// 注册中心生命周期事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// 服务注册成功
    Registered {
        name: String,
        instance_id: String,
        address: String,
    },
    /// 服务注销成功
    Deregistered { instance_id: String },
    /// 服务注销失败
    DeregisterFailed { instance_id: String, error: String },
    /// 已构造过滤表达式，即将提交
    FilterBuilt { filter: String },
    /// 已选出服务实例
    Resolved {
        service: String,
        address: String,
        candidates: usize,
    },
    /// 收到进程终止信号
    ShutdownSignal { signal: &'static str },
    /// 停机注销完成
    ShutdownCompleted { deregistered: usize, failed: usize },
}

/// 事件观察者
pub trait RegistryObserver: Send + Sync {
    fn on_event(&self, event: &RegistryEvent);
}

/// 基于 tracing 的默认观察者
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RegistryObserver for TracingObserver {
    fn on_event(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::Registered {
                name,
                instance_id,
                address,
            } => {
                info!(
                    service_name = %name,
                    instance_id = %instance_id,
                    address = %address,
                    "Service registered with Consul"
                );
            }
            RegistryEvent::Deregistered { instance_id } => {
                info!(instance_id = %instance_id, "Service deregistered from Consul");
            }
            RegistryEvent::DeregisterFailed { instance_id, error } => {
                error!(
                    instance_id = %instance_id,
                    error = %error,
                    "Failed to deregister service from Consul"
                );
            }
            RegistryEvent::FilterBuilt { filter } => {
                info!(filter = %filter, "Listing Consul services with filter");
            }
            RegistryEvent::Resolved {
                service,
                address,
                candidates,
            } => {
                debug!(
                    service_name = %service,
                    selected_address = %address,
                    total_services = candidates,
                    "Discovered service instance"
                );
            }
            RegistryEvent::ShutdownSignal { signal } => {
                info!(signal = %signal, "Shutdown signal received");
            }
            RegistryEvent::ShutdownCompleted {
                deregistered,
                failed,
            } => {
                info!(
                    deregistered = deregistered,
                    failed = failed,
                    "Registry shutdown completed"
                );
            }
        }
    }
}

/// 记录所有事件的观察者，用于测试（需要 `testing` feature）
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: std::sync::Mutex<Vec<RegistryEvent>>,
}

#[cfg(any(test, feature = "testing"))]
impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录事件的快照
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "testing"))]
impl RegistryObserver for RecordingObserver {
    fn on_event(&self, event: &RegistryEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event.clone());
    }
}
