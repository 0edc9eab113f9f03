//! Flare Registry Client
//!
//! Consul 服务注册发现客户端：注册本进程为服务实例、按服务名过滤查询、
//! 随机选择实例解析地址，并在收到终止信号时统一注销。
//!
//! # Features
//!
//! - `testing`：导出进程内后端 `InMemoryBackend` 和事件记录器 `RecordingObserver`，
//!   供下游 crate 编写不依赖 Consul 的测试。

pub mod backend;
pub mod config;
pub mod connection;
pub mod deregistrar;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod instance;
pub mod lookup;
pub mod observer;
pub mod registrar;
pub mod registry;
pub mod resolver;
pub mod shutdown;
pub mod telemetry;

// Re-exports
pub use backend::{ConsulBackend, RegistryBackend};
#[cfg(any(test, feature = "testing"))]
pub use backend::InMemoryBackend;
pub use config::{FailurePolicy, RegistryConfig, ShutdownConfig};
pub use connection::Connection;
pub use deregistrar::Deregistrar;
pub use descriptor::ServiceDescriptor;
pub use error::{ErrorCode, RegistryError, Result};
pub use filter::FilterExpression;
pub use instance::ServiceInstance;
pub use lookup::Lookup;
#[cfg(any(test, feature = "testing"))]
pub use observer::RecordingObserver;
pub use observer::{RegistryEvent, RegistryObserver, TracingObserver};
pub use registrar::{Registrar, Registration};
pub use registry::{ServiceRegistry, ServiceRegistryBuilder};
pub use resolver::{Resolver, SharedRng};
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome, ShutdownWatcher, wait_for_signal};
pub use telemetry::{LogFormat, init_tracing};
