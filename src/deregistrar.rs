use std::sync::Arc;

use crate::connection::Connection;
use crate::error::Result;
use crate::observer::{RegistryEvent, RegistryObserver};

/// 按实例 ID 注销服务
#[derive(Clone)]
pub struct Deregistrar {
    connection: Connection,
    observer: Arc<dyn RegistryObserver>,
}

impl Deregistrar {
    pub fn new(connection: Connection, observer: Arc<dyn RegistryObserver>) -> Self {
        Self {
            connection,
            observer,
        }
    }

    /// 注销服务实例
    ///
    /// 重复注销是否报错由注册中心决定，失败统一以 `Backend` 错误返回。
    pub async fn deregister(&self, instance_id: &str) -> Result<()> {
        match self.connection.backend().deregister(instance_id).await {
            Ok(()) => {
                self.observer.on_event(&RegistryEvent::Deregistered {
                    instance_id: instance_id.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                self.observer.on_event(&RegistryEvent::DeregisterFailed {
                    instance_id: instance_id.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, InMemoryBackend};
    use crate::error::RegistryError;
    use crate::instance::ServiceInstance;
    use crate::observer::RecordingObserver;

    #[tokio::test]
    async fn second_deregister_surfaces_backend_error() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.insert(ServiceInstance::new("svc-10.0.0.1-8080", "svc", "10.0.0.1", 8080));
        let observer = Arc::new(RecordingObserver::new());
        let deregistrar = Deregistrar::new(Connection::with_backend(backend.clone()), observer.clone());

        deregistrar.deregister("svc-10.0.0.1-8080").await.unwrap();
        let err = deregistrar.deregister("svc-10.0.0.1-8080").await.unwrap_err();
        assert!(matches!(err, RegistryError::Backend { operation: "deregister", .. }));

        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Deregister("svc-10.0.0.1-8080".to_string()),
                BackendCall::Deregister("svc-10.0.0.1-8080".to_string()),
            ]
        );

        let events = observer.events();
        assert_eq!(
            events[0],
            RegistryEvent::Deregistered {
                instance_id: "svc-10.0.0.1-8080".to_string()
            }
        );
        assert!(matches!(events[1], RegistryEvent::DeregisterFailed { .. }));
    }
}
