//! 进程内注册中心后端
//!
//! 不发起网络请求，记录每次调用并支持注入失败，供测试使用。
//! 只在开启 `testing` feature 时编译。

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::RegistryBackend;
use crate::descriptor::ServiceDescriptor;
use crate::error::{RegistryError, Result};
use crate::filter::FilterExpression;
use crate::instance::ServiceInstance;

/// 后端调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Register(String),
    Deregister(String),
    List(String),
    Health(String),
}

impl BackendCall {
    fn operation(&self) -> &'static str {
        match self {
            BackendCall::Register(_) => "register",
            BackendCall::Deregister(_) => "deregister",
            BackendCall::List(_) => "list",
            BackendCall::Health(_) => "health",
        }
    }
}

/// 进程内后端
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    services: Mutex<BTreeMap<String, ServiceInstance>>,
    calls: Mutex<Vec<BackendCall>>,
    failing: Mutex<HashSet<&'static str>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入一个实例（绕过注册接口，不记录调用）
    pub fn insert(&self, instance: ServiceInstance) {
        lock(&self.services).insert(instance.instance_id.clone(), instance);
    }

    /// 让指定操作（register / deregister / list / health）之后都返回错误
    pub fn fail(&self, operation: &'static str) {
        lock(&self.failing).insert(operation);
    }

    /// 恢复指定操作
    pub fn recover(&self, operation: &'static str) {
        lock(&self.failing).remove(operation);
    }

    /// 调用记录快照
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        lock(&self.services).contains_key(instance_id)
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.services).is_empty()
    }

    fn record(&self, call: BackendCall) -> Result<()> {
        let operation = call.operation();
        lock(&self.calls).push(call);
        if lock(&self.failing).contains(operation) {
            return Err(RegistryError::backend(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryBackend for InMemoryBackend {
    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        let instance_id = descriptor.instance_id();
        self.record(BackendCall::Register(instance_id.clone()))?;

        let mut instance = ServiceInstance::new(
            instance_id,
            descriptor.name.clone(),
            descriptor.address.clone(),
            descriptor.port,
        );
        instance.tags = descriptor.tags.clone();
        self.insert(instance);
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        self.record(BackendCall::Deregister(instance_id.to_string()))?;
        match lock(&self.services).remove(instance_id) {
            Some(_) => Ok(()),
            None => Err(RegistryError::backend(
                "deregister",
                format!("unknown service ID {instance_id:?}"),
            )),
        }
    }

    async fn services_with_filter(
        &self,
        filter: &FilterExpression,
    ) -> Result<HashMap<String, ServiceInstance>> {
        self.record(BackendCall::List(filter.as_str().to_string()))?;
        Ok(lock(&self.services)
            .values()
            .filter(|instance| instance.name == filter.target_service())
            .map(|instance| (instance.instance_id.clone(), instance.clone()))
            .collect())
    }

    async fn health_service(
        &self,
        service_name: &str,
        passing_only: bool,
    ) -> Result<Vec<ServiceInstance>> {
        self.record(BackendCall::Health(service_name.to_string()))?;
        Ok(lock(&self.services)
            .values()
            .filter(|instance| instance.name == service_name)
            .map(|instance| {
                let healthy = instance.healthy.unwrap_or(true);
                instance.clone().with_health(healthy)
            })
            .filter(|instance| !passing_only || instance.healthy == Some(true))
            .collect())
    }
}
