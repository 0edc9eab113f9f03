//! 服务地址解析（随机负载均衡）
//!
//! 从健康查询接口获取全部实例（不区分健康状态），均匀随机选择一个。
//! 随机源在进程内只创建一次，并可注入固定种子以便测试复现。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};

use crate::connection::Connection;
use crate::error::{RegistryError, Result};
use crate::instance::ServiceInstance;
use crate::observer::{RegistryEvent, RegistryObserver};

/// 进程级共享随机源
#[derive(Debug, Clone)]
pub struct SharedRng(Arc<Mutex<StdRng>>);

impl SharedRng {
    /// 使用系统熵初始化
    pub fn from_entropy() -> Self {
        Self(Arc::new(Mutex::new(StdRng::from_entropy())))
    }

    /// 使用固定种子初始化，选择序列可复现
    pub fn seeded(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    /// 在 `[0, len)` 中均匀选择一个下标，`len` 必须大于 0
    pub fn pick(&self, len: usize) -> usize {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..len)
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// 服务解析器
#[derive(Clone)]
pub struct Resolver {
    connection: Connection,
    observer: Arc<dyn RegistryObserver>,
    rng: SharedRng,
}

impl Resolver {
    pub fn new(connection: Connection, observer: Arc<dyn RegistryObserver>, rng: SharedRng) -> Self {
        Self {
            connection,
            observer,
            rng,
        }
    }

    /// 随机选择一个实例
    pub async fn resolve_instance(&self, service_name: &str) -> Result<ServiceInstance> {
        let mut candidates = self
            .connection
            .backend()
            .health_service(service_name, false)
            .await?;

        if candidates.is_empty() {
            return Err(RegistryError::not_found(service_name));
        }

        let total = candidates.len();
        let selected = candidates.swap_remove(self.rng.pick(total));

        self.observer.on_event(&RegistryEvent::Resolved {
            service: service_name.to_string(),
            address: selected.endpoint(),
            candidates: total,
        });
        Ok(selected)
    }

    /// 随机选择一个实例并返回 `address:port`
    pub async fn resolve(&self, service_name: &str) -> Result<String> {
        Ok(self.resolve_instance(service_name).await?.endpoint())
    }
}
