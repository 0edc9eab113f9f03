//! 按服务名过滤查询

use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::Connection;
use crate::error::Result;
use crate::filter::FilterExpression;
use crate::instance::ServiceInstance;
use crate::observer::{RegistryEvent, RegistryObserver};

/// 服务过滤查询
#[derive(Clone)]
pub struct Lookup {
    connection: Connection,
    observer: Arc<dyn RegistryObserver>,
}

impl Lookup {
    pub fn new(connection: Connection, observer: Arc<dyn RegistryObserver>) -> Self {
        Self {
            connection,
            observer,
        }
    }

    /// 按服务名列出实例，原样返回注册中心结果（实例 ID -> 实例）
    pub async fn filter_by_name(&self, name: &str) -> Result<HashMap<String, ServiceInstance>> {
        let filter = FilterExpression::service_name(name);
        self.observer.on_event(&RegistryEvent::FilterBuilt {
            filter: filter.to_string(),
        });
        self.connection.backend().services_with_filter(&filter).await
    }
}
