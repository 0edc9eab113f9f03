//! 服务实例定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 注册中心上报的服务实例（只读）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    /// 实例 ID（唯一标识）
    pub instance_id: String,

    /// 服务名称
    pub name: String,

    /// 服务地址
    pub address: String,

    /// 服务端口
    pub port: u16,

    /// 标签
    pub tags: Vec<String>,

    /// 元数据
    pub meta: HashMap<String, String>,

    /// 健康状态，只有健康查询接口返回的实例才有值
    pub healthy: Option<bool>,
}

impl ServiceInstance {
    /// 创建新的服务实例
    pub fn new(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            address: address.into(),
            port,
            tags: Vec::new(),
            meta: HashMap::new(),
            healthy: None,
        }
    }

    /// 添加标签
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// 设置健康状态
    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = Some(healthy);
        self
    }

    /// `<address>:<port>`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
