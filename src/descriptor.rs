//! 服务注册描述

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// 待注册的服务实例描述
///
/// 实例 ID 不由调用方提供，而是由 `名称-地址-端口` 推导而来，
/// 同一三元组重复注册会覆盖注册中心中的旧记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// 服务名称
    pub name: String,

    /// 服务地址（IP 或主机名）
    pub address: String,

    /// 服务端口，必须大于 0
    pub port: u16,

    /// 标签（可为空）
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ServiceDescriptor {
    /// 创建新的服务描述
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            tags: Vec::new(),
        }
    }

    /// 添加标签（重复标签忽略）
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 批量添加标签
    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter().fold(self, |descriptor, tag| descriptor.with_tag(tag))
    }

    /// 推导实例 ID：`<name>-<address>-<port>`
    pub fn instance_id(&self) -> String {
        format!("{}-{}-{}", self.name, self.address, self.port)
    }

    /// 对外地址：`<address>:<port>`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// 校验注册参数
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(RegistryError::validation("service name must not be empty"));
        }
        if self.address.is_empty() {
            return Err(RegistryError::validation("service address must not be empty"));
        }
        if self.port == 0 {
            return Err(RegistryError::validation("service port must be greater than 0"));
        }
        Ok(())
    }
}
