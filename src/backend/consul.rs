//! Consul HTTP API 后端

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::RegistryBackend;
use crate::config::RegistryConfig;
use crate::descriptor::ServiceDescriptor;
use crate::error::{RegistryError, Result};
use crate::filter::FilterExpression;
use crate::instance::ServiceInstance;

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Consul 注册中心后端
///
/// 构造时只做本地配置校验，不发起网络请求。
#[derive(Debug, Clone)]
pub struct ConsulBackend {
    http_client: HttpClient,
    base_url: Url,
    datacenter: Option<String>,
}

#[allow(non_snake_case)]
#[derive(Serialize)]
struct ConsulServiceRegistration<'a> {
    ID: String,
    Name: &'a str,
    Address: &'a str,
    Port: u16,
    Tags: &'a [String],
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulAgentService {
    ID: String,
    Service: String,
    #[serde(default)]
    Address: String,
    Port: u16,
    #[serde(default)]
    Tags: Option<Vec<String>>,
    #[serde(default)]
    Meta: Option<HashMap<String, String>>,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulHealthEntry {
    #[serde(default)]
    Node: Option<ConsulNode>,
    Service: ConsulAgentService,
    #[serde(default)]
    Checks: Vec<ConsulCheck>,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulNode {
    #[serde(default)]
    Address: String,
}

#[allow(non_snake_case)]
#[derive(Deserialize)]
struct ConsulCheck {
    Status: String,
}

impl ConsulAgentService {
    fn into_instance(self, healthy: Option<bool>) -> ServiceInstance {
        ServiceInstance {
            instance_id: self.ID,
            name: self.Service,
            address: self.Address,
            port: self.Port,
            tags: self.Tags.unwrap_or_default(),
            meta: self.Meta.unwrap_or_default(),
            healthy,
        }
    }
}

impl ConsulHealthEntry {
    fn into_instance(self) -> ServiceInstance {
        let healthy = self.Checks.iter().all(|check| check.Status == "passing");
        let mut instance = self.Service.into_instance(Some(healthy));
        // 服务未单独设置地址时沿用节点地址
        if instance.address.is_empty() {
            if let Some(node) = self.Node {
                instance.address = node.Address;
            }
        }
        instance
    }
}

impl ConsulBackend {
    /// 创建新的 Consul 后端
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let base_url = parse_address(&config.address)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| RegistryError::config(format!("invalid ACL token: {e}")))?;
            headers.insert(TOKEN_HEADER, value);
        }

        let mut builder = HttpClient::builder().default_headers(headers);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| RegistryError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
            datacenter: config.datacenter.clone(),
        })
    }

    /// agent 基础地址
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::config("registry address cannot be used as a base URL"))?
            .pop_if_empty()
            .extend(segments);

        let mut request = self.http_client.request(method, url);
        if let Some(dc) = &self.datacenter {
            request = request.query(&[("dc", dc.as_str())]);
        }
        Ok(request)
    }

    async fn send(operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::backend(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::backend(
                operation,
                format!("unexpected status {status}: {}", body.trim()),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl RegistryBackend for ConsulBackend {
    async fn register(&self, descriptor: &ServiceDescriptor) -> Result<()> {
        let payload = ConsulServiceRegistration {
            ID: descriptor.instance_id(),
            Name: &descriptor.name,
            Address: &descriptor.address,
            Port: descriptor.port,
            Tags: &descriptor.tags,
        };

        let request = self
            .request(Method::PUT, &["v1", "agent", "service", "register"])?
            .json(&payload);
        Self::send("register", request).await?;
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        let request = self.request(
            Method::PUT,
            &["v1", "agent", "service", "deregister", instance_id],
        )?;
        Self::send("deregister", request).await?;
        Ok(())
    }

    async fn services_with_filter(
        &self,
        filter: &FilterExpression,
    ) -> Result<HashMap<String, ServiceInstance>> {
        let request = self
            .request(Method::GET, &["v1", "agent", "services"])?
            .query(&[("filter", filter.as_str())]);

        let services: HashMap<String, ConsulAgentService> = Self::send("list", request)
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::backend("list", format!("invalid response body: {e}")))?;

        Ok(services
            .into_iter()
            .map(|(id, service)| (id, service.into_instance(None)))
            .collect())
    }

    async fn health_service(
        &self,
        service_name: &str,
        passing_only: bool,
    ) -> Result<Vec<ServiceInstance>> {
        let mut request = self.request(Method::GET, &["v1", "health", "service", service_name])?;
        if passing_only {
            request = request.query(&[("passing", "true")]);
        }

        let entries: Vec<ConsulHealthEntry> = Self::send("health", request)
            .await?
            .json()
            .await
            .map_err(|e| RegistryError::backend("health", format!("invalid response body: {e}")))?;

        Ok(entries
            .into_iter()
            .map(ConsulHealthEntry::into_instance)
            .collect())
    }
}

/// 解析 agent 地址
///
/// 接受 `host:port` 或 `http(s)://host:port`，缺省协议时使用 http。
pub(crate) fn parse_address(address: &str) -> Result<Url> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::config("registry address is empty"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| RegistryError::config(format!("invalid registry address {address:?}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RegistryError::config(format!(
            "unsupported registry scheme {:?}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(RegistryError::config(format!(
            "registry address {address:?} has no host"
        )));
    }
    Ok(url)
}
