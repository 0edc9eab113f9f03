//! Consul 后端集成测试
//!
//! 这些测试需要运行中的 Consul agent。
//! 默认情况下，测试会被忽略，需要使用 `cargo test --test consul_backend_test -- --ignored` 运行。
//!
//! 启动 Consul：
//! ```bash
//! docker run -d --name consul-test -p 8500:8500 hashicorp/consul:1.17 agent -dev -client=0.0.0.0
//! ```

use flare_registry_client::{Connection, RegistryError, ServiceDescriptor, ServiceRegistry};
use tokio::time::{Duration, sleep};

/// Consul 地址
/// 可以通过环境变量 CONSUL_HTTP_ADDR 覆盖，默认为 127.0.0.1:8500
fn consul_address() -> String {
    std::env::var("CONSUL_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8500".to_string())
}

fn create_registry() -> ServiceRegistry {
    let connection = Connection::new(&consul_address()).expect("Failed to build Consul connection");
    ServiceRegistry::new(connection)
}

/// 测试：注册、过滤查询、注销
#[tokio::test]
#[ignore]
async fn test_consul_register_filter_deregister() {
    let registry = create_registry();

    let registration = registry
        .register(ServiceDescriptor::new("flare-test-api", "127.0.0.1", 19000).with_tag("test"))
        .await
        .expect("Failed to register service");
    assert_eq!(registration.instance_id(), "flare-test-api-127.0.0.1-19000");

    let services = registry
        .filter_by_name("flare-test-api")
        .await
        .expect("Failed to filter services");
    let instance = services
        .get("flare-test-api-127.0.0.1-19000")
        .expect("Service instance not found after registration");
    assert_eq!(instance.port, 19000);
    assert!(instance.has_tag("test"));

    // 清理
    registration
        .deregister()
        .await
        .expect("Failed to deregister service");

    sleep(Duration::from_millis(200)).await;
    let services = registry
        .filter_by_name("flare-test-api")
        .await
        .expect("Failed to filter services");
    assert!(!services.contains_key("flare-test-api-127.0.0.1-19000"));
}

/// 测试：解析地址在多个实例间随机分布
#[tokio::test]
#[ignore]
async fn test_consul_resolve_spreads_across_instances() {
    let registry = create_registry();

    for port in [19101, 19102] {
        let _ = registry
            .register(ServiceDescriptor::new("flare-test-resolve", "127.0.0.1", port))
            .await
            .expect("Failed to register service");
    }

    let mut seen = std::collections::HashSet::new();
    for _ in 0..100 {
        seen.insert(
            registry
                .resolve("flare-test-resolve")
                .await
                .expect("Failed to resolve service"),
        );
    }
    assert_eq!(seen.len(), 2);

    let outcome = registry.shutdown().await;
    assert_eq!(outcome.deregistered.len(), 2);
    assert!(outcome.is_clean());
}

/// 测试：不存在的服务
#[tokio::test]
#[ignore]
async fn test_consul_resolve_unknown_service() {
    let registry = create_registry();
    let err = registry
        .resolve("flare-test-does-not-exist")
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
}
