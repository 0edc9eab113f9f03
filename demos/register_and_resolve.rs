//! 注册本进程、解析下游服务，收到 Ctrl+C / SIGTERM 后注销并退出
//!
//! ```bash
//! cargo run --example register_and_resolve -- 127.0.0.1:8500 billing
//! ```

use anyhow::Context;
use flare_registry_client::{
    Connection, LogFormat, RegistryConfig, RegistryError, ServiceDescriptor, ServiceRegistry,
    init_tracing,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,flare_registry_client=debug", LogFormat::Pretty)
        .map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))?;

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "127.0.0.1:8500".to_string());
    let downstream = args.next().unwrap_or_else(|| "billing".to_string());

    let config = RegistryConfig::new(address);
    let connection = Connection::from_config(&config).context("failed to build Consul connection")?;
    let registry = ServiceRegistry::builder(connection)
        // 由 demo 自己打印停机结果后退出
        .with_shutdown_config(config.shutdown.clone().with_exit_on_signal(false))
        .build();

    let registration = registry
        .register(ServiceDescriptor::new("demo-api", "127.0.0.1", 9000).with_tag("demo"))
        .await
        .context("failed to register demo-api")?;
    info!(instance_id = %registration.instance_id(), "Registered, press Ctrl+C to stop");

    match registry.resolve(&downstream).await {
        Ok(address) => info!(service = %downstream, address = %address, "Resolved downstream"),
        Err(RegistryError::NotFound { service }) => {
            warn!(service = %service, "Downstream has no instances yet")
        }
        Err(e) => return Err(e).context("failed to resolve downstream"),
    }

    let outcome = registry.wait_for_shutdown().await;
    let code = outcome.exit_code(registry.shutdown_config().failure_policy);
    info!(
        deregistered = outcome.deregistered.len(),
        failed = outcome.failed.len(),
        exit_code = code,
        "Demo stopped"
    );
    std::process::exit(code);
}
