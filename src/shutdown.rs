//! 优雅停机
//!
//! 进程内只有一个 [`ShutdownCoordinator`]，它跟踪所有已注册的实例 ID，
//! 在停机时统一注销且只执行一次。[`ShutdownWatcher`] 是唯一的后台任务，
//! 等待 SIGINT / SIGTERM 后触发协调器。默认在注销完成后按失败策略的退出码
//! 结束进程；`exit_on_signal = false` 时只发布 [`ShutdownOutcome`]，
//! 嵌入方需要自己等待 [`ShutdownCoordinator::wait`] 并退出。

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{FailurePolicy, ShutdownConfig};
use crate::deregistrar::Deregistrar;
use crate::observer::{RegistryEvent, RegistryObserver};

/// 停机注销结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownOutcome {
    /// 注销成功的实例 ID
    pub deregistered: Vec<String>,
    /// 注销失败的实例 ID 及错误信息
    pub failed: Vec<(String, String)>,
}

impl ShutdownOutcome {
    /// 是否全部注销成功
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// 按策略计算进程退出码
    pub fn exit_code(&self, policy: FailurePolicy) -> i32 {
        match policy {
            FailurePolicy::BestEffort => 0,
            FailurePolicy::Strict if self.is_clean() => 0,
            FailurePolicy::Strict => 1,
        }
    }
}

/// 跟踪中的实例，`draining` 置位后不再接收新实例
#[derive(Default)]
struct ActiveInstances {
    ids: BTreeSet<String>,
    draining: bool,
}

/// 进程级停机协调器
pub struct ShutdownCoordinator {
    deregistrar: Deregistrar,
    observer: Arc<dyn RegistryObserver>,
    config: ShutdownConfig,
    active: Mutex<ActiveInstances>,
    outcome: OnceCell<ShutdownOutcome>,
    outcome_tx: watch::Sender<Option<ShutdownOutcome>>,
    watcher_started: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new(
        deregistrar: Deregistrar,
        observer: Arc<dyn RegistryObserver>,
        config: ShutdownConfig,
    ) -> Self {
        let (outcome_tx, _) = watch::channel(None);
        Self {
            deregistrar,
            observer,
            config,
            active: Mutex::new(ActiveInstances::default()),
            outcome: OnceCell::new(),
            outcome_tx,
            watcher_started: AtomicBool::new(false),
        }
    }

    fn active_set(&self) -> MutexGuard<'_, ActiveInstances> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ShutdownConfig {
        &self.config
    }

    /// 开始跟踪实例，同一 ID 只跟踪一次
    ///
    /// 停机注销已经开始时不再接收，返回 `false`，实例需要调用方自行注销。
    pub fn track(&self, instance_id: &str) -> bool {
        let mut active = self.active_set();
        if active.draining {
            warn!(
                instance_id = %instance_id,
                "Instance registered after shutdown started, it will not be deregistered automatically"
            );
            return false;
        }
        active.ids.insert(instance_id.to_string());
        true
    }

    /// 停止跟踪实例（已显式注销）
    pub fn untrack(&self, instance_id: &str) {
        self.active_set().ids.remove(instance_id);
    }

    fn drain_active(&self) -> Vec<String> {
        let mut active = self.active_set();
        active.draining = true;
        std::mem::take(&mut active.ids).into_iter().collect()
    }

    /// 当前跟踪的实例 ID（有序）
    pub fn active(&self) -> Vec<String> {
        self.active_set().ids.iter().cloned().collect()
    }

    /// 注销所有跟踪的实例
    ///
    /// 只执行一次，之后的调用（包括并发调用）直接返回第一次的结果。
    pub async fn shutdown(&self) -> ShutdownOutcome {
        self.outcome
            .get_or_init(|| self.deregister_all())
            .await
            .clone()
    }

    async fn deregister_all(&self) -> ShutdownOutcome {
        let instance_ids = self.drain_active();

        let mut outcome = ShutdownOutcome::default();
        for instance_id in instance_ids {
            match self.deregistrar.deregister(&instance_id).await {
                Ok(()) => outcome.deregistered.push(instance_id),
                Err(e) => outcome.failed.push((instance_id, e.to_string())),
            }
        }

        self.observer.on_event(&RegistryEvent::ShutdownCompleted {
            deregistered: outcome.deregistered.len(),
            failed: outcome.failed.len(),
        });
        self.outcome_tx.send_replace(Some(outcome.clone()));
        outcome
    }

    /// 等待停机注销完成
    pub async fn wait(&self) -> ShutdownOutcome {
        let mut rx = self.outcome_tx.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or_default(),
            Err(_) => ShutdownOutcome::default(),
        }
    }

    /// 启动信号监听任务（进程内只启动一次）
    pub(crate) fn ensure_watcher(self: &Arc<Self>) {
        if !self.watcher_started.swap(true, Ordering::SeqCst) {
            ShutdownWatcher::spawn(self.clone());
        }
    }
}

/// 终止信号监听任务
pub struct ShutdownWatcher;

impl ShutdownWatcher {
    /// 监听 SIGINT / SIGTERM
    pub fn spawn(coordinator: Arc<ShutdownCoordinator>) -> JoinHandle<()> {
        Self::spawn_with_trigger(coordinator, wait_for_signal())
    }

    /// 以任意 future 作为停机触发源
    ///
    /// 触发后先完成注销，再按配置决定是否结束进程。
    pub fn spawn_with_trigger<F>(coordinator: Arc<ShutdownCoordinator>, trigger: F) -> JoinHandle<()>
    where
        F: Future<Output = &'static str> + Send + 'static,
    {
        tokio::spawn(async move {
            let signal = trigger.await;
            coordinator
                .observer
                .on_event(&RegistryEvent::ShutdownSignal { signal });

            let outcome = coordinator.shutdown().await;

            if coordinator.config.exit_on_signal {
                let code = outcome.exit_code(coordinator.config.failure_policy);
                info!(exit_code = code, "Exiting process after deregistration");
                std::process::exit(code);
            }
        })
    }
}

/// 等待 Ctrl+C 或 SIGTERM，返回信号名
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, InMemoryBackend};
    use crate::connection::Connection;
    use crate::instance::ServiceInstance;
    use crate::observer::RecordingObserver;
    use tokio::sync::oneshot;

    fn coordinator(
        backend: Arc<InMemoryBackend>,
        observer: Arc<RecordingObserver>,
        config: ShutdownConfig,
    ) -> Arc<ShutdownCoordinator> {
        let deregistrar = Deregistrar::new(Connection::with_backend(backend), observer.clone());
        Arc::new(ShutdownCoordinator::new(deregistrar, observer, config))
    }

    fn seeded_backend(ids: &[&str]) -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        for id in ids {
            backend.insert(ServiceInstance::new(*id, "svc", "10.0.0.1", 80));
        }
        backend
    }

    #[tokio::test]
    async fn shutdown_runs_exactly_once() {
        let backend = seeded_backend(&["a", "b"]);
        let observer = Arc::new(RecordingObserver::new());
        let coordinator = coordinator(backend.clone(), observer, ShutdownConfig::default());
        coordinator.track("a");
        coordinator.track("b");
        coordinator.track("a");

        let (first, second) = tokio::join!(coordinator.shutdown(), coordinator.shutdown());
        assert_eq!(first, second);
        assert_eq!(first.deregistered, vec!["a".to_string(), "b".to_string()]);
        assert!(first.is_clean());

        let third = coordinator.shutdown().await;
        assert_eq!(third, first);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Deregister("a".to_string()),
                BackendCall::Deregister("b".to_string()),
            ]
        );
        assert!(coordinator.active().is_empty());
    }

    #[tokio::test]
    async fn untracked_instances_are_skipped() {
        let backend = seeded_backend(&["a", "b"]);
        let coordinator = coordinator(
            backend.clone(),
            Arc::new(RecordingObserver::new()),
            ShutdownConfig::default(),
        );
        coordinator.track("a");
        coordinator.track("b");
        coordinator.untrack("a");

        let outcome = coordinator.shutdown().await;
        assert_eq!(outcome.deregistered, vec!["b".to_string()]);
        assert!(backend.contains("a"));
    }

    #[tokio::test]
    async fn failures_are_recorded_not_returned() {
        let backend = seeded_backend(&["a"]);
        backend.fail("deregister");
        let observer = Arc::new(RecordingObserver::new());
        let coordinator = coordinator(backend, observer.clone(), ShutdownConfig::default());
        coordinator.track("a");

        let outcome = coordinator.shutdown().await;
        assert!(!outcome.is_clean());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "a");
        assert_eq!(outcome.exit_code(FailurePolicy::BestEffort), 0);
        assert_eq!(outcome.exit_code(FailurePolicy::Strict), 1);

        assert!(observer.events().contains(&RegistryEvent::ShutdownCompleted {
            deregistered: 0,
            failed: 1
        }));
    }

    #[test]
    fn clean_outcome_exits_zero_under_any_policy() {
        let outcome = ShutdownOutcome {
            deregistered: vec!["a".to_string()],
            failed: vec![],
        };
        assert_eq!(outcome.exit_code(FailurePolicy::BestEffort), 0);
        assert_eq!(outcome.exit_code(FailurePolicy::Strict), 0);
    }

    #[tokio::test]
    async fn watcher_deregisters_before_publishing_outcome() {
        let backend = seeded_backend(&["api-127.0.0.1-9000"]);
        let observer = Arc::new(RecordingObserver::new());
        let coordinator = coordinator(
            backend.clone(),
            observer.clone(),
            ShutdownConfig::default().with_exit_on_signal(false),
        );
        coordinator.track("api-127.0.0.1-9000");

        let (tx, rx) = oneshot::channel::<()>();
        let handle = ShutdownWatcher::spawn_with_trigger(coordinator.clone(), async move {
            let _ = rx.await;
            "SIGTERM"
        });

        tx.send(()).unwrap();
        let outcome = coordinator.wait().await;
        handle.await.unwrap();

        assert_eq!(outcome.deregistered, vec!["api-127.0.0.1-9000".to_string()]);
        assert!(!backend.contains("api-127.0.0.1-9000"));

        let events = observer.events();
        assert_eq!(events[0], RegistryEvent::ShutdownSignal { signal: "SIGTERM" });
        assert_eq!(
            events.last(),
            Some(&RegistryEvent::ShutdownCompleted {
                deregistered: 1,
                failed: 0
            })
        );
    }

    #[tokio::test]
    async fn late_registration_is_refused_once_draining() {
        let backend = seeded_backend(&["a", "late"]);
        let coordinator = coordinator(
            backend.clone(),
            Arc::new(RecordingObserver::new()),
            ShutdownConfig::default(),
        );
        assert!(coordinator.track("a"));

        // 模拟注销循环已取走集合但尚未完成时的并发注册
        assert_eq!(coordinator.drain_active(), vec!["a".to_string()]);
        assert!(!coordinator.track("late"));
        assert!(coordinator.active().is_empty());

        let outcome = coordinator.shutdown().await;
        assert!(outcome.deregistered.is_empty());
        assert!(!coordinator.track("late"));
        assert!(coordinator.active().is_empty());
        assert!(backend.contains("late"));
        assert!(
            !backend
                .calls()
                .contains(&BackendCall::Deregister("late".to_string()))
        );
    }

    #[tokio::test]
    async fn wait_returns_immediately_after_shutdown() {
        let coordinator = coordinator(
            seeded_backend(&[]),
            Arc::new(RecordingObserver::new()),
            ShutdownConfig::default(),
        );
        let outcome = coordinator.shutdown().await;
        assert_eq!(coordinator.wait().await, outcome);
    }
}
