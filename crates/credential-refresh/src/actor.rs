//! Credential refresh actor
//!
//! Runs a refresh cycle at startup and then every `REFRESH_PERIOD`, each one
//! spawned as its own task so a slow cycle never delays the schedule. A cycle
//! makes sure the proxy pool is loaded, then calls the credential source until
//! it succeeds and publishes the credential as one `RefreshMessage`.
//!
//! Failure handling per cycle:
//! - proxy init error: logged, cycle ends without publishing
//! - credential fetch error: logged at debug, retried after the retry delay,
//!   with no attempt cap
//! - panic inside a cycle: caught by the task boundary and logged; the
//!   schedule keeps running

use std::sync::Arc;
use std::time::Duration;

use marketplace::{Credential, CredentialSource, ProxyPool};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Interval between refresh cycles.
pub const REFRESH_PERIOD: Duration = Duration::from_millis(60_000);

/// Messages from the actor to the bridge, delivered in send order.
#[derive(Debug)]
pub enum RefreshMessage {
    /// A freshly fetched credential
    Credential(Credential),
    /// The actor stopped scheduling cycles
    Shutdown,
}

/// Control messages from a `RefreshHandle` to the actor.
#[derive(Debug)]
pub(crate) enum Control {
    Shutdown,
}

/// Owns the collaborators of one refresh context.
///
/// In background mode the actor gets its own proxy pool and credential source
/// instances; it shares nothing with the monitor loop except the outbox.
pub struct RefreshActor {
    proxies: Arc<dyn ProxyPool>,
    source: Arc<dyn CredentialSource>,
    retry: RetryPolicy,
    period: Duration,
    outbox: mpsc::UnboundedSender<RefreshMessage>,
}

impl RefreshActor {
    /// Create an actor with the production retry delay and period.
    pub fn new(
        proxies: Arc<dyn ProxyPool>,
        source: Arc<dyn CredentialSource>,
        outbox: mpsc::UnboundedSender<RefreshMessage>,
    ) -> Self {
        Self {
            proxies,
            source,
            retry: RetryPolicy::default(),
            period: REFRESH_PERIOD,
            outbox,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run one cycle. Errors stop at this boundary and are only logged.
    pub async fn run_cycle(&self) {
        if let Err(e) = self.try_cycle().await {
            error!(error = %e, "credential refresh cycle failed");
        }
    }

    /// Run one cycle and return the published credential.
    ///
    /// Only returns once a credential has been fetched, or with an error if
    /// the proxy pool could not be initialized.
    pub async fn try_cycle(&self) -> Result<Credential> {
        info!("starting credential refresh cycle");

        if !self.proxies.is_ready() {
            info!("initializing proxy pool");
            self.proxies.init().await.map_err(Error::ProxyInit)?;
            info!("proxy pool initialized");
        }

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.source.fetch().await {
                Ok(credential) => {
                    info!(attempt, "credential fetched");
                    self.publish(credential.clone());
                    return Ok(credential);
                }
                Err(e) => {
                    debug!(attempt, error = %e, "credential fetch failed, retrying");
                    metrics::counter!("credential_refresh_attempt_failures_total").increment(1);
                    self.retry.wait().await;
                }
            }
        }
    }

    fn publish(&self, credential: Credential) {
        if self
            .outbox
            .send(RefreshMessage::Credential(credential))
            .is_err()
        {
            warn!("credential bridge closed, dropping published credential");
            return;
        }
        metrics::counter!("credential_refresh_published_total").increment(1);
        info!("credential published");
    }

    /// Schedule loop: one cycle immediately, then one per period, until shutdown.
    pub(crate) async fn run(self: Arc<Self>, mut control: mpsc::UnboundedReceiver<Control>) {
        let mut ticker = tokio::time::interval(self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.spawn_cycle(),
                message = control.recv() => match message {
                    Some(Control::Shutdown) => break,
                    None => {
                        debug!("refresh handle dropped, scheduling until process exit");
                        loop {
                            ticker.tick().await;
                            self.spawn_cycle();
                        }
                    }
                },
            }
        }

        info!("refresh actor stopped scheduling cycles");
        let _ = self.outbox.send(RefreshMessage::Shutdown);
    }

    /// Cycles may overlap; no lock is taken between them.
    fn spawn_cycle(self: &Arc<Self>) {
        let actor = Arc::clone(self);
        let cycle = tokio::spawn(async move { actor.run_cycle().await });
        tokio::spawn(async move {
            if let Err(e) = cycle.await {
                error!(error = %e, "credential refresh cycle aborted");
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use marketplace::BoxFuture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Pool that becomes ready after its first successful init.
    #[derive(Default)]
    pub(crate) struct FakePool {
        pub inits: AtomicUsize,
        pub ready_checks: AtomicUsize,
        pub ready: AtomicBool,
        pub fail_init: bool,
    }

    impl ProxyPool for FakePool {
        fn init(&self) -> BoxFuture<'_, marketplace::Result<()>> {
            Box::pin(async move {
                self.inits.fetch_add(1, Ordering::SeqCst);
                if self.fail_init {
                    return Err(marketplace::Error::Proxy("file missing".into()));
                }
                self.ready.store(true, Ordering::SeqCst);
                Ok(())
            })
        }

        fn is_ready(&self) -> bool {
            self.ready_checks.fetch_add(1, Ordering::SeqCst);
            self.ready.load(Ordering::SeqCst)
        }
    }

    /// Source that fails `failures` times, then hands out tokens in order.
    pub(crate) struct ScriptedSource {
        pub failures: AtomicUsize,
        pub attempts: AtomicUsize,
        pub tokens: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        pub fn new(failures: usize, tokens: &[&str]) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                attempts: AtomicUsize::new(0),
                tokens: Mutex::new(tokens.iter().rev().map(|t| t.to_string()).collect()),
            }
        }

        pub fn always_failing() -> Self {
            Self::new(usize::MAX, &[])
        }
    }

    impl CredentialSource for ScriptedSource {
        fn fetch(&self) -> BoxFuture<'_, marketplace::Result<Credential>> {
            Box::pin(async move {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                let remaining = self.failures.load(Ordering::SeqCst);
                if remaining > 0 {
                    self.failures.store(remaining - 1, Ordering::SeqCst);
                    return Err(marketplace::Error::RateLimited);
                }
                let token = self.tokens.lock().unwrap().pop();
                match token {
                    Some(token) => Credential::new(token),
                    None => Err(marketplace::Error::MissingCredential("script exhausted".into())),
                }
            })
        }
    }

    fn actor(
        pool: Arc<FakePool>,
        source: Arc<ScriptedSource>,
    ) -> (RefreshActor, mpsc::UnboundedReceiver<RefreshMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = RefreshActor::new(pool, source, tx).with_retry(RetryPolicy::immediate());
        (actor, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RefreshMessage>) -> Vec<String> {
        let mut tokens = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let RefreshMessage::Credential(c) = message {
                tokens.push(c.expose().to_string());
            }
        }
        tokens
    }

    #[tokio::test]
    async fn publishes_once_after_any_number_of_failures() {
        for failures in [0usize, 1, 5, 50] {
            let pool = Arc::new(FakePool::default());
            let source = Arc::new(ScriptedSource::new(failures, &["tok"]));
            let (actor, mut rx) = actor(pool, source.clone());

            let credential = actor.try_cycle().await.unwrap();

            assert_eq!(credential.expose(), "tok");
            assert_eq!(source.attempts.load(Ordering::SeqCst), failures + 1);
            assert_eq!(drain(&mut rx), vec!["tok"], "failures = {failures}");
        }
    }

    #[tokio::test]
    async fn cycle_records_failures_and_publish() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let pool = Arc::new(FakePool::default());
        let source = Arc::new(ScriptedSource::new(3, &["tok"]));
        let (actor, _rx) = actor(pool, source);
        actor.run_cycle().await;

        let output = handle.render();
        assert!(
            output.contains("credential_refresh_attempt_failures_total 3"),
            "got:\n{output}"
        );
        assert!(
            output.contains("credential_refresh_published_total 1"),
            "got:\n{output}"
        );
    }

    #[tokio::test]
    async fn proxy_pool_initialized_once_across_cycles() {
        let pool = Arc::new(FakePool::default());
        let source = Arc::new(ScriptedSource::new(0, &["a", "b", "c"]));
        let (actor, mut rx) = actor(pool.clone(), source);

        actor.run_cycle().await;
        actor.run_cycle().await;
        actor.run_cycle().await;

        assert_eq!(pool.inits.load(Ordering::SeqCst), 1);
        assert_eq!(pool.ready_checks.load(Ordering::SeqCst), 3);
        assert_eq!(drain(&mut rx), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn proxy_init_failure_ends_cycle_without_fetching() {
        let pool = Arc::new(FakePool {
            fail_init: true,
            ..FakePool::default()
        });
        let source = Arc::new(ScriptedSource::new(0, &["tok"]));
        let (actor, mut rx) = actor(pool.clone(), source.clone());

        let err = actor.try_cycle().await.unwrap_err();
        assert!(matches!(err, Error::ProxyInit(_)), "got: {err}");

        // run_cycle swallows the same failure
        actor.run_cycle().await;

        assert_eq!(pool.inits.load(Ordering::SeqCst), 2);
        assert_eq!(source.attempts.load(Ordering::SeqCst), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn publish_with_closed_bridge_does_not_fail_cycle() {
        let pool = Arc::new(FakePool::default());
        let source = Arc::new(ScriptedSource::new(0, &["tok"]));
        let (actor, rx) = actor(pool, source);
        drop(rx);

        let credential = actor.try_cycle().await.unwrap();
        assert_eq!(credential.expose(), "tok");
    }

    #[tokio::test(start_paused = true)]
    async fn failing_cycles_overlap_on_schedule() {
        let pool = Arc::new(FakePool::default());
        let source = Arc::new(ScriptedSource::always_failing());
        let (tx, _rx) = mpsc::unbounded_channel();
        let actor = Arc::new(
            RefreshActor::new(pool.clone(), source.clone(), tx)
                .with_retry(RetryPolicy::fixed(Duration::from_millis(200))),
        );
        let (_control_tx, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(actor.run(control_rx));

        // Cycles start at t=0, 60s and 120s; none of them ever finishes.
        tokio::time::sleep(Duration::from_secs(121)).await;

        assert_eq!(pool.ready_checks.load(Ordering::SeqCst), 3);
        let attempts = source.attempts.load(Ordering::SeqCst);
        // ~605 from the first cycle, ~305 from the second, ~5 from the third
        assert!(attempts > 800, "attempts = {attempts}");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_schedule_and_notifies_bridge() {
        let pool = Arc::new(FakePool::default());
        let source = Arc::new(ScriptedSource::new(0, &["a", "b", "c"]));
        let (actor, mut rx) = actor(pool.clone(), source);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Arc::new(actor).run(control_rx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        control_tx.send(Control::Shutdown).unwrap();
        task.await.unwrap();

        tokio::time::sleep(Duration::from_secs(180)).await;

        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        assert_eq!(messages.len(), 2, "got: {messages:?}");
        assert!(matches!(&messages[0], RefreshMessage::Credential(c) if c.expose() == "a"));
        assert!(matches!(messages[1], RefreshMessage::Shutdown));
        assert_eq!(pool.ready_checks.load(Ordering::SeqCst), 1);
    }
}
