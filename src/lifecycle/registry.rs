//! Lifecycle Registry
//!
//! Collects components and drives them through startup and shutdown.

use super::{Component, LifecycleError, LifecycleState, Result, Startable, Stoppable};
use std::any::Any;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

type FlushHook = Arc<dyn Fn() + Send + Sync>;

/// A capability resolved at registration time
struct LifecycleHook<T: ?Sized> {
    hook: Arc<T>,
    name: Option<String>,
}

impl<T: ?Sized> LifecycleHook<T> {
    fn new(hook: Arc<T>, name: Option<String>) -> Self {
        Self { hook, name }
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Named hooks first, then unnamed ones, each group in registration order.
fn phased<T: ?Sized>(hooks: &[LifecycleHook<T>]) -> impl Iterator<Item = &LifecycleHook<T>> {
    let named = hooks.iter().filter(|h| h.name.is_some());
    let unnamed = hooks.iter().filter(|h| h.name.is_none());
    named.chain(unnamed)
}

fn lock(state: &Mutex<LifecycleState>) -> MutexGuard<'_, LifecycleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Flushes buffered diagnostics when dropped, whichever way shutdown exits.
struct FlushGuard {
    hook: Option<FlushHook>,
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        if let Some(hook) = &self.hook {
            hook();
        }
    }
}

/// Settles the state once a `start` or `shutdown` call ends.
///
/// If the call never reaches [`finish`](Self::finish) (its future was
/// dropped, or a hook panicked through it) the state becomes `interrupted`.
struct TransitionGuard<'a> {
    state: &'a Mutex<LifecycleState>,
    interrupted: LifecycleState,
    done: bool,
}

impl<'a> TransitionGuard<'a> {
    fn new(state: &'a Mutex<LifecycleState>, interrupted: LifecycleState) -> Self {
        Self {
            state,
            interrupted,
            done: false,
        }
    }

    fn finish(mut self, next: LifecycleState) {
        *lock(self.state) = next;
        self.done = true;
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::warn!("Lifecycle call did not complete; registry is now {}", self.interrupted);
            *lock(self.state) = self.interrupted;
        }
    }
}

/// Aborts a spawned stop hook if the shutdown call waiting on it goes away.
struct AbortOnDrop(Option<AbortHandle>);

impl AbortOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Holds the startup and shutdown sequences of an application
///
/// Components are filed into the sequences by [`register`](Self::register)
/// according to the capabilities they expose. [`start`](Self::start) runs
/// named services before unnamed hooks and stops at the first error.
/// [`shutdown`](Self::shutdown) uses the same ordering but always visits every
/// hook, returning the first error it saw.
///
/// # Example
///
/// ```rust,ignore
/// use svcmgr::lifecycle::Registry;
///
/// let mut registry = Registry::new();
/// registry.register(Arc::clone(&database));
/// registry.register(Arc::clone(&http_server));
///
/// registry.start().await?;
/// // ... application runs ...
/// registry.shutdown().await?;
/// ```
pub struct Registry {
    startup_hooks: Vec<LifecycleHook<dyn Startable>>,
    shutdown_hooks: Vec<LifecycleHook<dyn Stoppable>>,
    state: Mutex<LifecycleState>,
    // Shutdown hooks (in phased order) that have already run to completion.
    stopped: AtomicUsize,
    flush_hook: Option<FlushHook>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            startup_hooks: Vec::new(),
            shutdown_hooks: Vec::new(),
            state: Mutex::new(LifecycleState::Unstarted),
            stopped: AtomicUsize::new(0),
            flush_hook: None,
        }
    }

    /// Run `hook` as the last step of every [`shutdown`](Self::shutdown),
    /// after stdout and stderr have been flushed
    pub fn with_flush_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.flush_hook = Some(Arc::new(hook));
        self
    }

    /// File a component into every sequence it has a capability for
    ///
    /// Returns how many sequences it joined (0, 1 or 2). Registering the same
    /// component twice files it twice.
    pub fn register<C>(&mut self, component: Arc<C>) -> usize
    where
        C: Component + ?Sized,
    {
        let started = self.register_startup(Arc::clone(&component));
        let stopped = self.register_shutdown(component);
        usize::from(started) + usize::from(stopped)
    }

    /// File a component into the startup sequence if it is [`Startable`]
    pub fn register_startup<C>(&mut self, component: Arc<C>) -> bool
    where
        C: Component + ?Sized,
    {
        let name = component.name();
        let Some(hook) = component.startable() else {
            return false;
        };
        self.warn_if_late(name.as_deref());
        self.startup_hooks.push(LifecycleHook::new(hook, name));
        true
    }

    /// File a component into the shutdown sequence if it is [`Stoppable`]
    pub fn register_shutdown<C>(&mut self, component: Arc<C>) -> bool
    where
        C: Component + ?Sized,
    {
        let name = component.name();
        let Some(hook) = component.stoppable() else {
            return false;
        };
        self.warn_if_late(name.as_deref());
        self.shutdown_hooks.push(LifecycleHook::new(hook, name));
        true
    }

    fn warn_if_late(&mut self, name: Option<&str>) {
        let state = *self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.has_started() {
            tracing::warn!(
                "Registering {} while registry is {}; ordering is not guaranteed",
                name.unwrap_or("<unnamed>"),
                state
            );
        }
    }

    /// Run every startup hook
    ///
    /// Named services go first, then unnamed hooks. The first failure aborts
    /// the call and is returned unchanged; components started before it are
    /// left running. If the call is cancelled or a hook panics, the registry
    /// is left `StartFailed` so that [`shutdown`](Self::shutdown) still runs.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidState`] if `start` was already called or
    /// shutdown has begun, otherwise the first hook error.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if *state != LifecycleState::Unstarted {
                return Err(LifecycleError::invalid_state("start", *state));
            }
            *state = LifecycleState::Starting;
        }
        let guard = TransitionGuard::new(&self.state, LifecycleState::StartFailed);

        tracing::info!(
            "Calling startup hooks, {} in total",
            self.startup_hooks.len()
        );

        let result = self.run_startup_hooks().await;

        guard.finish(match result {
            Ok(()) => LifecycleState::Running,
            Err(_) => LifecycleState::StartFailed,
        });

        if result.is_ok() {
            tracing::info!("Startup complete");
        }
        result
    }

    async fn run_startup_hooks(&self) -> Result<()> {
        for hook in phased(&self.startup_hooks) {
            match &hook.name {
                Some(name) => tracing::info!("Starting service: {}", name),
                None => tracing::info!("Starting unnamed hook"),
            }
            if let Err(e) = hook.hook.start().await {
                tracing::error!("Start of {} failed: {}", hook.label(), e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run [`start`](Self::start) under a deadline covering the whole call
    ///
    /// On expiry the registry is `StartFailed`.
    pub async fn start_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.start())
            .await
            .map_err(|_| {
                tracing::error!("Startup timed out after {:?}", timeout);
                LifecycleError::timeout("startup", format!("Timeout after {:?}", timeout))
            })?
    }

    /// Run every shutdown hook
    ///
    /// Every hook is called even when earlier ones fail; each failure is
    /// logged and the first is returned. A hook that panics is logged and
    /// does not stop the remaining hooks. Output is flushed on the way out,
    /// whatever the outcome.
    ///
    /// If the call is cancelled, the hook in flight is aborted and the
    /// registry becomes `ShutdownInterrupted`; calling `shutdown` again
    /// resumes with that hook and runs the ones not yet visited. Once
    /// shutdown has completed, further calls are no-ops.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidState`] while `start` or another `shutdown`
    /// is still running, otherwise the first hook error.
    pub async fn shutdown(&self) -> Result<()> {
        let _flush = FlushGuard {
            hook: self.flush_hook.clone(),
        };

        {
            let mut state = lock(&self.state);
            let current = *state;
            match current {
                LifecycleState::ShutDown => {
                    tracing::debug!("Shutdown requested while {}; nothing to do", current);
                    return Ok(());
                }
                LifecycleState::Starting | LifecycleState::ShuttingDown => {
                    return Err(LifecycleError::invalid_state("shut down", current));
                }
                _ => *state = LifecycleState::ShuttingDown,
            }
        }
        let guard = TransitionGuard::new(&self.state, LifecycleState::ShutdownInterrupted);

        let resume_at = self.stopped.load(Ordering::SeqCst);
        if resume_at > 0 {
            tracing::info!(
                "Resuming shutdown, {} of {} hooks already done",
                resume_at,
                self.shutdown_hooks.len()
            );
        } else {
            tracing::info!(
                "Calling shutdown hooks, {} in total",
                self.shutdown_hooks.len()
            );
        }

        let mut first_error = None;
        for (position, hook) in phased(&self.shutdown_hooks).enumerate().skip(resume_at) {
            match &hook.name {
                Some(name) => tracing::info!("Shutting down service: {}", name),
                None => tracing::info!("Shutting down unnamed hook"),
            }

            let stoppable = Arc::clone(&hook.hook);
            let task = tokio::spawn(async move { stoppable.shutdown().await });
            let abort = AbortOnDrop(Some(task.abort_handle()));
            let outcome = task.await;
            abort.disarm();
            self.stopped.store(position + 1, Ordering::SeqCst);

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Shutdown of {} failed: {}", hook.label(), e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(join_err) if join_err.is_panic() => {
                    let payload = join_err.into_panic();
                    tracing::error!(
                        "Recovered from panic in shutdown of {}: {}",
                        hook.label(),
                        panic_message(payload.as_ref())
                    );
                }
                Err(join_err) => {
                    tracing::error!("Shutdown of {} was aborted: {}", hook.label(), join_err);
                }
            }
        }

        guard.finish(LifecycleState::ShutDown);

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!("Shutdown complete");
                Ok(())
            }
        }
    }

    /// Run [`shutdown`](Self::shutdown) under a deadline covering the whole call
    ///
    /// On expiry the hook in flight is aborted, the registry is
    /// `ShutdownInterrupted`, and output is flushed. A later `shutdown`
    /// picks up where this one stopped.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.shutdown())
            .await
            .map_err(|_| {
                tracing::error!("Shutdown timed out after {:?}", timeout);
                LifecycleError::timeout("shutdown", format!("Timeout after {:?}", timeout))
            })?
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *lock(&self.state)
    }

    /// Get the number of registered startup hooks
    pub fn startup_hook_count(&self) -> usize {
        self.startup_hooks.len()
    }

    /// Get the number of registered shutdown hooks
    pub fn shutdown_hook_count(&self) -> usize {
        self.shutdown_hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    type CallLog = Arc<Mutex<Vec<String>>>;

    /// A component whose capabilities and failures are chosen per test
    #[derive(Default)]
    struct Recorder {
        id: &'static str,
        named: bool,
        can_start: bool,
        can_stop: bool,
        fail_start: bool,
        fail_stop: bool,
        panic_on_start: bool,
        panic_on_stop: bool,
        start_delay: Option<Duration>,
        stop_delay: Option<Duration>,
        log: CallLog,
    }

    impl Recorder {
        fn named(id: &'static str, log: &CallLog) -> Self {
            Self {
                id,
                named: true,
                can_start: true,
                can_stop: true,
                log: Arc::clone(log),
                ..Default::default()
            }
        }

        fn unnamed(id: &'static str, log: &CallLog) -> Self {
            Self {
                named: false,
                ..Self::named(id, log)
            }
        }
    }

    impl Component for Recorder {
        fn name(&self) -> Option<String> {
            self.named.then(|| self.id.to_string())
        }

        fn startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
            if self.can_start { Some(self) } else { None }
        }

        fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
            if self.can_stop { Some(self) } else { None }
        }
    }

    #[async_trait]
    impl Startable for Recorder {
        async fn start(&self) -> Result<()> {
            self.log.lock().unwrap().push(format!("start:{}", self.id));
            if let Some(delay) = self.start_delay {
                tokio::time::sleep(delay).await;
            }
            if self.panic_on_start {
                panic!("{} failed to boot", self.id);
            }
            if self.fail_start {
                return Err(LifecycleError::init_failed(self.id));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Stoppable for Recorder {
        async fn shutdown(&self) -> Result<()> {
            self.log.lock().unwrap().push(format!("stop:{}", self.id));
            if let Some(delay) = self.stop_delay {
                tokio::time::sleep(delay).await;
                self.log.lock().unwrap().push(format!("stopped:{}", self.id));
            }
            if self.panic_on_stop {
                panic!("{} blew up", self.id);
            }
            if self.fail_stop {
                return Err(LifecycleError::shutdown_failed(self.id));
            }
            Ok(())
        }
    }

    struct Inert;

    impl Component for Inert {}

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    /// Registers named A, B and unnamed C, D interleaved as C, A, D, B.
    fn abcd(log: &CallLog, tweak: impl Fn(&mut Recorder)) -> Registry {
        let mut registry = Registry::new();
        for mut recorder in [
            Recorder::unnamed("C", log),
            Recorder::named("A", log),
            Recorder::unnamed("D", log),
            Recorder::named("B", log),
        ] {
            tweak(&mut recorder);
            registry.register(Arc::new(recorder));
        }
        registry
    }

    #[test]
    fn test_register_counts_capabilities() {
        let log = CallLog::default();
        let mut registry = Registry::new();

        assert_eq!(registry.register(Arc::new(Recorder::named("both", &log))), 2);
        let start_only = Recorder {
            can_stop: false,
            ..Recorder::named("start", &log)
        };
        assert_eq!(registry.register(Arc::new(start_only)), 1);
        let stop_only = Recorder {
            can_start: false,
            ..Recorder::unnamed("stop", &log)
        };
        assert_eq!(registry.register(Arc::new(stop_only)), 1);

        assert_eq!(registry.startup_hook_count(), 2);
        assert_eq!(registry.shutdown_hook_count(), 2);
    }

    #[test]
    fn test_register_without_capabilities_is_noop() {
        let mut registry = Registry::new();
        assert_eq!(registry.register(Arc::new(Inert)), 0);
        assert!(!registry.register_startup(Arc::new(Inert)));
        assert!(!registry.register_shutdown(Arc::new(Inert)));
        assert_eq!(registry.startup_hook_count(), 0);
        assert_eq!(registry.shutdown_hook_count(), 0);
    }

    #[test]
    fn test_register_accepts_trait_objects() {
        let log = CallLog::default();
        let component: Arc<dyn Component> = Arc::new(Recorder::named("dyn", &log));
        let mut registry = Registry::new();
        assert_eq!(registry.register(component), 2);
    }

    #[tokio::test]
    async fn test_start_runs_named_before_unnamed() {
        let log = CallLog::default();
        let registry = abcd(&log, |_| {});

        registry.start().await.unwrap();

        assert_eq!(calls(&log), ["start:A", "start:B", "start:C", "start:D"]);
        assert_eq!(registry.state(), LifecycleState::Running);
    }

    #[tokio::test]
    async fn test_start_fails_fast() {
        init_tracing();
        let log = CallLog::default();
        let registry = abcd(&log, |p| p.fail_start = p.id == "B");

        let err = registry.start().await.unwrap_err();

        assert_eq!(err, LifecycleError::init_failed("B"));
        assert_eq!(calls(&log), ["start:A", "start:B"]);
        assert_eq!(registry.state(), LifecycleState::StartFailed);
    }

    #[tokio::test]
    async fn test_start_failure_in_unnamed_phase() {
        let log = CallLog::default();
        let registry = abcd(&log, |p| p.fail_start = p.id == "C");

        let err = registry.start().await.unwrap_err();

        assert_eq!(err, LifecycleError::init_failed("C"));
        assert_eq!(calls(&log), ["start:A", "start:B", "start:C"]);
    }

    #[tokio::test]
    async fn test_shutdown_is_best_effort() {
        init_tracing();
        let log = CallLog::default();
        let registry = abcd(&log, |p| p.fail_stop = matches!(p.id, "B" | "D"));

        let err = registry.shutdown().await.unwrap_err();

        assert_eq!(err, LifecycleError::shutdown_failed("B"));
        assert_eq!(calls(&log), ["stop:A", "stop:B", "stop:C", "stop:D"]);
        assert_eq!(registry.state(), LifecycleState::ShutDown);
    }

    #[tokio::test]
    async fn test_shutdown_recovers_from_panic() {
        init_tracing();
        let log = CallLog::default();
        let registry = abcd(&log, |p| p.panic_on_stop = matches!(p.id, "A" | "C"));

        registry.shutdown().await.unwrap();

        assert_eq!(calls(&log), ["stop:A", "stop:B", "stop:C", "stop:D"]);
    }

    #[tokio::test]
    async fn test_shutdown_panic_does_not_mask_error() {
        let log = CallLog::default();
        let registry = abcd(&log, |p| {
            p.panic_on_stop = p.id == "A";
            p.fail_stop = p.id == "D";
        });

        let err = registry.shutdown().await.unwrap_err();

        assert_eq!(err, LifecycleError::shutdown_failed("D"));
        assert_eq!(calls(&log).len(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_registration_runs_twice() {
        let log = CallLog::default();
        let recorder = Arc::new(Recorder::named("dup", &log));
        let mut registry = Registry::new();
        registry.register(Arc::clone(&recorder));
        registry.register(recorder);

        registry.start().await.unwrap();
        registry.shutdown().await.unwrap();

        assert_eq!(
            calls(&log),
            ["start:dup", "start:dup", "stop:dup", "stop:dup"]
        );
    }

    #[tokio::test]
    async fn test_sequences_keep_their_own_order() {
        let log = CallLog::default();
        let mut registry = Registry::new();
        let first = Recorder {
            can_stop: false,
            ..Recorder::named("first", &log)
        };
        let second = Recorder::named("second", &log);
        let third = Recorder {
            can_start: false,
            ..Recorder::named("third", &log)
        };
        // "third" joins the shutdown sequence before "second" does
        registry.register_shutdown(Arc::new(third));
        registry.register(Arc::new(first));
        registry.register(Arc::new(second));

        registry.start().await.unwrap();
        registry.shutdown().await.unwrap();

        assert_eq!(
            calls(&log),
            ["start:first", "start:second", "stop:third", "stop:second"]
        );
    }

    #[tokio::test]
    async fn test_shutdown_always_flushes() {
        let flushed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&flushed);
        let log = CallLog::default();
        let mut registry = Registry::new().with_flush_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.register(Arc::new(Recorder {
            fail_stop: true,
            ..Recorder::named("failing", &log)
        }));

        assert!(registry.shutdown().await.is_err());
        assert_eq!(flushed.load(Ordering::SeqCst), 1);

        // the no-op repeat flushes as well
        registry.shutdown().await.unwrap();
        assert_eq!(flushed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_shutdown_still_flushes() {
        let flushed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&flushed);
        let log = CallLog::default();
        let mut registry = Registry::new().with_flush_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.register(Arc::new(Recorder {
            start_delay: Some(Duration::from_secs(3600)),
            ..Recorder::named("slow", &log)
        }));

        tokio::select! {
            biased;
            _ = registry.start() => unreachable!("start should still be running"),
            result = registry.shutdown() => {
                assert_eq!(
                    result,
                    Err(LifecycleError::invalid_state("shut down", LifecycleState::Starting))
                );
            }
        }

        assert_eq!(flushed.load(Ordering::SeqCst), 1);
        assert_eq!(calls(&log), ["start:slow"]);
    }

    #[tokio::test]
    async fn test_concurrent_shutdown_is_rejected() {
        let log = CallLog::default();
        let mut registry = Registry::new();
        registry.register(Arc::new(Recorder {
            stop_delay: Some(Duration::from_secs(3600)),
            ..Recorder::named("slow", &log)
        }));

        tokio::select! {
            biased;
            _ = registry.shutdown() => unreachable!("first shutdown should still be running"),
            result = registry.shutdown() => {
                assert_eq!(
                    result,
                    Err(LifecycleError::invalid_state("shut down", LifecycleState::ShuttingDown))
                );
            }
        }

        // the abandoned first call leaves a resumable state behind
        assert_eq!(registry.state(), LifecycleState::ShutdownInterrupted);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let log = CallLog::default();
        let registry = abcd(&log, |_| {});
        registry.start().await.unwrap();

        let err = registry.start().await.unwrap_err();

        assert_eq!(
            err,
            LifecycleError::invalid_state("start", LifecycleState::Running)
        );
        assert_eq!(calls(&log).len(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_noop() {
        let log = CallLog::default();
        let registry = abcd(&log, |_| {});
        registry.start().await.unwrap();

        registry.shutdown().await.unwrap();
        registry.shutdown().await.unwrap();

        assert_eq!(calls(&log).len(), 8);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let log = CallLog::default();
        let registry = abcd(&log, |_| {});

        registry.shutdown().await.unwrap();

        assert_eq!(calls(&log), ["stop:A", "stop:B", "stop:C", "stop:D"]);
        let err = registry.start().await.unwrap_err();
        assert_eq!(
            err,
            LifecycleError::invalid_state("start", LifecycleState::ShutDown)
        );
    }

    #[tokio::test]
    async fn test_shutdown_after_failed_start() {
        let log = CallLog::default();
        let registry = abcd(&log, |p| p.fail_start = p.id == "A");

        assert!(registry.start().await.is_err());
        registry.shutdown().await.unwrap();

        assert_eq!(
            calls(&log),
            ["start:A", "stop:A", "stop:B", "stop:C", "stop:D"]
        );
    }

    #[tokio::test]
    async fn test_start_with_timeout() {
        struct Slow;

        impl Component for Slow {
            fn startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
                Some(self)
            }
        }

        #[async_trait]
        impl Startable for Slow {
            async fn start(&self) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        }

        let mut registry = Registry::new();
        registry.register(Arc::new(Slow));

        let err = registry
            .start_with_timeout(Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Timeout { .. }));
        assert_eq!(registry.state(), LifecycleState::StartFailed);
    }

    #[tokio::test]
    async fn test_shutdown_timeout_still_flushes() {
        struct Stuck;

        impl Component for Stuck {
            fn name(&self) -> Option<String> {
                Some("stuck".into())
            }

            fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
                Some(self)
            }
        }

        #[async_trait]
        impl Stoppable for Stuck {
            async fn shutdown(&self) -> Result<()> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        }

        let flushed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&flushed);
        let mut registry = Registry::new().with_flush_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.register(Arc::new(Stuck));

        let err = registry
            .shutdown_with_timeout(Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Timeout { .. }));
        assert_eq!(flushed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_start_still_allows_shutdown() {
        let log = CallLog::default();
        let mut registry = Registry::new();
        registry.register(Arc::new(Recorder::named("A", &log)));
        registry.register(Arc::new(Recorder {
            start_delay: Some(Duration::from_secs(3600)),
            ..Recorder::named("B", &log)
        }));

        tokio::select! {
            _ = registry.start() => unreachable!("B never finishes starting"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
        assert_eq!(registry.state(), LifecycleState::StartFailed);

        registry.shutdown().await.unwrap();

        assert_eq!(calls(&log), ["start:A", "start:B", "stop:A", "stop:B"]);
        assert_eq!(registry.state(), LifecycleState::ShutDown);
    }

    #[tokio::test]
    async fn test_panicking_start_still_allows_shutdown() {
        let log = CallLog::default();
        let mut registry = Registry::new();
        registry.register(Arc::new(Recorder::named("A", &log)));
        registry.register(Arc::new(Recorder {
            panic_on_start: true,
            ..Recorder::named("B", &log)
        }));
        let registry = Arc::new(registry);

        let starter = Arc::clone(&registry);
        let joined = tokio::spawn(async move { starter.start().await }).await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(registry.state(), LifecycleState::StartFailed);

        registry.shutdown().await.unwrap();
        assert_eq!(calls(&log), ["start:A", "start:B", "stop:A", "stop:B"]);
    }

    #[tokio::test]
    async fn test_shutdown_resumes_after_timeout() {
        let log = CallLog::default();
        let mut registry = Registry::new();
        registry.register(Arc::new(Recorder {
            stop_delay: Some(Duration::from_millis(200)),
            ..Recorder::named("A", &log)
        }));
        registry.register(Arc::new(Recorder::named("B", &log)));

        let err = registry
            .shutdown_with_timeout(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Timeout { .. }));
        assert_eq!(registry.state(), LifecycleState::ShutdownInterrupted);

        // the abandoned stop of A must not complete in the background
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(calls(&log), ["stop:A"]);

        registry.shutdown().await.unwrap();

        assert_eq!(calls(&log), ["stop:A", "stop:A", "stopped:A", "stop:B"]);
        assert_eq!(registry.state(), LifecycleState::ShutDown);
    }

    #[tokio::test]
    async fn test_resumed_shutdown_skips_completed_hooks() {
        let log = CallLog::default();
        let mut registry = Registry::new();
        registry.register(Arc::new(Recorder::named("A", &log)));
        registry.register(Arc::new(Recorder {
            stop_delay: Some(Duration::from_secs(3600)),
            ..Recorder::named("B", &log)
        }));
        registry.register(Arc::new(Recorder::unnamed("C", &log)));

        assert!(
            registry
                .shutdown_with_timeout(Duration::from_millis(20))
                .await
                .is_err()
        );
        assert_eq!(calls(&log), ["stop:A", "stop:B"]);

        // B hangs again; A is not revisited
        assert!(
            registry
                .shutdown_with_timeout(Duration::from_millis(20))
                .await
                .is_err()
        );
        assert_eq!(calls(&log), ["stop:A", "stop:B", "stop:B"]);
    }

    #[test]
    fn test_panic_message_extraction() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
