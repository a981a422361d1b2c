//! Periodic runner: one callback, one background thread, adjustable period
//!
//! Other threads change the period or request shutdown by mutating the shared
//! state under the lock and signalling the condvar. The signal itself may be
//! missed (the runner could be sleeping or calling the callback), so the runner
//! re-reads the state every time it holds the lock and acts on what it finds.

use log::{debug, error, info, warn};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::status::RunnerStatus;
use super::timing::{self, WaitStrategy, SHORT_PERIOD_MAX_MS};
use crate::error::{MinicronError, Result};

const DEFAULT_RUNNER_NAME: &str = "minicron";

/// Instrumentation identity for a runner.
///
/// `name` becomes the runner thread's name; the keys only show up in log records.
/// None of these affect scheduling.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub name: String,
    pub mutex_key: Option<String>,
    pub condvar_key: Option<String>,
}

impl RunnerOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_RUNNER_NAME.to_string(),
            mutex_key: None,
            condvar_key: None,
        }
    }
}

struct State {
    period_ms: u32,
    last_call: Instant,
    shutdown_requested: bool,
}

struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
    // Relaxed mirrors for status reads; only written while `state` is locked.
    period_hint: AtomicU32,
    shutdown_hint: AtomicBool,
    options: RunnerOptions,
}

impl Shared {
    // Nothing runs user code while holding the lock, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> &str {
        &self.options.name
    }
}

/// Invokes a callback roughly every `period_ms` milliseconds on a dedicated thread.
///
/// A period of 0 pauses the runner until the period is changed. The runner is
/// single-use: once [`shutdown`](Self::shutdown) has been called it never runs again.
pub struct PeriodicRunner {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl PeriodicRunner {
    pub fn start<F>(period_ms: u32, callback: F) -> Result<Self>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        Self::start_with_options(RunnerOptions::default(), period_ms, callback)
    }

    /// Start the runner thread. The first call is due one period from now.
    pub fn start_with_options<F>(options: RunnerOptions, period_ms: u32, callback: F) -> Result<Self>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        if options.name.contains('\0') {
            return Err(MinicronError::Config(
                "runner name must not contain NUL bytes".to_string(),
            ));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                period_ms,
                last_call: timing::now(),
                shutdown_requested: false,
            }),
            wakeup: Condvar::new(),
            period_hint: AtomicU32::new(period_ms),
            shutdown_hint: AtomicBool::new(false),
            options,
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(shared.options.name.clone())
            .spawn(move || run_loop(thread_shared, callback))
            .map_err(MinicronError::Init)?;

        info!(
            "⏱️ Runner '{}' started with period {} ms (mutex: {}, condvar: {})",
            shared.name(),
            period_ms,
            shared.options.mutex_key.as_deref().unwrap_or("-"),
            shared.options.condvar_key.as_deref().unwrap_or("-"),
        );

        Ok(Self {
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }

    /// Set a new period. Does not wait for the runner to pick it up.
    pub fn change_period(&self, new_period_ms: u32) {
        let mut state = self.shared.lock();
        state.period_ms = new_period_ms;
        self.shared.period_hint.store(new_period_ms, Ordering::Relaxed);
        self.shared.wakeup.notify_one();
        drop(state);

        info!(
            "Runner '{}' period changed to {} ms",
            self.shared.name(),
            new_period_ms
        );
    }

    /// Ask the runner to stop and wait for its thread to exit.
    ///
    /// An in-flight callback call finishes first. Returns the callback's error
    /// if the runner had already stopped because the callback failed, and
    /// [`MinicronError::AlreadyShutdown`] on any call after the first.
    ///
    /// Called from inside the callback, this only flags the runner; the thread
    /// exits once the callback returns.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if state.shutdown_requested {
                return Err(MinicronError::AlreadyShutdown);
            }
            state.shutdown_requested = true;
            self.shared.shutdown_hint.store(true, Ordering::Relaxed);
            self.shared.wakeup.notify_one();
        }

        info!("🛑 Shutting down runner '{}'", self.shared.name());

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        if handle.thread().id() == thread::current().id() {
            debug!(
                "Runner '{}' shutdown requested from its own thread, not joining",
                self.shared.name()
            );
            return Ok(());
        }

        let result = match handle.join() {
            Ok(result) => result,
            Err(payload) => Err(MinicronError::RunnerPanicked(panic_message(payload))),
        };

        match &result {
            Ok(()) => info!("✅ Runner '{}' shut down", self.shared.name()),
            Err(e) => error!("❌ Runner '{}' stopped with error: {}", self.shared.name(), e),
        }
        result
    }

    /// [`shutdown`](Self::shutdown) for async hosts, joining on a blocking pool thread.
    pub async fn shutdown_async(self: Arc<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || self.shutdown())
            .await
            .map_err(|e| MinicronError::RunnerPanicked(e.to_string()))?
    }

    /// Period in milliseconds, read without the lock. May be stale.
    pub fn period_ms_relaxed(&self) -> u32 {
        self.shared.period_hint.load(Ordering::Relaxed)
    }

    /// Period in whole seconds, read without the lock. May be stale.
    pub fn period_secs_relaxed(&self) -> u32 {
        self.period_ms_relaxed() / 1000
    }

    /// Whether shutdown has been requested, read without the lock. May be stale.
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown_hint.load(Ordering::Relaxed)
    }

    /// True once the runner thread has exited (after shutdown, or because the
    /// callback failed) or was detached by a shutdown from inside the callback.
    pub fn has_stopped(&self) -> bool {
        match self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn status(&self) -> RunnerStatus {
        RunnerStatus {
            name: self.shared.name().to_string(),
            period_ms: self.period_ms_relaxed(),
            period_secs: self.period_secs_relaxed(),
            shutdown: self.is_shutdown(),
        }
    }
}

impl Drop for PeriodicRunner {
    fn drop(&mut self) {
        if self.shared.lock().shutdown_requested {
            return;
        }
        error!(
            "Runner '{}' dropped without shutdown, shutting down now",
            self.shared.name()
        );
        if let Err(e) = self.shutdown() {
            error!("Runner '{}' shutdown on drop failed: {}", self.shared.name(), e);
        }
    }
}

impl std::fmt::Debug for PeriodicRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicRunner")
            .field("name", &self.shared.name())
            .field("period_ms", &self.period_ms_relaxed())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn run_loop<F>(shared: Arc<Shared>, mut callback: F) -> Result<()>
where
    F: FnMut() -> anyhow::Result<()>,
{
    let mut state = shared.lock();
    loop {
        if state.shutdown_requested {
            break;
        }

        state = match WaitStrategy::select(state.period_ms, state.last_call, timing::now()) {
            WaitStrategy::Paused => shared
                .wakeup
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner),
            WaitStrategy::Sleep(period) => {
                drop(state);
                thread::sleep(period);
                shared.lock()
            }
            WaitStrategy::Until(wakeup_at) => {
                let timeout = wakeup_at.saturating_duration_since(timing::now());
                // Timing out and being signalled are both fine; the checks below decide.
                let (guard, _) = shared
                    .wakeup
                    .wait_timeout(state, timeout)
                    .unwrap_or_else(PoisonError::into_inner);
                guard
            }
            WaitStrategy::Immediate => state,
        };

        if state.shutdown_requested {
            break;
        }

        let now = timing::now();
        let period_ms = state.period_ms;
        let should_call = match period_ms {
            0 => false,
            p if p <= SHORT_PERIOD_MAX_MS => true,
            p => timing::is_due(state.last_call, p, now),
        };
        if !should_call {
            debug!("Runner '{}' woke up early, nothing to do", shared.name());
            continue;
        }

        // Charged from the start of the call, so the call's duration counts toward the period.
        state.last_call = now;
        drop(state);

        debug!("Runner '{}' invoking callback", shared.name());
        if let Err(e) = callback() {
            error!(
                "❌ Runner '{}' callback failed, stopping: {:#}",
                shared.name(),
                e
            );
            return Err(MinicronError::CallbackFailed(format!("{:#}", e)));
        }

        let elapsed = now.elapsed();
        if elapsed > timing::period(period_ms) {
            warn!(
                "Runner '{}' callback took {:?} (longer than period {} ms)",
                shared.name(),
                elapsed,
                period_ms
            );
        }

        state = shared.lock();
    }

    drop(state);
    debug!("Runner '{}' thread exiting", shared.name());
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
