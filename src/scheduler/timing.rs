//! Clock reads, deadline arithmetic and wait strategy selection for the runner loop

use std::time::{Duration, Instant};

/// Periods up to this many milliseconds use a plain sleep instead of a timed condvar wait.
pub const SHORT_PERIOD_MAX_MS: u32 = 1000;

/// How the runner thread should wait before its next invocation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Period is 0: block on the condvar until someone signals.
    Paused,
    /// Short period: release the lock and sleep for the whole period.
    Sleep(Duration),
    /// Long period with a deadline still ahead: timed condvar wait until it.
    Until(Instant),
    /// Long period whose deadline already passed: don't wait at all.
    Immediate,
}

impl WaitStrategy {
    pub fn select(period_ms: u32, last_call: Instant, now: Instant) -> Self {
        match period_ms {
            0 => WaitStrategy::Paused,
            p if p <= SHORT_PERIOD_MAX_MS => WaitStrategy::Sleep(period(p)),
            p => {
                let wakeup_at = deadline(last_call, p);
                if wakeup_at > now {
                    WaitStrategy::Until(wakeup_at)
                } else {
                    WaitStrategy::Immediate
                }
            }
        }
    }
}

pub fn now() -> Instant {
    Instant::now()
}

pub fn period(period_ms: u32) -> Duration {
    Duration::from_millis(u64::from(period_ms))
}

/// Absolute time at which the next call is due
pub fn deadline(last_call: Instant, period_ms: u32) -> Instant {
    last_call + period(period_ms)
}

/// Whether a long-period call is due at `now`. Reaching the deadline exactly counts as due.
pub fn is_due(last_call: Instant, period_ms: u32, now: Instant) -> bool {
    deadline(last_call, period_ms) <= now
}
