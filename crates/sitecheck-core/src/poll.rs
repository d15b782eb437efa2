//! Bounded fixed-interval polling.
//!
//! Probes at t = 0, interval, 2·interval, … until the predicate holds or
//! the ceiling is reached. The ceiling is a wall-clock deadline: time spent
//! inside slow probes counts, so a black-holed host that eats a full request
//! timeout per probe gets fewer probes, and the poll still ends within one
//! request timeout of the ceiling.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Interval and ceiling for [`poll_until`].
///
/// `ceiling` bounds total elapsed time, probes included. The last probe may
/// start just before the ceiling, so the worst case is `ceiling` plus one
/// probe duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, ceiling: Duration) -> Self {
        Self { interval, ceiling }
    }

    pub fn from_secs(interval_secs: u64, ceiling_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(ceiling_secs),
        )
    }
}

/// Progress report after a probe that did not satisfy the predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTick<'a, T> {
    /// 1-based probe number.
    pub attempt: u32,
    /// Time since the poll started, measured when the probe returned.
    pub elapsed: Duration,
    pub ceiling: Duration,
    pub last: &'a T,
}

/// Final state of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome<T> {
    pub ready: bool,
    /// When the successful probe returned, or when the poll gave up.
    pub elapsed: Duration,
    pub attempts: u32,
    pub last: Option<T>,
}

/// Probe until `ready` accepts a value or `policy.ceiling` elapses.
///
/// `on_retry` runs after every failed probe, before sleeping. A zero
/// interval probes exactly once.
pub async fn poll_until<T, P, Fut, R, C>(
    policy: PollPolicy,
    mut probe: P,
    ready: R,
    mut on_retry: C,
) -> PollOutcome<T>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = T>,
    R: Fn(&T) -> bool,
    C: FnMut(PollTick<'_, T>),
{
    let start = Instant::now();
    let mut scheduled = Duration::ZERO;
    let mut attempts = 0u32;

    loop {
        let value = probe().await;
        attempts += 1;
        let elapsed = scheduled.max(start.elapsed());

        if ready(&value) {
            return PollOutcome {
                ready: true,
                elapsed,
                attempts,
                last: Some(value),
            };
        }

        on_retry(PollTick {
            attempt: attempts,
            elapsed,
            ceiling: policy.ceiling,
            last: &value,
        });

        if policy.interval.is_zero() || elapsed >= policy.ceiling {
            return PollOutcome {
                ready: false,
                elapsed,
                attempts,
                last: Some(value),
            };
        }

        let step = policy.interval.min(policy.ceiling - elapsed);
        tokio::time::sleep(step).await;
        scheduled = (elapsed + step).max(start.elapsed());

        if scheduled >= policy.ceiling {
            return PollOutcome {
                ready: false,
                elapsed: scheduled,
                attempts,
                last: Some(value),
            };
        }
    }
}
