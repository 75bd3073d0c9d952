//! Simulated loading sequence shown while a prediction is "fetched".
//!
//! A duration is sampled once per run. Every host tick, progress moves
//! linearly with elapsed time (clamped to 100) and the status label may
//! advance one step along a fixed list. Once progress hits 100 the sequence
//! exposes a one-shot continuation carrying the realized duration.

use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Labels shown in order; the last one stays until completion.
pub const STATUS_LIST: &[&str] = &[
    "API-Football...",
    "The Odds API...",
    "SportMonks...",
    "Sportradar...",
    "Tipico Odds Feed...",
];

pub const STATUS_CADENCE: Duration = Duration::from_millis(700);

/// Host refresh period.
pub const TICK_INTERVAL: Duration = Duration::from_millis(40);

pub type SharedLoading = Arc<Mutex<LoadingSequence>>;

/// What the host renders after a tick.
#[derive(Debug, Clone, Serialize)]
pub struct LoadingFrame {
    /// 0.0–100.0
    pub progress: f64,
    pub status: &'static str,
    pub elapsed_secs: f64,
    pub duration_secs: f64,
    pub done: bool,
}

/// Handed to the caller exactly once after the sequence completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingCompletion {
    pub ticket: u64,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct LoadingSequence {
    ticket: u64,
    duration: Duration,
    elapsed: Duration,
    progress: f64,
    status_index: usize,
    done: bool,
    completion_taken: bool,
}

impl LoadingSequence {
    /// Sample a duration uniformly from `[min_secs, max_secs]`, rounded to
    /// whole milliseconds.
    pub fn sample<R: Rng>(rng: &mut R, ticket: u64, min_secs: f64, max_secs: f64) -> Self {
        let secs = if max_secs > min_secs {
            rng.gen_range(min_secs..=max_secs)
        } else {
            min_secs
        };
        let millis = (secs * 1000.0).round().max(0.0) as u64;
        Self::with_duration(ticket, Duration::from_millis(millis))
    }

    pub fn with_duration(ticket: u64, duration: Duration) -> Self {
        LoadingSequence {
            ticket,
            duration,
            elapsed: Duration::ZERO,
            progress: 0.0,
            status_index: 0,
            done: false,
            completion_taken: false,
        }
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance to `elapsed` (measured from the start of the run).
    pub fn tick(&mut self, elapsed: Duration) -> LoadingFrame {
        if self.done {
            return self.frame();
        }
        self.elapsed = self.elapsed.max(elapsed);

        let pct = if self.duration.is_zero() {
            100.0
        } else {
            (self.elapsed.as_secs_f64() / self.duration.as_secs_f64() * 100.0).min(100.0)
        };
        self.progress = self.progress.max(pct);

        let next_boundary = STATUS_CADENCE * (self.status_index as u32 + 1);
        if self.elapsed > next_boundary && self.status_index < STATUS_LIST.len() - 1 {
            self.status_index += 1;
        }

        if self.progress >= 100.0 {
            self.done = true;
        }
        self.frame()
    }

    pub fn frame(&self) -> LoadingFrame {
        LoadingFrame {
            progress: self.progress,
            status: STATUS_LIST[self.status_index],
            elapsed_secs: self.elapsed.as_secs_f64(),
            duration_secs: self.duration.as_secs_f64(),
            done: self.done,
        }
    }

    /// The continuation: `Some` exactly once, and only after completion.
    pub fn complete(&mut self) -> Option<LoadingCompletion> {
        if !self.done || self.completion_taken {
            return None;
        }
        self.completion_taken = true;
        Some(LoadingCompletion {
            ticket: self.ticket,
            duration: self.duration,
        })
    }
}

/// Tick `sequence` every `tick` until it completes. The task ends early once
/// every strong handle to the sequence is dropped.
pub fn spawn_driver(sequence: &SharedLoading, tick: Duration) -> JoinHandle<()> {
    let weak: Weak<Mutex<LoadingSequence>> = Arc::downgrade(sequence);
    tokio::spawn(async move {
        let start = Instant::now();
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(sequence) = weak.upgrade() else {
                debug!("Loading sequence dropped before completion");
                break;
            };
            let mut sequence = sequence.lock().await;
            sequence.tick(start.elapsed());
            if sequence.is_done() {
                debug!(
                    "Loading sequence {} complete after {:.3}s",
                    sequence.ticket(),
                    sequence.duration().as_secs_f64()
                );
                break;
            }
        }
    })
}
