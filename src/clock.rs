//! Per-match countdowns.
//!
//! Each `arm` takes a fresh generation token and aborts the previous
//! countdown of that match. A countdown that wakes up anyway must `claim` its
//! token before acting, and a stale token claims nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chess::Color;
use futures::future::{abortable, AbortHandle};
use log::debug;

use crate::models::lock;

/// Observable state of a match's clock. `Fired` and `Cancelled` entries are
/// dropped, so both read back as `Unarmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Unarmed,
    Armed {
        token: u64,
        expires_at: Instant,
        winner: Color,
    },
}

/// Handed to the expiry callback of a countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFiring {
    pub match_id: String,
    pub token: u64,
    pub winner: Color,
}

struct Countdown {
    token: u64,
    expires_at: Instant,
    winner: Color,
    abort: AbortHandle,
}

#[derive(Default)]
pub struct ClockScheduler {
    countdowns: Mutex<HashMap<String, Countdown>>,
    generation: AtomicU64,
}

impl ClockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the countdown for `match_id`, superseding any earlier one.
    ///
    /// Must be called inside an actix runtime.
    pub fn arm<F>(&self, match_id: &str, winner: Color, duration: Duration, on_expiry: F) -> u64
    where
        F: FnOnce(ClockFiring) + 'static,
    {
        let token = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (sleep, abort) = abortable(actix_rt::time::sleep(duration));
        let previous = lock(&self.countdowns).insert(
            match_id.to_string(),
            Countdown {
                token,
                expires_at: Instant::now() + duration,
                winner,
                abort,
            },
        );
        if let Some(previous) = previous {
            previous.abort.abort();
        }

        let firing = ClockFiring {
            match_id: match_id.to_string(),
            token,
            winner,
        };
        actix_rt::spawn(async move {
            if sleep.await.is_ok() {
                on_expiry(firing);
            }
        });
        token
    }

    /// Take ownership of an expiry. Only the current token succeeds, once.
    pub fn claim(&self, firing: &ClockFiring) -> bool {
        let mut countdowns = lock(&self.countdowns);
        match countdowns.get(&firing.match_id) {
            Some(current) if current.token == firing.token => {
                countdowns.remove(&firing.match_id);
                true
            }
            _ => {
                debug!("Ignoring stale clock {} for match {}", firing.token, firing.match_id);
                false
            }
        }
    }

    /// Stop the match's countdown. Idempotent.
    pub fn cancel(&self, match_id: &str) {
        if let Some(countdown) = lock(&self.countdowns).remove(match_id) {
            countdown.abort.abort();
        }
    }

    pub fn state(&self, match_id: &str) -> ClockState {
        match lock(&self.countdowns).get(match_id) {
            Some(c) => ClockState::Armed {
                token: c.token,
                expires_at: c.expires_at,
                winner: c.winner,
            },
            None => ClockState::Unarmed,
        }
    }
}
