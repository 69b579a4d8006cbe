//! Looping playback over a loaded series for the live dashboard.
//!
//! A 1 Hz tick drives three things: the data cursor (wrapping at the end
//! of the series — an infinite replay, not a one-shot animation), a
//! fallback cooling simulation when no real data is playing, and an
//! elapsed-time counter that never stops. Tick logic is synchronous and
//! unit-testable; the async loop around it is cancellable and guaranteed
//! not to touch the driver after teardown.

use crate::types::{Series, DEFAULT_THRESHOLD};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Display value before any data has been loaded.
pub const INITIAL_VALUE: f64 = 44.5;

/// Per-tick decrement of the fallback cooling simulation.
pub const FALLBACK_DECAY_STEP: f64 = 0.02;

/// Floor of the fallback cooling simulation.
pub const FALLBACK_FLOOR: f64 = 35.0;

/// Fixed playback tick interval.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Coarse driver state for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// No series has ever been loaded.
    Idle,
    /// Cursor advancing over a loaded series.
    Playing,
    /// No (or no usable) series: decay simulation active.
    Fallback,
}

/// Monotonic elapsed-time counter, decoupled from the data cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElapsedClock {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl ElapsedClock {
    /// Advance by one second with minute/hour rollover.
    pub fn tick(&mut self) {
        self.seconds += 1;
        if self.seconds >= 60 {
            self.seconds = 0;
            self.minutes += 1;
        }
        if self.minutes >= 60 {
            self.minutes = 0;
            self.hours += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for ElapsedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Serializable snapshot of the driver for the live endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_value: f64,
    pub cursor: usize,
    pub data_points: usize,
    pub threshold: f64,
    pub playing: bool,
    pub phase: PlaybackPhase,
    pub elapsed: ElapsedClock,
}

/// Timed, looping cursor over the active series.
#[derive(Debug)]
pub struct PlaybackDriver {
    series: Option<Series>,
    cursor: usize,
    current_value: f64,
    clock: ElapsedClock,
    playing: bool,
    /// Distinguishes never-loaded (Idle) from cleared (Fallback).
    loaded_once: bool,
}

impl PlaybackDriver {
    pub fn new() -> Self {
        Self {
            series: None,
            cursor: 0,
            current_value: INITIAL_VALUE,
            clock: ElapsedClock::default(),
            playing: false,
            loaded_once: false,
        }
    }

    /// Load a series and start playing it from the beginning.
    ///
    /// The current value jumps to the first reading and the elapsed clock
    /// restarts, mirroring the dashboard's apply-upload behavior.
    pub fn apply_series(&mut self, series: Series) {
        self.current_value = series.values.first().copied().unwrap_or(INITIAL_VALUE);
        self.cursor = 0;
        self.playing = true;
        self.loaded_once = true;
        self.clock.reset();
        tracing::info!(points = series.len(), threshold = series.threshold, "playback series applied");
        self.series = Some(series);
    }

    /// Drop the active series; subsequent ticks run the decay simulation.
    pub fn clear_series(&mut self) {
        self.series = None;
        self.cursor = 0;
        self.playing = false;
    }

    /// Override the threshold on the active series (user setting).
    pub fn set_threshold(&mut self, threshold: f64) {
        if let Some(series) = &mut self.series {
            series.threshold = threshold;
        }
    }

    pub fn threshold(&self) -> f64 {
        self.series
            .as_ref()
            .map(|s| s.threshold)
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn phase(&self) -> PlaybackPhase {
        match &self.series {
            Some(series) if self.playing && !series.is_empty() => PlaybackPhase::Playing,
            None if !self.loaded_once => PlaybackPhase::Idle,
            _ => PlaybackPhase::Fallback,
        }
    }

    /// One 1 Hz tick.
    ///
    /// Playing with data: read the cursor's value, advance, wrap to 0 at
    /// the end. Otherwise: decay the current value toward the floor. The
    /// elapsed clock advances on every tick regardless of branch.
    pub fn tick(&mut self) {
        match &self.series {
            Some(series) if self.playing && !series.is_empty() => {
                let idx = self.cursor.min(series.values.len() - 1);
                self.current_value = series.values[idx];
                self.cursor = if self.cursor + 1 >= series.values.len() {
                    0
                } else {
                    self.cursor + 1
                };
            }
            _ => {
                let cooled = round2(self.current_value - FALLBACK_DECAY_STEP);
                self.current_value = cooled.max(FALLBACK_FLOOR);
            }
        }

        self.clock.tick();
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_value: self.current_value,
            cursor: self.cursor,
            data_points: self.series.as_ref().map_or(0, Series::len),
            threshold: self.threshold(),
            playing: self.playing,
            phase: self.phase(),
            elapsed: self.clock,
        }
    }
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Drive the playback loop until cancelled.
///
/// Cancellation is checked again after each interval fires, before the
/// tick's side effect, so no tick runs against a torn-down view.
pub async fn run(driver: Arc<RwLock<PlaybackDriver>>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first interval tick completes immediately; consume it so the
    // first real tick lands one full period after startup.
    interval.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("playback loop stopped");
                return;
            }
            _ = interval.tick() => {}
        }

        if cancel.is_cancelled() {
            return;
        }
        driver.write().await.tick();
    }
}
