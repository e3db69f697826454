//! Analysis inputs and their clamping rules.
//!
//! Callers hand in raw values; the effective values are always inside the
//! supported ranges. Out-of-range input is clamped, never rejected. Use
//! [`ClampWarnings`] to find out whether that happened.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_TIME_PER_MOVE: f64 = 0.05;
pub const MIN_TIME_PER_MOVE: f64 = 0.01;
pub const MAX_TIME_PER_MOVE: f64 = 1.0;

pub const DEFAULT_MAX_PLIES: u32 = 200;
pub const MIN_MAX_PLIES: u32 = 10;
pub const MAX_MAX_PLIES: u32 = 800;

/// Shortest search ever requested from the engine, in milliseconds.
pub const MIN_MOVETIME_MS: u64 = 10;

/// Environment variable consulted for the default engine path.
pub const ENGINE_PATH_ENV: &str = "STOCKFISH_PATH";
/// Engine looked up on `PATH` when nothing else is configured.
pub const DEFAULT_ENGINE: &str = "stockfish";

/// Engine path from `STOCKFISH_PATH`, else `stockfish`.
pub fn default_engine_path() -> String {
    std::env::var(ENGINE_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENGINE.to_string())
}

/// Clamp a time budget in seconds to `[0.01, 1.0]`. NaN and infinities fall
/// back to the default.
pub fn clamp_time_per_move(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.clamp(MIN_TIME_PER_MOVE, MAX_TIME_PER_MOVE)
    } else {
        DEFAULT_TIME_PER_MOVE
    }
}

/// Clamp a ply cap to `[10, 800]`.
pub fn clamp_max_plies(plies: i64) -> u32 {
    plies.clamp(i64::from(MIN_MAX_PLIES), i64::from(MAX_MAX_PLIES)) as u32
}

/// Everything one analysis run needs besides the PGN text.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    engine_path: String,
    time_per_move: f64,
    max_plies: u32,
    player_name: Option<String>,
    hard_timeout: Option<Duration>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::new(default_engine_path())
    }
}

impl AnalysisSettings {
    /// Default budgets with the given engine binary.
    pub fn new(engine_path: impl Into<String>) -> Self {
        Self {
            engine_path: engine_path.into(),
            time_per_move: DEFAULT_TIME_PER_MOVE,
            max_plies: DEFAULT_MAX_PLIES,
            player_name: None,
            hard_timeout: None,
        }
    }

    pub fn with_time_per_move(mut self, secs: f64) -> Self {
        self.time_per_move = clamp_time_per_move(secs);
        self
    }

    pub fn with_max_plies(mut self, plies: i64) -> Self {
        self.max_plies = clamp_max_plies(plies);
        self
    }

    /// Player to report on, matched exactly against the White/Black tags.
    /// An empty name means no player.
    pub fn with_player(mut self, name: Option<&str>) -> Self {
        self.player_name = name.filter(|n| !n.is_empty()).map(str::to_string);
        self
    }

    /// Kill the engine if it stays silent longer than this.
    pub fn with_hard_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hard_timeout = timeout;
        self
    }

    pub fn engine_path(&self) -> &str {
        &self.engine_path
    }

    /// Effective time per move in seconds.
    pub fn time_per_move(&self) -> f64 {
        self.time_per_move
    }

    /// Effective ply cap per game.
    pub fn max_plies(&self) -> u32 {
        self.max_plies
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn hard_timeout(&self) -> Option<Duration> {
        self.hard_timeout
    }

    /// Search time sent with `go movetime`.
    pub fn movetime_ms(&self) -> u64 {
        ((self.time_per_move * 1000.0).round() as u64).max(MIN_MOVETIME_MS)
    }
}

/// Requested values that did not survive clamping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClampWarnings {
    /// `(requested, effective)` seconds.
    pub time_per_move: Option<(f64, f64)>,
    /// `(requested, effective)` plies.
    pub max_plies: Option<(i64, u32)>,
}

impl ClampWarnings {
    /// Compare what the caller asked for with what `settings` ended up using.
    pub fn compare(requested_time: f64, requested_plies: i64, settings: &AnalysisSettings) -> Self {
        let time_per_move = (requested_time != settings.time_per_move())
            .then_some((requested_time, settings.time_per_move()));
        let max_plies = (requested_plies != i64::from(settings.max_plies()))
            .then_some((requested_plies, settings.max_plies()));
        Self {
            time_per_move,
            max_plies,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.time_per_move.is_none() && self.max_plies.is_none()
    }
}

impl fmt::Display for ClampWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some((requested, effective)) = self.time_per_move {
            parts.push(format!(
                "time_per_move {} out of range [{}, {}], using {}",
                requested, MIN_TIME_PER_MOVE, MAX_TIME_PER_MOVE, effective
            ));
        }
        if let Some((requested, effective)) = self.max_plies {
            parts.push(format!(
                "max_plies {} out of range [{}, {}], using {}",
                requested, MIN_MAX_PLIES, MAX_MAX_PLIES, effective
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}
