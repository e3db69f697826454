//! Centipawn-loss and accuracy analysis of PGN games with a UCI engine.
//!
//! For every move the engine is asked for the value of the best move and the
//! value of the move actually played, from the same position. The gap is the
//! centipawn loss (CPL), which drives a 0-100 accuracy score and a severity
//! label. Results roll up into per-game, per-side and per-player statistics.
//!
//! # Overview
//!
//! - [`UciEngine`] - Driver for one engine subprocess
//! - [`walk_game`] - Replays a game into (side, SAN, UCI) plies
//! - [`GameAnalyzer`] - Two searches per ply, loss, accuracy, label
//! - [`AnalysisReport`] - Game reports plus the player overview
//! - [`AnalysisSettings`] - Engine path and clamped search budgets
//!
//! A missing or broken engine binary does not fail the analysis: every ply
//! is still reported, with its evaluation fields left empty.
//!
//! # Example
//!
//! ```ignore
//! use chessdna_analysis::{analyze_pgn_text, AnalysisSettings};
//!
//! let settings = AnalysisSettings::new("stockfish")
//!     .with_time_per_move(0.1)
//!     .with_player(Some("Magnus"));
//! let report = analyze_pgn_text(&pgn, &settings)?;
//! for game in &report.games {
//!     println!("{:?} {:?}", game.accuracy_white, game.accuracy_black);
//! }
//! ```

pub mod analyzer;
pub mod engine;
pub mod evaluation;
pub mod pgn;
pub mod quality;
pub mod report;
pub mod settings;
pub mod walker;

pub use analyzer::{analyze_pgn_text, analyze_with, AnalyzerError, EvalCapability, GameAnalyzer};
pub use engine::{EngineError, EngineEval, EngineState, EvalRequest, PositionEvaluator, UciEngine};
pub use evaluation::Evaluation;
pub use pgn::{pgn_info, preview_games, read_games, GamePreview, ParsedGame, PgnInfo};
pub use quality::{accuracy_from_cpl, centipawn_loss, LabelCounts, MoveLabel};
pub use report::{AnalysisReport, GameReport, PlayerGameStats, PlayerOverview, PlyReport};
pub use settings::{AnalysisSettings, ClampWarnings};
pub use walker::{walk_game, Side, WalkedPly};
