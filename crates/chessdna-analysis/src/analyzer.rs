//! Move-by-move game analysis.
//!
//! [`GameAnalyzer`] walks each game and asks its evaluator two questions per
//! ply: what is the position worth with the best move, and what is it worth
//! with the move that was actually played. The difference is the
//! centipawn loss.
//!
//! When no engine could be started the analyzer runs with
//! [`EvalCapability::Absent`] and still produces one [`PlyReport`] per ply,
//! with every evaluation field left empty.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::{EngineError, EngineEval, EvalRequest, PositionEvaluator, UciEngine};
use crate::pgn::{read_games, ParsedGame};
use crate::quality::{accuracy_from_cpl, centipawn_loss, MoveLabel};
use crate::report::{AnalysisReport, GameReport, PlayerOverview, PlyReport};
use crate::settings::AnalysisSettings;
use crate::walker::{walk_game, WalkedPly};

/// Errors that can occur during game analysis.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The engine failed after analysis had started.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Whether positions can be evaluated in this run.
pub enum EvalCapability<E> {
    Present(E),
    /// No engine: plies are reported without evaluations.
    Absent,
}

impl<E> EvalCapability<E> {
    pub fn is_present(&self) -> bool {
        matches!(self, EvalCapability::Present(_))
    }
}

/// Analyzes games with an optional position evaluator.
pub struct GameAnalyzer<E> {
    capability: EvalCapability<E>,
    movetime_ms: u64,
    max_plies: usize,
    player: Option<String>,
}

impl<E: PositionEvaluator> GameAnalyzer<E> {
    /// Creates an analyzer using the budgets in `settings`.
    pub fn new(capability: EvalCapability<E>, settings: &AnalysisSettings) -> Self {
        Self {
            capability,
            movetime_ms: settings.movetime_ms(),
            max_plies: settings.max_plies() as usize,
            player: settings.player_name().map(str::to_string),
        }
    }

    /// Name reported by the evaluator, if there is one.
    pub fn engine_name(&self) -> Option<&str> {
        match &self.capability {
            EvalCapability::Present(evaluator) => evaluator.name(),
            EvalCapability::Absent => None,
        }
    }

    /// Analyzes one game.
    ///
    /// # Errors
    ///
    /// Any evaluator failure aborts the game. Plies are never partially
    /// filled in.
    pub fn analyze_game(&mut self, game: &ParsedGame) -> Result<GameReport, AnalyzerError> {
        let walked = walk_game(game, self.max_plies);
        let start_fen = game.start_fen();

        let plies = match &mut self.capability {
            EvalCapability::Present(evaluator) => {
                evaluator.new_game()?;
                let mut moves: Vec<String> = Vec::with_capacity(walked.len());
                let mut plies = Vec::with_capacity(walked.len());
                for ply in &walked {
                    plies.push(evaluate_ply(
                        evaluator,
                        start_fen,
                        &moves,
                        ply,
                        self.movetime_ms,
                    )?);
                    moves.push(ply.uci.clone());
                }
                plies
            }
            EvalCapability::Absent => walked.iter().map(unevaluated_ply).collect(),
        };

        let report = GameReport::new(game.headers.clone(), plies, self.player.as_deref());
        info!(
            white = game.header("White").unwrap_or("?"),
            black = game.header("Black").unwrap_or("?"),
            plies = report.plies.len(),
            "analyzed game"
        );
        Ok(report)
    }

    /// Analyzes games in order, stopping at the first failure.
    pub fn analyze_games(
        &mut self,
        games: &[ParsedGame],
    ) -> Result<Vec<GameReport>, AnalyzerError> {
        games.iter().map(|game| self.analyze_game(game)).collect()
    }

    /// Shut the evaluator down. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let EvalCapability::Present(evaluator) = &mut self.capability {
            evaluator.shutdown();
        }
    }
}

/// Run both searches for one ply and derive its loss, accuracy and label.
fn evaluate_ply<E: PositionEvaluator>(
    evaluator: &mut E,
    start_fen: Option<&str>,
    moves_before: &[String],
    ply: &WalkedPly,
    movetime_ms: u64,
) -> Result<PlyReport, EngineError> {
    let best = evaluator.evaluate(&EvalRequest {
        start_fen,
        moves: moves_before,
        movetime_ms,
        search_move: None,
    })?;
    let played = evaluator.evaluate(&EvalRequest {
        start_fen,
        moves: moves_before,
        movetime_ms,
        search_move: Some(&ply.uci),
    })?;

    let report = evaluated_ply(ply, best, &played);
    debug!(
        ply = report.ply,
        san = %report.san,
        best = ?report.best_cp,
        played = ?report.played_cp,
        cpl = ?report.cpl,
        "evaluated ply"
    );
    Ok(report)
}

fn evaluated_ply(ply: &WalkedPly, best: EngineEval, played: &EngineEval) -> PlyReport {
    let best_cp = best.evaluation.to_centipawns();
    let played_cp = played.evaluation.to_centipawns();
    let cpl = centipawn_loss(best_cp, played_cp);

    PlyReport {
        ply: ply.ply,
        san: ply.san.clone(),
        uci: ply.uci.clone(),
        side: ply.side,
        best_cp: Some(best_cp),
        played_cp: Some(played_cp),
        cpl: Some(cpl),
        accuracy: Some(accuracy_from_cpl(f64::from(cpl))),
        label: MoveLabel::from_cpl(cpl),
        best_move: best.best_move,
        pv: best.pv,
    }
}

fn unevaluated_ply(ply: &WalkedPly) -> PlyReport {
    PlyReport {
        ply: ply.ply,
        san: ply.san.clone(),
        uci: ply.uci.clone(),
        side: ply.side,
        best_cp: None,
        played_cp: None,
        cpl: None,
        accuracy: None,
        label: MoveLabel::Ok,
        best_move: None,
        pv: Vec::new(),
    }
}

/// Analyze every game in `pgn` with the engine named in `settings`.
///
/// If the engine cannot be started (missing binary, failed handshake) the
/// analysis still completes without evaluations. The engine is always shut
/// down before this returns.
///
/// # Errors
///
/// Returns an error if the engine fails once analysis is under way.
pub fn analyze_pgn_text(
    pgn: &str,
    settings: &AnalysisSettings,
) -> Result<AnalysisReport, AnalyzerError> {
    let capability = match UciEngine::start(settings.engine_path(), settings.hard_timeout()) {
        Ok(engine) => EvalCapability::Present(engine),
        Err(e) => {
            warn!("analyzing without engine evaluations: {}", e);
            EvalCapability::Absent
        }
    };
    analyze_with(pgn, settings, capability)
}

/// Analyze every game in `pgn` with an already-prepared capability.
pub fn analyze_with<E: PositionEvaluator>(
    pgn: &str,
    settings: &AnalysisSettings,
    capability: EvalCapability<E>,
) -> Result<AnalysisReport, AnalyzerError> {
    let mut analyzer = GameAnalyzer::new(capability, settings);
    let engine_name = analyzer.engine_name().map(str::to_string);

    let games = read_games(pgn);
    let result = analyzer.analyze_games(&games);
    analyzer.shutdown();
    let games = result?;

    let player_overview = settings
        .player_name()
        .map(|_| PlayerOverview::from_games(&games));

    Ok(AnalysisReport {
        games,
        engine_path: settings.engine_path().to_string(),
        engine_name,
        time_per_move: settings.time_per_move(),
        max_plies: settings.max_plies(),
        player_name: settings.player_name().map(str::to_string),
        player_overview,
    })
}
