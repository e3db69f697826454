//! Replays a parsed game ply by ply.

use crate::pgn::ParsedGame;
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, Position};
use std::fmt;
use tracing::debug;

/// The side that made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// One half-move, described from the position before it was played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedPly {
    /// 1-based index within the game.
    pub ply: u32,
    pub side: Side,
    /// Standard algebraic notation, including `+` or `#`.
    pub san: String,
    /// Coordinate notation as sent to the engine (`e2e4`, `e7e8q`, `e1g1`).
    pub uci: String,
}

/// Parse the position a game starts from.
///
/// `None` means the standard initial position. Returns `None` for a FEN that
/// does not describe a legal standard-chess position.
pub fn start_position(fen: Option<&str>) -> Option<Chess> {
    let Some(text) = fen else {
        return Some(Chess::default());
    };
    let parsed: Fen = match text.parse() {
        Ok(fen) => fen,
        Err(e) => {
            debug!(fen = text, "unparseable FEN: {}", e);
            return None;
        }
    };
    match parsed.into_position::<Chess>(CastlingMode::Standard) {
        Ok(pos) => Some(pos),
        Err(e) => {
            debug!(fen = text, "illegal start position: {}", e);
            None
        }
    }
}

/// Replay the mainline of `game`, yielding at most `max_plies` plies.
///
/// The walk ends early, without error, at the first move that is not legal
/// in the current position or when the start position cannot be built.
pub fn walk_game(game: &ParsedGame, max_plies: usize) -> Vec<WalkedPly> {
    let mut plies = Vec::new();
    if max_plies == 0 {
        return plies;
    }
    let Some(mut pos) = start_position(game.start_fen()) else {
        return plies;
    };

    for san_plus in &game.sans {
        if plies.len() >= max_plies {
            break;
        }
        let m = match san_plus.san.to_move(&pos) {
            Ok(m) => m,
            Err(e) => {
                debug!(ply = plies.len() + 1, "walk stopped at {}: {}", san_plus, e);
                break;
            }
        };

        let side = Side::from(pos.turn());
        let uci = m.to_uci(CastlingMode::Standard).to_string();
        let san = SanPlus::from_move_and_play_unchecked(&mut pos, m).to_string();

        plies.push(WalkedPly {
            ply: plies.len() as u32 + 1,
            side,
            san,
            uci,
        });
    }

    plies
}
