//! Engine score normalization.

use std::fmt;
use uci::Score;

/// Base magnitude for a mate score: "mate in 0" is worth this much.
pub const MATE_SCORE: i32 = 100_000;
/// Magnitude lost per move of mate distance.
pub const MATE_STEP: i32 = 1_000;
/// Smallest magnitude a mate score can normalize to. Mates farther away than
/// `(MATE_SCORE - MATE_FLOOR) / MATE_STEP` moves all share this value.
pub const MATE_FLOOR: i32 = 40_000;
/// Ordinary centipawn scores are clamped into `±MAX_CENTIPAWNS` so that any
/// mate always outranks them.
pub const MAX_CENTIPAWNS: i32 = 30_000;

/// Represents a chess position evaluation from the side to move's perspective.
///
/// Evaluations can be either centipawn scores (for normal positions)
/// or mate scores (when a forced mate is found).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Centipawn evaluation (positive = side to move is better)
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, negative = side to move is mated)
    Mate(i32),
}

impl Evaluation {
    /// The value used when a search produced no score at all.
    pub const EQUAL: Evaluation = Evaluation::Centipawns(0);

    /// Collapse the evaluation onto a single centipawn axis.
    ///
    /// Mate scores map to `±(MATE_SCORE - MATE_STEP * |n|)`, never below
    /// `MATE_FLOOR` in magnitude, so mate in 1 outranks mate in 5 and both
    /// outrank every ordinary evaluation. `Mate(0)` means the side to move is
    /// already mated.
    pub fn to_centipawns(self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => cp.clamp(-MAX_CENTIPAWNS, MAX_CENTIPAWNS),
            Evaluation::Mate(n) => {
                let distance = n.unsigned_abs().min(u32::from(u16::MAX)) as i32;
                let magnitude = (MATE_SCORE - MATE_STEP * distance).max(MATE_FLOOR);
                if n > 0 {
                    magnitude
                } else {
                    -magnitude
                }
            }
        }
    }

    /// True for mate scores.
    pub fn is_mate(self) -> bool {
        matches!(self, Evaluation::Mate(_))
    }
}

impl From<Score> for Evaluation {
    fn from(score: Score) -> Self {
        match score {
            Score::Cp(cp) => Evaluation::Centipawns(cp),
            Score::Mate(n) => Evaluation::Mate(n),
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => write!(f, "{:+.2}", f64::from(*cp) / 100.0),
            Evaluation::Mate(n) => write!(f, "M{}", n),
        }
    }
}
