//! Move severity classification and accuracy scoring.

use serde::{Deserialize, Serialize};

/// Loss at or above which a move is a blunder.
pub const BLUNDER_CPL: i32 = 300;
/// Loss at or above which a move is a mistake.
pub const MISTAKE_CPL: i32 = 100;
/// Loss at or above which a move is an inaccuracy.
pub const INACCURACY_CPL: i32 = 50;

/// Severity label derived from centipawn loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveLabel {
    /// Loss below 50 centipawns, or no evaluation available.
    #[default]
    Ok,
    /// 50 <= loss < 100
    Inaccuracy,
    /// 100 <= loss < 300
    Mistake,
    /// loss >= 300
    Blunder,
}

impl MoveLabel {
    /// Classify a centipawn loss. Each band includes its lower bound.
    pub fn from_cpl(cpl: i32) -> Self {
        if cpl >= BLUNDER_CPL {
            MoveLabel::Blunder
        } else if cpl >= MISTAKE_CPL {
            MoveLabel::Mistake
        } else if cpl >= INACCURACY_CPL {
            MoveLabel::Inaccuracy
        } else {
            MoveLabel::Ok
        }
    }
}

/// Centipawn loss of the played move against the best move, floored at zero.
pub fn centipawn_loss(best_cp: i32, played_cp: i32) -> i32 {
    best_cp.saturating_sub(played_cp).max(0)
}

/// Map a (possibly averaged) centipawn loss to a 0-100 accuracy score.
///
/// `103.1668 * e^(-0.04354 * cpl) - 3.1669`, clamped to `[0, 100]`. Negative
/// input is treated as zero loss.
pub fn accuracy_from_cpl(cpl: f64) -> f64 {
    let raw = 103.1668 * (-0.04354 * cpl.max(0.0)).exp() - 3.1669;
    raw.clamp(0.0, 100.0)
}

/// Counts of non-ok labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl LabelCounts {
    /// Tally one label.
    pub fn record(&mut self, label: MoveLabel) {
        match label {
            MoveLabel::Ok => {}
            MoveLabel::Inaccuracy => self.inaccuracy += 1,
            MoveLabel::Mistake => self.mistake += 1,
            MoveLabel::Blunder => self.blunder += 1,
        }
    }
}

impl FromIterator<MoveLabel> for LabelCounts {
    fn from_iter<I: IntoIterator<Item = MoveLabel>>(iter: I) -> Self {
        let mut counts = LabelCounts::default();
        for label in iter {
            counts.record(label);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_label_band_boundaries() {
        assert_eq!(MoveLabel::from_cpl(0), MoveLabel::Ok);
        assert_eq!(MoveLabel::from_cpl(49), MoveLabel::Ok);
        assert_eq!(MoveLabel::from_cpl(50), MoveLabel::Inaccuracy);
        assert_eq!(MoveLabel::from_cpl(99), MoveLabel::Inaccuracy);
        assert_eq!(MoveLabel::from_cpl(100), MoveLabel::Mistake);
        assert_eq!(MoveLabel::from_cpl(299), MoveLabel::Mistake);
        assert_eq!(MoveLabel::from_cpl(300), MoveLabel::Blunder);
        assert_eq!(MoveLabel::from_cpl(99_000), MoveLabel::Blunder);
    }

    #[test]
    fn test_label_default_is_ok() {
        assert_eq!(MoveLabel::default(), MoveLabel::Ok);
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&MoveLabel::Inaccuracy).unwrap();
        assert_eq!(json, "\"inaccuracy\"");
        let back: MoveLabel = serde_json::from_str("\"blunder\"").unwrap();
        assert_eq!(back, MoveLabel::Blunder);
    }

    #[test]
    fn test_centipawn_loss_floors_at_zero() {
        assert_eq!(centipawn_loss(50, 20), 30);
        assert_eq!(centipawn_loss(20, 50), 0);
        assert_eq!(centipawn_loss(-99_000, 99_000), 0);
        assert_eq!(centipawn_loss(99_000, -99_000), 198_000);
    }

    #[test]
    fn test_accuracy_known_points() {
        assert!((accuracy_from_cpl(0.0) - 99.9999).abs() < 1e-9);
        assert_eq!(accuracy_from_cpl(10_000.0), 0.0);
        assert!((accuracy_from_cpl(-20.0) - accuracy_from_cpl(0.0)).abs() < f64::EPSILON);
        let at_fifty = accuracy_from_cpl(50.0);
        assert!(at_fifty > 8.0 && at_fifty < 9.0, "got {}", at_fifty);
    }

    #[test]
    fn test_label_counts_from_iter() {
        let counts: LabelCounts = [
            MoveLabel::Ok,
            MoveLabel::Blunder,
            MoveLabel::Mistake,
            MoveLabel::Blunder,
            MoveLabel::Inaccuracy,
        ]
        .into_iter()
        .collect();
        assert_eq!(
            counts,
            LabelCounts {
                inaccuracy: 1,
                mistake: 1,
                blunder: 2,
            }
        );
    }

    proptest! {
        #[test]
        fn label_matches_exactly_one_band(cpl in 0i32..2_000) {
            let bands = [
                (cpl < INACCURACY_CPL, MoveLabel::Ok),
                ((INACCURACY_CPL..MISTAKE_CPL).contains(&cpl), MoveLabel::Inaccuracy),
                ((MISTAKE_CPL..BLUNDER_CPL).contains(&cpl), MoveLabel::Mistake),
                (cpl >= BLUNDER_CPL, MoveLabel::Blunder),
            ];
            let matching: Vec<MoveLabel> = bands
                .iter()
                .filter(|(hit, _)| *hit)
                .map(|(_, l)| *l)
                .collect();
            prop_assert_eq!(matching.len(), 1);
            prop_assert_eq!(MoveLabel::from_cpl(cpl), matching[0]);
        }

        #[test]
        fn accuracy_is_bounded_and_non_increasing(a in 0.0f64..5_000.0, b in 0.0f64..5_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let acc_lo = accuracy_from_cpl(lo);
            let acc_hi = accuracy_from_cpl(hi);
            prop_assert!((0.0..=100.0).contains(&acc_lo));
            prop_assert!((0.0..=100.0).contains(&acc_hi));
            prop_assert!(acc_hi <= acc_lo);
        }

        #[test]
        fn loss_is_never_negative(best in -100_000i32..100_000, played in -100_000i32..100_000) {
            let loss = centipawn_loss(best, played);
            prop_assert!(loss >= 0);
            prop_assert_eq!(loss, (best - played).max(0));
        }
    }
}
