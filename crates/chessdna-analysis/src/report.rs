//! Report types and the statistics rolled up from per-ply results.

use crate::quality::{accuracy_from_cpl, LabelCounts, MoveLabel};
use crate::walker::Side;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length cap for turning points and worst-ply lists.
pub const MAX_HIGHLIGHTS: usize = 5;

/// Result for one analyzed half-move.
///
/// The evaluation fields are either all set or all `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlyReport {
    pub ply: u32,
    pub san: String,
    pub uci: String,
    pub side: Side,
    /// Best-move score from the mover's perspective, in centipawns.
    pub best_cp: Option<i32>,
    /// Score when forced to play the game move, same perspective.
    pub played_cp: Option<i32>,
    pub cpl: Option<i32>,
    pub accuracy: Option<f64>,
    pub label: MoveLabel,
    /// Engine's preferred move in the position before this ply.
    pub best_move: Option<String>,
    /// Engine's principal variation from the same search.
    #[serde(default)]
    pub pv: Vec<String>,
}

/// Named player's results within one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub avg_cpl: Option<f64>,
    pub accuracy: Option<f64>,
    pub counts: LabelCounts,
    /// Plies with the largest loss, worst first.
    pub worst: Vec<u32>,
}

impl PlayerGameStats {
    fn from_plies<'a>(plies: impl IntoIterator<Item = &'a PlyReport> + Clone) -> Self {
        let avg_cpl = mean_cpl(plies.clone());
        Self {
            avg_cpl,
            accuracy: avg_cpl.map(accuracy_from_cpl),
            counts: count_labels(plies.clone()),
            worst: worst_plies(plies),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub headers: BTreeMap<String, String>,
    pub plies: Vec<PlyReport>,
    pub avg_cpl_white: Option<f64>,
    pub avg_cpl_black: Option<f64>,
    pub accuracy_white: Option<f64>,
    pub accuracy_black: Option<f64>,
    /// Up to five plies with the largest loss across both sides.
    pub turning_points: Vec<u32>,
    /// Side held by the named player, if they played this game.
    pub player_side: Option<Side>,
    pub player: Option<PlayerGameStats>,
}

impl GameReport {
    /// Roll per-ply results up into game statistics.
    pub fn new(
        headers: BTreeMap<String, String>,
        plies: Vec<PlyReport>,
        player: Option<&str>,
    ) -> Self {
        let avg_cpl_white = mean_cpl(plies.iter().filter(|p| p.side == Side::White));
        let avg_cpl_black = mean_cpl(plies.iter().filter(|p| p.side == Side::Black));
        let turning_points = worst_plies(&plies);

        let player_side = player.and_then(|name| detect_player_side(&headers, name));
        let player = player_side
            .map(|side| PlayerGameStats::from_plies(plies.iter().filter(move |p| p.side == side)));

        Self {
            headers,
            plies,
            avg_cpl_white,
            avg_cpl_black,
            accuracy_white: avg_cpl_white.map(accuracy_from_cpl),
            accuracy_black: avg_cpl_black.map(accuracy_from_cpl),
            turning_points,
            player_side,
            player,
        }
    }

    /// Plies made by the named player in this game.
    pub fn player_plies(&self) -> impl Iterator<Item = &PlyReport> + Clone {
        let side = self.player_side;
        self.plies.iter().filter(move |p| Some(p.side) == side)
    }
}

/// Named player's results pooled over every game they were found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOverview {
    pub games_total: usize,
    pub games_found: usize,
    pub avg_cpl: Option<f64>,
    pub accuracy: Option<f64>,
    pub counts: LabelCounts,
}

impl PlayerOverview {
    /// Pool the player's plies across `games`. The average is taken over
    /// all pooled plies, not over per-game averages.
    pub fn from_games(games: &[GameReport]) -> Self {
        let found: Vec<&GameReport> = games.iter().filter(|g| g.player_side.is_some()).collect();
        let pooled = found.iter().flat_map(|g| g.player_plies());
        let avg_cpl = mean_cpl(pooled.clone());

        Self {
            games_total: games.len(),
            games_found: found.len(),
            avg_cpl,
            accuracy: avg_cpl.map(accuracy_from_cpl),
            counts: count_labels(pooled),
        }
    }
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub games: Vec<GameReport>,
    pub engine_path: String,
    /// `id name` reported by the engine; `None` when it was unavailable.
    pub engine_name: Option<String>,
    /// Effective seconds per search, after clamping.
    pub time_per_move: f64,
    /// Effective ply cap, after clamping.
    pub max_plies: u32,
    pub player_name: Option<String>,
    /// Present whenever a player name was given.
    pub player_overview: Option<PlayerOverview>,
}

/// Mean loss over plies that were evaluated; `None` if there are none.
pub fn mean_cpl<'a>(plies: impl IntoIterator<Item = &'a PlyReport>) -> Option<f64> {
    let (sum, count) = plies
        .into_iter()
        .filter_map(|p| p.cpl)
        .fold((0i64, 0usize), |(sum, count), cpl| (sum + i64::from(cpl), count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Ply indices of the largest losses: sorted by loss descending (ties keep
/// ply order), cut to [`MAX_HIGHLIGHTS`], zero losses dropped.
pub fn worst_plies<'a>(plies: impl IntoIterator<Item = &'a PlyReport>) -> Vec<u32> {
    let mut scored: Vec<(u32, i32)> = plies
        .into_iter()
        .filter_map(|p| p.cpl.map(|cpl| (p.ply, cpl)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(MAX_HIGHLIGHTS)
        .filter(|&(_, cpl)| cpl > 0)
        .map(|(ply, _)| ply)
        .collect()
}

/// Which side `name` played, by exact comparison with the White and Black
/// tags.
pub fn detect_player_side(headers: &BTreeMap<String, String>, name: &str) -> Option<Side> {
    if headers.get("White").is_some_and(|white| white == name) {
        Some(Side::White)
    } else if headers.get("Black").is_some_and(|black| black == name) {
        Some(Side::Black)
    } else {
        None
    }
}

fn count_labels<'a>(plies: impl IntoIterator<Item = &'a PlyReport>) -> LabelCounts {
    plies
        .into_iter()
        .filter(|p| p.cpl.is_some())
        .map(|p| p.label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ply(ply: u32, side: Side, cpl: Option<i32>) -> PlyReport {
        PlyReport {
            ply,
            san: "e4".to_string(),
            uci: "e2e4".to_string(),
            side,
            best_cp: cpl.map(|_| 0),
            played_cp: cpl.map(|c| -c),
            cpl,
            accuracy: cpl.map(|c| accuracy_from_cpl(f64::from(c))),
            label: cpl.map(MoveLabel::from_cpl).unwrap_or_default(),
            best_move: None,
            pv: Vec::new(),
        }
    }

    fn alternating(cpls: &[i32]) -> Vec<PlyReport> {
        cpls.iter()
            .enumerate()
            .map(|(i, &cpl)| {
                let side = if i % 2 == 0 { Side::White } else { Side::Black };
                ply(i as u32 + 1, side, Some(cpl))
            })
            .collect()
    }

    fn headers(white: &str, black: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("White".to_string(), white.to_string()),
            ("Black".to_string(), black.to_string()),
        ])
    }

    #[test]
    fn test_side_averages_and_accuracy() {
        let report = GameReport::new(BTreeMap::new(), alternating(&[10, 0, 30, 100]), None);

        assert_eq!(report.avg_cpl_white, Some(20.0));
        assert_eq!(report.avg_cpl_black, Some(50.0));
        assert_eq!(report.accuracy_white, Some(accuracy_from_cpl(20.0)));
        assert_eq!(report.accuracy_black, Some(accuracy_from_cpl(50.0)));
    }

    #[test]
    fn test_side_without_moves_has_no_average() {
        let report = GameReport::new(BTreeMap::new(), alternating(&[40]), None);
        assert_eq!(report.avg_cpl_white, Some(40.0));
        assert_eq!(report.avg_cpl_black, None);
        assert_eq!(report.accuracy_black, None);
    }

    #[test]
    fn test_turning_points_top_five_stable() {
        let report = GameReport::new(
            BTreeMap::new(),
            alternating(&[5, 120, 0, 120, 300, 60, 7, 45, 200]),
            None,
        );
        // 300, 200, then the two 120s in ply order, then 60.
        assert_eq!(report.turning_points, vec![5, 9, 2, 4, 6]);
    }

    #[test]
    fn test_turning_points_exclude_zero_loss() {
        let report = GameReport::new(BTreeMap::new(), alternating(&[0, 0, 0, 0]), None);
        assert!(report.turning_points.is_empty());

        let report = GameReport::new(BTreeMap::new(), alternating(&[0, 80, 0]), None);
        assert_eq!(report.turning_points, vec![2]);
    }

    #[test]
    fn test_unevaluated_game_has_no_statistics() {
        let plies = vec![ply(1, Side::White, None), ply(2, Side::Black, None)];
        let report = GameReport::new(headers("A", "B"), plies, Some("B"));

        assert_eq!(report.avg_cpl_white, None);
        assert_eq!(report.avg_cpl_black, None);
        assert!(report.turning_points.is_empty());
        assert_eq!(report.player_side, Some(Side::Black));

        let player = report.player.unwrap();
        assert_eq!(player.avg_cpl, None);
        assert_eq!(player.accuracy, None);
        assert_eq!(player.counts, LabelCounts::default());
        assert!(player.worst.is_empty());
    }

    #[test]
    fn test_player_side_exact_match_only() {
        let h = headers("Magnus", "Hikaru");
        assert_eq!(detect_player_side(&h, "Magnus"), Some(Side::White));
        assert_eq!(detect_player_side(&h, "Hikaru"), Some(Side::Black));
        assert_eq!(detect_player_side(&h, "magnus"), None);
        assert_eq!(detect_player_side(&h, " Hikaru"), None);
        assert_eq!(detect_player_side(&BTreeMap::new(), "Hikaru"), None);
    }

    #[test]
    fn test_player_stats_cover_their_side_only() {
        let report = GameReport::new(
            headers("Alice", "Bob"),
            alternating(&[0, 350, 10, 120, 20, 60]),
            Some("Bob"),
        );

        assert_eq!(report.player_side, Some(Side::Black));
        let player = report.player.unwrap();
        assert!((player.avg_cpl.unwrap() - 530.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            player.counts,
            LabelCounts {
                inaccuracy: 1,
                mistake: 1,
                blunder: 1
            }
        );
        assert_eq!(player.worst, vec![2, 4, 6]);
    }

    #[test]
    fn test_unknown_player_gets_no_substats() {
        let report = GameReport::new(
            headers("Alice", "Bob"),
            alternating(&[10, 20]),
            Some("Carol"),
        );
        assert_eq!(report.player_side, None);
        assert!(report.player.is_none());
    }

    #[test]
    fn test_overview_pools_plies_not_game_averages() {
        let one = GameReport::new(headers("P", "X"), alternating(&[300]), Some("P"));
        let three = GameReport::new(
            headers("P", "Y"),
            alternating(&[0, 90, 0, 90, 0]),
            Some("P"),
        );
        let absent = GameReport::new(headers("X", "Y"), alternating(&[500, 500]), Some("P"));

        let overview = PlayerOverview::from_games(&[one, three, absent]);
        assert_eq!(overview.games_total, 3);
        assert_eq!(overview.games_found, 2);
        assert_eq!(overview.avg_cpl, Some(75.0));
        assert_eq!(overview.accuracy, Some(accuracy_from_cpl(75.0)));
        assert_eq!(overview.counts.blunder, 1);
        assert_eq!(overview.counts.inaccuracy, 0);
    }

    #[test]
    fn test_overview_with_player_nowhere() {
        let game = GameReport::new(headers("X", "Y"), alternating(&[10]), Some("P"));
        let overview = PlayerOverview::from_games(&[game]);
        assert_eq!(overview.games_total, 1);
        assert_eq!(overview.games_found, 0);
        assert_eq!(overview.avg_cpl, None);
        assert_eq!(overview.accuracy, None);
    }

    #[test]
    fn test_report_serializes_lowercase_enums_and_nulls() {
        let report = GameReport::new(headers("A", "B"), vec![ply(1, Side::White, None)], Some("A"));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["player_side"], "white");
        assert_eq!(json["plies"][0]["side"], "white");
        assert_eq!(json["plies"][0]["label"], "ok");
        assert!(json["plies"][0]["cpl"].is_null());
        assert!(json["avg_cpl_white"].is_null());
        assert_eq!(json["headers"]["White"], "A");
    }
}
