//! UCI info line types.

use crate::UciError;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::str::FromStr;

/// Score in centipawns or mate distance, from the side to move's point of view.
///
/// Grammar (the tokens following `score` on an `info` line):
///
/// ```text
/// score := ("cp" | "mate") <signed-int>
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = side to move is mated).
    Mate(i32),
}

impl Score {
    /// Parse the two tokens that follow `score`. Trailing tokens are ignored.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self, UciError> {
        let (kind, value) = match tokens {
            [kind, value, ..] => (*kind, *value),
            _ => {
                return Err(UciError::ParseError(format!(
                    "Expected '(cp|mate) <int>', got '{}'",
                    tokens.join(" ")
                )))
            }
        };

        let value: i32 = value
            .parse()
            .map_err(|_| UciError::ParseError(format!("Invalid score value '{}'", value)))?;

        match kind {
            "cp" => Ok(Score::Cp(value)),
            "mate" => Ok(Score::Mate(value)),
            other => Err(UciError::ParseError(format!(
                "Unknown score kind '{}'",
                other
            ))),
        }
    }

    /// Format as the tokens following `score`.
    pub fn to_uci(&self) -> String {
        match self {
            Score::Cp(cp) => format!("cp {}", cp),
            Score::Mate(m) => format!("mate {}", m),
        }
    }
}

impl FromStr for Score {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        Score::from_tokens(&tokens)
    }
}

/// One `info` line, reduced to the fields an analysis GUI cares about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    /// Multi-PV line index (1 = best line).
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    /// Milliseconds searched so far.
    pub time: Option<u64>,
    /// Principal variation, in coordinate notation.
    pub pv: Vec<String>,
    /// Free text after `string`.
    pub string: Option<String>,
}

impl EngineInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format as the engine would print it.
    pub fn to_uci(&self) -> String {
        let mut line = String::from("info");
        for (key, value) in [
            ("depth", self.depth.map(u64::from)),
            ("seldepth", self.seldepth.map(u64::from)),
            ("multipv", self.multipv.map(u64::from)),
        ] {
            if let Some(value) = value {
                let _ = write!(line, " {} {}", key, value);
            }
        }
        if let Some(score) = self.score {
            let _ = write!(line, " score {}", score.to_uci());
        }
        for (key, value) in [("nodes", self.nodes), ("time", self.time)] {
            if let Some(value) = value {
                let _ = write!(line, " {} {}", key, value);
            }
        }
        if !self.pv.is_empty() {
            let _ = write!(line, " pv {}", self.pv.join(" "));
        }
        if let Some(text) = &self.string {
            let _ = write!(line, " string {}", text);
        }
        line
    }

    /// Parse an `info` line.
    ///
    /// Returns `None` if the line is not an `info` line. Unknown keys and
    /// malformed values are skipped; they never fail the whole line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().peekable();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::new();
        while let Some(key) = tokens.next() {
            match key {
                "depth" => info.depth = next_number(&mut tokens),
                "seldepth" => info.seldepth = next_number(&mut tokens),
                "multipv" => info.multipv = next_number(&mut tokens),
                "nodes" => info.nodes = next_number(&mut tokens),
                "time" => info.time = next_number(&mut tokens),
                "score" => {
                    let ahead: Vec<&str> = tokens.clone().take(2).collect();
                    if let Ok(score) = Score::from_tokens(&ahead) {
                        info.score = Some(score);
                        tokens.nth(1);
                    }
                }
                "pv" => {
                    while let Some(mv) = tokens.next_if(|t| !is_info_keyword(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                // Consumes the rest of the line.
                "string" => info.string = Some(tokens.by_ref().collect::<Vec<_>>().join(" ")),
                _ => {}
            }
        }

        Some(info)
    }
}

fn next_number<'a, T: FromStr>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<T> {
    tokens.next()?.parse().ok()
}

fn is_info_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Builder for constructing EngineInfo.
#[derive(Default)]
pub struct InfoBuilder {
    info: EngineInfo,
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, d: u32) -> Self {
        self.info.depth = Some(d);
        self
    }

    pub fn score_cp(mut self, cp: i32) -> Self {
        self.info.score = Some(Score::Cp(cp));
        self
    }

    pub fn score_mate(mut self, moves: i32) -> Self {
        self.info.score = Some(Score::Mate(moves));
        self
    }

    pub fn nodes(mut self, n: u64) -> Self {
        self.info.nodes = Some(n);
        self
    }

    pub fn pv(mut self, moves: &[&str]) -> Self {
        self.info.pv = moves.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.info.string = Some(s.to_string());
        self
    }

    pub fn build(self) -> EngineInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn info_to_uci() {
        let info = InfoBuilder::new()
            .depth(10)
            .score_cp(35)
            .nodes(50000)
            .pv(&["e2e4", "e7e5"])
            .build();

        let uci = info.to_uci();
        assert!(uci.contains("depth 10"));
        assert!(uci.contains("score cp 35"));
        assert!(uci.contains("nodes 50000"));
        assert!(uci.ends_with("pv e2e4 e7e5"));
    }

    #[test]
    fn parse_info() {
        let line = "info depth 12 score cp 30 nodes 125000 nps 500000 pv e2e4 e7e5 g1f3";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.depth, Some(12));
        assert_eq!(info.score, Some(Score::Cp(30)));
        assert_eq!(info.nodes, Some(125000));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn parse_mate_score() {
        let line = "info depth 20 score mate 3 pv e2e4";
        let info = EngineInfo::parse(line).unwrap();

        assert_eq!(info.score, Some(Score::Mate(3)));
    }

    #[test]
    fn parse_negative_mate_score() {
        let info = EngineInfo::parse("info depth 9 seldepth 14 score mate -2 pv h7h8").unwrap();
        assert_eq!(info.score, Some(Score::Mate(-2)));
        assert_eq!(info.seldepth, Some(14));
    }

    #[test]
    fn parse_score_with_bound_flag() {
        let line = "info depth 18 multipv 1 score cp 41 lowerbound nodes 900 pv d2d4";
        let info = EngineInfo::parse(line).unwrap();
        assert_eq!(info.score, Some(Score::Cp(41)));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.nodes, Some(900));
        assert_eq!(info.pv, vec!["d2d4"]);
    }

    #[test]
    fn parse_info_without_score() {
        let info =
            EngineInfo::parse("info depth 3 currmove e2e4 currmovenumber 1 time 12").unwrap();
        assert_eq!(info.score, None);
        assert_eq!(info.depth, Some(3));
        assert_eq!(info.time, Some(12));
        assert!(info.pv.is_empty());
    }

    #[test]
    fn parse_pv_stops_at_next_keyword() {
        let info = EngineInfo::parse("info pv e2e4 e7e5 nps 900 score cp 12").unwrap();
        assert_eq!(info.pv, vec!["e2e4", "e7e5"]);
        assert_eq!(info.score, Some(Score::Cp(12)));
    }

    #[test]
    fn parse_info_string_consumes_rest() {
        let info =
            EngineInfo::parse("info string NNUE evaluation using nn-1.nnue enabled").unwrap();
        assert_eq!(
            info.string.as_deref(),
            Some("NNUE evaluation using nn-1.nnue enabled")
        );
        assert_eq!(info.score, None);
    }

    #[test]
    fn parse_malformed_score_is_skipped() {
        let info = EngineInfo::parse("info depth 4 score cp abc nodes 10").unwrap();
        assert_eq!(info.score, None);
        assert_eq!(info.nodes, Some(10));

        let info = EngineInfo::parse("info depth 4 score").unwrap();
        assert_eq!(info.score, None);
    }

    #[test]
    fn parse_non_info_line() {
        assert!(EngineInfo::parse("bestmove e2e4").is_none());
        assert!(EngineInfo::parse("information").is_none());
    }

    #[test]
    fn score_from_str() {
        assert_eq!("cp -45".parse::<Score>().unwrap(), Score::Cp(-45));
        assert_eq!("mate 1".parse::<Score>().unwrap(), Score::Mate(1));
        assert!("wdl 1 2 3".parse::<Score>().is_err());
        assert!("cp".parse::<Score>().is_err());
    }

    proptest! {
        #[test]
        fn score_line_roundtrip(cp in -5000i32..5000, depth in 1u32..60) {
            let line = InfoBuilder::new().depth(depth).score_cp(cp).pv(&["e2e4"]).build().to_uci();
            let info = EngineInfo::parse(&line).unwrap();
            prop_assert_eq!(info.score, Some(Score::Cp(cp)));
            prop_assert_eq!(info.depth, Some(depth));
        }
    }
}
