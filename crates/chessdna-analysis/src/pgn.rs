//! PGN input: games, headers and mainline moves.

use crate::walker::walk_game;
use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use tracing::warn;

/// One game as read from PGN: its tag pairs and mainline SAN tokens.
///
/// Moves are not checked for legality here; [`walk_game`] stops at the first
/// one that does not apply.
#[derive(Debug, Clone, Default)]
pub struct ParsedGame {
    pub headers: BTreeMap<String, String>,
    pub sans: Vec<SanPlus>,
}

impl ParsedGame {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Custom start position from the `FEN` tag, if any.
    pub fn start_fen(&self) -> Option<&str> {
        self.header("FEN").map(str::trim).filter(|fen| !fen.is_empty())
    }
}

/// Collects one game per `read_game` call. Variations are skipped.
struct GameCollector;

impl Visitor for GameCollector {
    type Tags = BTreeMap<String, String>;
    type Movetext = ParsedGame;
    type Output = ParsedGame;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(BTreeMap::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        tags.insert(
            String::from_utf8_lossy(key).into_owned(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(ParsedGame {
            headers: tags,
            sans: Vec::new(),
        })
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, game: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        game.sans.push(san_plus);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: Self::Movetext) -> Self::Output {
        game
    }
}

/// Read every game in `text`, in order.
///
/// Reading stops quietly at the first I/O-level failure; whatever was read
/// before it is returned.
pub fn read_games(text: &str) -> Vec<ParsedGame> {
    let mut reader = Reader::new(text.as_bytes());
    let mut games = Vec::new();
    loop {
        match reader.read_game(&mut GameCollector) {
            Ok(Some(game)) => games.push(game),
            Ok(None) => break,
            Err(e) => {
                warn!("stopped reading PGN after {} games: {}", games.len(), e);
                break;
            }
        }
    }
    games
}

/// Summary of a PGN collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgnInfo {
    pub games: usize,
    pub plies_min: Option<usize>,
    pub plies_max: Option<usize>,
    pub plies_avg: Option<f64>,
}

/// Count games and legal mainline plies.
pub fn pgn_info(text: &str) -> PgnInfo {
    let plies: Vec<usize> = read_games(text)
        .iter()
        .map(|game| walk_game(game, usize::MAX).len())
        .collect();

    let plies_avg = if plies.is_empty() {
        None
    } else {
        Some(plies.iter().sum::<usize>() as f64 / plies.len() as f64)
    };

    PgnInfo {
        games: plies.len(),
        plies_min: plies.iter().copied().min(),
        plies_max: plies.iter().copied().max(),
        plies_avg,
    }
}

/// One line of a game picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePreview {
    pub index: usize,
    pub white: String,
    pub black: String,
    pub result: String,
    pub date: String,
    pub event: String,
    pub site: String,
}

/// List up to `max_games` games with their headline tags.
///
/// Missing tags show as `?` (`*` for the result). `UTCDate` is preferred
/// over `Date`.
pub fn preview_games(text: &str, max_games: usize) -> Vec<GamePreview> {
    read_games(text)
        .iter()
        .take(max_games)
        .enumerate()
        .map(|(index, game)| {
            let tag = |key: &str| {
                game.header(key)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
            };
            GamePreview {
                index,
                white: tag("White").unwrap_or("?").to_string(),
                black: tag("Black").unwrap_or("?").to_string(),
                result: tag("Result").unwrap_or("*").to_string(),
                date: tag("UTCDate").or_else(|| tag("Date")).unwrap_or("?").to_string(),
                event: tag("Event").unwrap_or("?").to_string(),
                site: tag("Site").unwrap_or("?").to_string(),
            }
        })
        .collect()
}
