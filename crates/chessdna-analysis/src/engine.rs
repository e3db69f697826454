//! UCI engine process driver.
//!
//! [`UciEngine`] owns one engine subprocess and talks to it strictly
//! request/response: one search is sent, its `bestmove` line is consumed,
//! and only then may the next request go out.
//!
//! ```text
//! Uninitialized -> Handshaking -> Ready -> Searching -> Ready -> ... -> Stopped
//! ```

use crate::Evaluation;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace};
use uci::{EngineMessage, GoOptions, GuiCommand};

/// Maximum number of lines to read while waiting for a handshake token.
pub const MAX_HANDSHAKE_LINES: usize = 1000;

/// Errors that can occur when working with chess engines.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine binary is missing or could not be launched.
    #[error("Engine unavailable at '{path}': {reason}")]
    Unavailable { path: String, reason: String },
    /// The engine closed its output or never produced an expected token.
    #[error("Engine protocol error: {0}")]
    Protocol(String),
    /// Writing a command to the engine failed.
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A request was issued while the engine was not idle.
    #[error("Engine not ready (state: {0:?})")]
    NotReady(EngineState),
    /// The engine produced no output within the configured hard timeout.
    #[error("Engine produced no output for {0:?}; process killed")]
    Timeout(Duration),
}

impl EngineError {
    /// True when the engine never came up, as opposed to failing mid-stream.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable { .. })
    }
}

/// Lifecycle of an engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Handshaking,
    Ready,
    Searching,
    Stopped,
}

/// One evaluation request.
#[derive(Debug, Clone, Copy)]
pub struct EvalRequest<'a> {
    /// Start position; `None` is the standard initial position.
    pub start_fen: Option<&'a str>,
    /// Moves in coordinate notation, replayed from the start position.
    pub moves: &'a [String],
    /// Search time hint in milliseconds.
    pub movetime_ms: u64,
    /// Restrict the search to this single move.
    pub search_move: Option<&'a str>,
}

/// Result of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEval {
    /// Last score reported, or [`Evaluation::EQUAL`] if none was.
    pub evaluation: Evaluation,
    /// The move announced on the `bestmove` line, if any.
    pub best_move: Option<String>,
    /// Principal variation from the last `info` line that carried one.
    pub pv: Vec<String>,
    /// Depth of the last scored `info` line.
    pub depth: Option<u32>,
}

/// Anything that can score a position, optionally restricted to one move.
///
/// Implementations must finish a request before accepting the next one.
pub trait PositionEvaluator {
    /// Name the evaluator reports for itself.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Reset per-game state. Called once before each game.
    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Search the requested position and report the score from the side to
    /// move's perspective.
    fn evaluate(&mut self, request: &EvalRequest<'_>) -> Result<EngineEval, EngineError>;

    /// Release whatever the evaluator holds. Must not fail.
    fn shutdown(&mut self) {}
}

/// Driver for one UCI engine process.
pub struct UciEngine {
    /// The engine process handle (absent for stream-attached engines).
    process: Option<Child>,
    /// Writer for sending commands to the engine.
    stdin: Box<dyn Write + Send>,
    /// Lines read from the engine by the reader thread.
    lines: Receiver<String>,
    state: EngineState,
    /// The engine's name (reported via UCI id).
    name: Option<String>,
    hard_timeout: Option<Duration>,
}

impl UciEngine {
    /// Launch an engine binary and perform the UCI handshake.
    ///
    /// A bare name (no path separator) is resolved through `PATH` by the OS;
    /// anything that looks like a path must point at an existing file.
    ///
    /// `hard_timeout` bounds how long any single read may wait for output.
    /// When it elapses the process is killed and the call fails with
    /// [`EngineError::Timeout`]. `None` blocks indefinitely.
    ///
    /// # Errors
    ///
    /// - `EngineError::Unavailable` if the binary is missing or cannot be spawned
    /// - `EngineError::Protocol` if `uciok`/`readyok` never arrive
    pub fn start(engine_path: &str, hard_timeout: Option<Duration>) -> Result<Self, EngineError> {
        let path = engine_path.trim();
        if path.is_empty() {
            return Err(EngineError::Unavailable {
                path: engine_path.to_string(),
                reason: "no engine path configured".to_string(),
            });
        }

        let as_path = Path::new(path);
        if as_path.components().count() > 1 && !as_path.is_file() {
            return Err(EngineError::Unavailable {
                path: path.to_string(),
                reason: "not a file".to_string(),
            });
        }

        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Unavailable {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            let _ = process.kill();
            let _ = process.wait();
            return Err(EngineError::Protocol("engine pipes unavailable".to_string()));
        };

        let mut engine = Self::attach(
            Some(process),
            BufReader::new(stdout),
            stdin,
            hard_timeout,
        );
        engine.handshake()?;
        info!(
            engine = engine.name().unwrap_or("unknown"),
            path, "engine ready"
        );
        Ok(engine)
    }

    /// Perform the UCI handshake with an engine reachable over arbitrary
    /// streams (a socket, a pipe to a remote process, a scripted transcript).
    pub fn connect<R, W>(
        reader: R,
        writer: W,
        hard_timeout: Option<Duration>,
    ) -> Result<Self, EngineError>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let mut engine = Self::attach(None, reader, writer, hard_timeout);
        engine.handshake()?;
        Ok(engine)
    }

    fn attach<R, W>(
        process: Option<Child>,
        reader: R,
        writer: W,
        hard_timeout: Option<Duration>,
    ) -> Self
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            process,
            stdin: Box::new(writer),
            lines: spawn_line_reader(reader),
            state: EngineState::Uninitialized,
            name: None,
            hard_timeout,
        }
    }

    /// Returns the engine's name as reported via UCI protocol.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// `uci` until `uciok`, then `isready` until `readyok`.
    fn handshake(&mut self) -> Result<(), EngineError> {
        self.expect_state(EngineState::Uninitialized)?;
        self.state = EngineState::Handshaking;

        self.send(&GuiCommand::Uci)?;
        let mut got_uciok = false;
        for _ in 0..MAX_HANDSHAKE_LINES {
            match EngineMessage::parse(&self.read_line()?) {
                EngineMessage::Id {
                    name: Some(name), ..
                } => self.name = Some(name),
                EngineMessage::UciOk => {
                    got_uciok = true;
                    break;
                }
                _ => {}
            }
        }
        if !got_uciok {
            return Err(EngineError::Protocol("no uciok after uci".to_string()));
        }

        self.wait_ready()?;
        self.state = EngineState::Ready;
        Ok(())
    }

    fn wait_ready(&mut self) -> Result<(), EngineError> {
        self.send(&GuiCommand::IsReady)?;
        for _ in 0..MAX_HANDSHAKE_LINES {
            if EngineMessage::parse(&self.read_line()?) == EngineMessage::ReadyOk {
                return Ok(());
            }
        }
        Err(EngineError::Protocol("no readyok after isready".to_string()))
    }

    /// Tell the engine the next positions belong to a different game.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.expect_state(EngineState::Ready)?;
        self.send(&GuiCommand::UciNewGame)?;
        self.wait_ready()
    }

    /// Set the position, run a timed search and collect its result.
    ///
    /// Every `info` line with a score replaces the last-known score; the
    /// `bestmove` line ends the search. A search that never reported a score
    /// evaluates to [`Evaluation::EQUAL`].
    pub fn evaluate(&mut self, request: &EvalRequest<'_>) -> Result<EngineEval, EngineError> {
        self.expect_state(EngineState::Ready)?;

        self.send(&GuiCommand::Position {
            fen: request.start_fen.map(str::to_string),
            moves: request.moves.to_vec(),
        })?;
        self.send(&GuiCommand::Go(GoOptions::movetime(
            request.movetime_ms,
            request.search_move,
        )))?;
        self.state = EngineState::Searching;

        let mut evaluation = None;
        let mut depth = None;
        let mut pv = Vec::new();

        let best_move = loop {
            match EngineMessage::parse(&self.read_line()?) {
                EngineMessage::Info(info) => {
                    if let Some(score) = info.score {
                        evaluation = Some(Evaluation::from(score));
                        depth = info.depth;
                    }
                    if !info.pv.is_empty() {
                        pv = info.pv;
                    }
                }
                EngineMessage::BestMove { mv, .. } => break mv,
                _ => {}
            }
        };

        self.state = EngineState::Ready;
        Ok(EngineEval {
            evaluation: evaluation.unwrap_or(Evaluation::EQUAL),
            best_move,
            pv,
            depth,
        })
    }

    /// Shut the engine down: `stop` if searching, `quit`, then kill.
    ///
    /// Every step is best-effort. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }
        if self.state == EngineState::Searching {
            if let Err(e) = self.send(&GuiCommand::Stop) {
                debug!("stop not delivered: {}", e);
            }
        }
        if let Err(e) = self.send(&GuiCommand::Quit) {
            debug!("quit not delivered: {}", e);
        }
        self.kill();
    }

    fn kill(&mut self) {
        self.state = EngineState::Stopped;
        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.kill() {
                debug!("kill failed: {}", e);
            }
            let _ = process.wait();
        }
    }

    fn expect_state(&self, expected: EngineState) -> Result<(), EngineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::NotReady(self.state))
        }
    }

    /// Send a command to the engine.
    fn send(&mut self, command: &GuiCommand) -> Result<(), EngineError> {
        let line = command.to_uci();
        trace!(target: "uci", ">> {}", line);
        writeln!(self.stdin, "{}", line)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Read a line from the engine's output.
    fn read_line(&mut self) -> Result<String, EngineError> {
        let line = match self.hard_timeout {
            Some(limit) => match self.lines.recv_timeout(limit) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => {
                    self.kill();
                    return Err(EngineError::Timeout(limit));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(output_closed()),
            },
            None => self.lines.recv().map_err(|_| output_closed())?,
        };
        let line = line.trim().to_string();
        trace!(target: "uci", "<< {}", line);
        Ok(line)
    }
}

impl PositionEvaluator for UciEngine {
    fn name(&self) -> Option<&str> {
        UciEngine::name(self)
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        UciEngine::new_game(self)
    }

    fn evaluate(&mut self, request: &EvalRequest<'_>) -> Result<EngineEval, EngineError> {
        UciEngine::evaluate(self, request)
    }

    fn shutdown(&mut self) {
        self.stop();
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn output_closed() -> EngineError {
    EngineError::Protocol("engine output closed unexpectedly".to_string())
}

/// Forward engine output line by line so reads can be bounded by a timeout.
fn spawn_line_reader<R: BufRead + Send + 'static>(reader: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in reader.lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
