//! UCI engine backend (async I/O over a child process)
//!
//! The engine speaks a line protocol: we send `ucinewgame`, `position fen`
//! and `go`, then read lines until one starts with `bestmove`, ignoring
//! everything else. Every request carries a correlation id and a kind so the
//! caller can tell a move-search reply from a hint reply; replies echo both.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::error::SessionError;

/// Extra wait beyond the requested movetime before the engine counts as gone.
const MOVETIME_GRACE: Duration = Duration::from_secs(5);

/// How long to wait for the `bestmove` that a `stop` command elicits.
const STOP_REPLY_WAIT: Duration = Duration::from_secs(2);

/// What a search result will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// The engine's own move in the game.
    Move,
    /// A suggestion surfaced to the human; never applied.
    Hint,
}

/// One search, correlation-tagged.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub id: u64,
    pub kind: SearchKind,
    pub fen: String,
    pub depth: u8,
    /// Time budget; hints search by depth alone.
    pub movetime_ms: Option<u32>,
}

/// Best-move announcement, echoing the request's tag.
#[derive(Debug, Clone)]
pub struct EngineReply {
    pub id: u64,
    pub kind: SearchKind,
    pub uci: String,
}

/// Seam for the engine process, so tests can script replies.
#[async_trait]
pub trait SearchBackend: Send {
    async fn search(&mut self, req: &SearchRequest) -> Result<EngineReply, SessionError>;

    async fn quit(&mut self) -> Result<(), SessionError>;
}

/// A spawned UCI engine instance
pub struct ProcessEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    depth_only_timeout: Duration,
}

impl ProcessEngine {
    /// Spawn the engine binary and complete the UCI handshake.
    pub async fn spawn(path: &str, depth_only_timeout: Duration) -> Result<Self, SessionError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| SessionError::Engine(format!("Failed to spawn engine: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SessionError::Engine("Engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| SessionError::Engine("Engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            depth_only_timeout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok", Duration::from_secs(5)).await?;
        engine.send("isready").await?;
        engine.wait_for("readyok", Duration::from_secs(5)).await?;

        Ok(engine)
    }

    /// Send one command line to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), SessionError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| SessionError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| SessionError::Engine(format!("Failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    /// Read one line from the engine
    async fn read_line(&mut self) -> Result<String, SessionError> {
        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| SessionError::Engine(format!("Failed to read from engine: {e}")))?;
        if n == 0 {
            return Err(SessionError::Engine("Engine closed its stdout".into()));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for an exact response line, bounded
    async fn wait_for(&mut self, expected: &str, within: Duration) -> Result<(), SessionError> {
        let waited = tokio::time::timeout(within, async {
            loop {
                if self.read_line().await? == expected {
                    return Ok(());
                }
            }
        })
        .await;
        match waited {
            Ok(result) => result,
            Err(_) => Err(SessionError::EngineUnresponsive(within)),
        }
    }

    /// Drain output lines until a best-move announcement shows up.
    async fn read_bestmove(&mut self) -> Result<String, SessionError> {
        loop {
            let line = self.read_line().await?;
            if let Some(token) = parse_bestmove(&line) {
                return Ok(token.to_string());
            }
        }
    }
}

#[async_trait]
impl SearchBackend for ProcessEngine {
    async fn search(&mut self, req: &SearchRequest) -> Result<EngineReply, SessionError> {
        self.send("ucinewgame").await?;
        self.send(&format!("position fen {}", req.fen)).await?;
        let go = match req.movetime_ms {
            Some(ms) => format!("go depth {} movetime {}", req.depth, ms),
            None => format!("go depth {}", req.depth),
        };
        self.send(&go).await?;

        let budget = match req.movetime_ms {
            Some(ms) => Duration::from_millis(u64::from(ms)) + MOVETIME_GRACE,
            None => self.depth_only_timeout,
        };

        match tokio::time::timeout(budget, self.read_bestmove()).await {
            Ok(token) => {
                let uci = token?;
                if !is_move_token(&uci) {
                    return Err(SessionError::Engine(format!(
                        "Unparseable bestmove token: {uci}"
                    )));
                }
                Ok(EngineReply {
                    id: req.id,
                    kind: req.kind,
                    uci,
                })
            }
            Err(_) => {
                warn!(id = req.id, "engine timed out, sending stop");
                // `stop` makes the engine emit the bestmove it still owes for
                // this search; drain it here or the next search would read it
                // as its own reply.
                if self.send("stop").await.is_ok() {
                    let _ = tokio::time::timeout(STOP_REPLY_WAIT, self.read_bestmove()).await;
                }
                Err(SessionError::EngineUnresponsive(budget))
            }
        }
    }

    async fn quit(&mut self) -> Result<(), SessionError> {
        self.send("quit").await?;
        let _ = self.process.wait().await;
        Ok(())
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Extract the move token from a `bestmove` line; `None` for any other line.
fn parse_bestmove(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("bestmove")?;
    rest.split_whitespace().next()
}

/// A 4-character square pair, optionally followed by a promotion letter.
fn is_move_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return false;
    }
    let square_ok = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    if !square_ok(bytes[0], bytes[1]) || !square_ok(bytes[2], bytes[3]) {
        return false;
    }
    bytes.len() == 4 || matches!(bytes[4], b'q' | b'r' | b'b' | b'n')
}
