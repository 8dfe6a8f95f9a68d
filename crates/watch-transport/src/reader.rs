//! JSONL feed parsing.
//!
//! A feed is a file of one JSON object per line:
//! `{"id": 12, "person": "alice", "message": "hello"}`. Lines that fail to
//! parse are skipped so a single bad write cannot stall a room.

use std::io::SeekFrom;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

use watch_core::models::ChatMessage;

/// Messages read from a feed plus the offset to resume from.
#[derive(Debug, Default)]
pub struct FeedChunk {
    pub messages: Vec<ChatMessage>,
    /// Byte offset just past the last consumed line.
    pub offset: u64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a single feed line. Blank and malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<ChatMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ChatMessage>(line) {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!(error = %e, "skipping malformed feed line");
            None
        }
    }
}

/// Read everything appended to `path` since `offset`.
///
/// Only newline-terminated lines are consumed unless `include_partial` is
/// set, so a line still being written is picked up on the next call. If the
/// file is now shorter than `offset` it was truncated and is read from the
/// start again.
pub async fn read_appended(
    path: &Path,
    offset: u64,
    include_partial: bool,
) -> std::io::Result<FeedChunk> {
    let mut file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();

    let start = if len < offset {
        warn!(
            path = %path.display(),
            offset,
            len,
            "feed truncated; reading from the beginning"
        );
        0
    } else {
        offset
    };

    file.seek(SeekFrom::Start(start)).await?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;

    let consumed = if include_partial {
        buf.len()
    } else {
        buf.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1)
    };

    let text = String::from_utf8_lossy(&buf[..consumed]);
    let messages: Vec<ChatMessage> = text.lines().filter_map(parse_line).collect();

    Ok(FeedChunk {
        messages,
        offset: start + consumed as u64,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
