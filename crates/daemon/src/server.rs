// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection handling.

use linger_core::ActiveGuard;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Echo lines back to the client until it disconnects.
///
/// The guard keeps the connection counted as active for its whole lifetime.
pub async fn handle_connection<S>(stream: S, _active: ActiveGuard) -> Result<u64, ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    let mut echoed = 0;
    while let Some(line) = lines.next_line().await? {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        echoed += 1;
    }

    debug!(echoed, "client disconnected");
    Ok(echoed)
}

/// Errors from connection handling
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
