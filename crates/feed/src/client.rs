use crate::events::parse_line;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use wattcast_core::Sample;

/// Delay before retrying a dropped or refused socket connection.
const RECONNECT_DELAY: tokio::time::Duration = tokio::time::Duration::from_secs(2);

/// State-change feed client.
///
/// Connects to the feed publisher's Unix socket and streams samples for one
/// entity. Automatically reconnects if the connection drops; malformed or
/// non-numeric events are logged and dropped at this boundary so nothing bad
/// ever reaches the sample buffer.
pub struct StateFeed {
    socket: PathBuf,
    entity_id: String,
}

impl StateFeed {
    pub fn new(socket: PathBuf, entity_id: impl Into<String>) -> Self {
        Self {
            socket,
            entity_id: entity_id.into(),
        }
    }

    pub fn socket(&self) -> &std::path::Path {
        &self.socket
    }

    /// Spawn a background task that reads the feed socket and forwards
    /// accepted [`Sample`]s on the returned channel.
    ///
    /// The task reconnects automatically on socket errors and stops when the
    /// receiver is dropped.
    pub fn spawn_listener(self) -> mpsc::Receiver<Sample> {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            loop {
                match UnixStream::connect(&self.socket).await {
                    Ok(stream) => {
                        info!("Connected to feed socket {}", self.socket.display());
                        let mut lines = BufReader::new(stream).lines();

                        while let Ok(Some(line)) = lines.next_line().await {
                            if let Some(sample) = self.accept(&line) {
                                if tx.send(sample).await.is_err() {
                                    return; // all receivers dropped
                                }
                            }
                        }

                        warn!("Feed connection lost; reconnecting in 2s…");
                    }
                    Err(e) => {
                        error!(
                            "Cannot connect to feed socket {}: {e}; retrying in 2s…",
                            self.socket.display()
                        );
                    }
                }

                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });

        rx
    }

    /// One raw line → at most one sample for our entity.
    fn accept(&self, line: &str) -> Option<Sample> {
        let event = match parse_line(line) {
            Ok(ev) => ev,
            Err(e) => {
                error!("Dropping feed line: {e}");
                return None;
            }
        };

        if event.entity_id != self.entity_id {
            return None; // someone else's entity
        }

        match event.to_sample() {
            Ok(Some(sample)) => Some(sample),
            Ok(None) => {
                debug!("{} is {}; skipping", event.entity_id, event.state);
                None
            }
            Err(e) => {
                error!("Unable to sample {}: {e}", event.entity_id);
                None
            }
        }
    }
}
