use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Editors tend to emit a burst of write events per save; changes arriving
/// within this window are coalesced into a single reload notification.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the config file and fires once per (debounced) change.
///
/// # Example
/// ```no_run
/// # use wattcast_config::ConfigWatcher;
/// # async fn demo() {
/// let (_watcher, mut rx) = ConfigWatcher::spawn("/etc/wattcast/wattcast.toml");
/// while rx.recv().await.is_some() {
///     println!("config changed — reloading");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver that fires on every change.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>) {
    use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    let (raw_tx, mut raw_rx) = mpsc::channel::<notify::Result<Event>>(16);

    // notify's callback runs on its own thread; bridge into the tokio world.
    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = raw_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", path.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = raw_rx.recv().await {
        let relevant = match event {
            Ok(e) => matches!(e.kind, EventKind::Modify(_) | EventKind::Create(_)),
            Err(e) => {
                warn!("Watcher error: {e}");
                false
            }
        };
        if !relevant {
            continue;
        }

        // Swallow the rest of the save burst before notifying.
        loop {
            match tokio::time::timeout(DEBOUNCE, raw_rx.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        if tx.send(()).await.is_err() {
            break; // receiver dropped
        }
    }
}
