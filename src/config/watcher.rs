//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors and
//! deploy tools usually replace the file through a rename, which would end a
//! watch placed on the original inode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GateConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver that only ever sees validated configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        (Self { path, update_tx }, update_rx)
    }

    /// Start watching. The returned handle must be kept alive for as long as
    /// reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let target = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }
                if !event.paths.iter().any(|p| p == &target) {
                    return;
                }

                match load_config(&target) {
                    Ok(config) => {
                        tracing::info!(path = %target.display(), "Configuration reloaded");
                        let _ = update_tx.send(config);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected configuration change, keeping current");
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}
