//! Configuration file watcher for hot reload.
//!
//! Reloaded configs flow to the server over a channel and are swapped in
//! atomically. Only settings read per request (backend, overload) take
//! effect live; listener, timeout and limit changes need a restart.
//!
//! The parent directory is watched rather than the file itself, since
//! editors often save by writing a new file and renaming it over the old one.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Watches one config file and publishes every effective change.
pub struct ConfigWatcher {
    path: PathBuf,
    current: GatewayConfig,
    bind_override: Option<String>,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// `current` is the config the server started with; reloads equal to
    /// the last published config are dropped.
    pub fn new(
        path: &Path,
        current: GatewayConfig,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current,
            bind_override: None,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Re-apply a command-line bind address to every reloaded file.
    pub fn with_bind_override(mut self, bind_address: Option<String>) -> Self {
        self.bind_override = bind_address;
        self
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(mut self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let watched = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && is_content_change(&event.kind) {
                        self.reload();
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %watched.display(), "Config watcher started");
        Ok(watcher)
    }

    /// Re-read the file and publish it if it differs from the current config.
    ///
    /// Returns whether a new config was published.
    fn reload(&mut self) -> bool {
        let loaded = load_config(&self.path).map(|mut config| {
            if let Some(bind) = &self.bind_override {
                config.listener.bind_address = bind.clone();
            }
            config
        });

        match loaded {
            Ok(new_config) if new_config == self.current => {
                tracing::debug!("Config file touched without changes");
                false
            }
            Ok(new_config) => {
                tracing::info!(path = %self.path.display(), "Config file changed, reloading");
                self.current = new_config.clone();
                self.update_tx.send(new_config).is_ok()
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config; keeping current configuration"
                );
                false
            }
        }
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}
