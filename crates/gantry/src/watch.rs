//! Watch mode
//!
//! Watches the app source tree and re-runs a rebuild plan after each burst
//! of matching changes. A failed rebuild is reported and watching goes on.

use crate::config::PipelineConfig;
use crate::pipeline::{PipelinePlan, Sequencer};
use crate::result::{GantryError, GantryResult};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Recursive watcher over the app sources
#[derive(Debug, Clone)]
pub struct SourceWatcher {
    dir: PathBuf,
    extensions: Vec<String>,
    debounce: Duration,
}

impl SourceWatcher {
    /// Create a watcher
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, extensions: Vec<String>, debounce: Duration) -> Self {
        Self {
            dir: dir.into(),
            extensions,
            debounce,
        }
    }

    /// Watch `appDir` for the configured extensions
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.app_path(),
            config.watch.extensions.clone(),
            Duration::from_millis(config.watch.debounce_ms),
        )
    }

    /// Watched directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a changed path should trigger a rebuild
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|p| p == ext))
    }

    fn relevant(event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
    }

    /// Rebuild on change until `shutdown` resolves; returns the number of
    /// rebuilds run
    pub async fn run_until<F>(
        &self,
        sequencer: &Sequencer,
        rebuild: &PipelinePlan,
        shutdown: F,
    ) -> GantryResult<usize>
    where
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let filter = self.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) if Self::relevant(&event) => {
                    for path in event.paths.into_iter().filter(|p| filter.matches(p)) {
                        let _ = tx.send(path);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "watch error"),
            },
            Config::default(),
        )
        .map_err(watch_error)?;
        watcher
            .watch(&self.dir, RecursiveMode::Recursive)
            .map_err(watch_error)?;
        tracing::info!(dir = %self.dir.display(), extensions = ?self.extensions, "watching");

        tokio::pin!(shutdown);
        let mut rebuilds = 0;
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                first = rx.recv() => {
                    let Some(first) = first else {
                        return Err(GantryError::Watch {
                            message: "watcher stopped unexpectedly".to_string(),
                        });
                    };
                    let changed = self.drain_burst(first, &mut rx).await;
                    tracing::info!(files = changed.len(), first = %changed[0].display(), "change detected");

                    let report = sequencer.run(rebuild).await?;
                    rebuilds += 1;
                    if let Some(stage) = report.failed_stage() {
                        tracing::warn!(stage, "rebuild failed; still watching");
                    }
                }
            }
        }
        drop(watcher);
        Ok(rebuilds)
    }

    /// Collect events until the debounce window passes quietly
    async fn drain_burst(&self, first: PathBuf, rx: &mut UnboundedReceiver<PathBuf>) -> Vec<PathBuf> {
        let mut changed = vec![first];
        while let Ok(Some(path)) = tokio::time::timeout(self.debounce, rx.recv()).await {
            if !changed.contains(&path) {
                changed.push(path);
            }
        }
        changed
    }
}

fn watch_error(e: notify::Error) -> GantryError {
    GantryError::Watch {
        message: e.to_string(),
    }
}
