//! Vendor Patch Swap
//!
//! Temporarily replaces a third-party file with a stub so the code under
//! test can be instrumented, then puts the original back.
//!
//! ```text
//!            patch()                 restore()
//! ORIGINAL ──────────► PATCHED ──────────────► ORIGINAL
//!    │ restore(): NoBackup  │ patch(): AlreadyPatched
//! ```
//!
//! The backup file doubles as the persisted state: a swap first used while
//! a backup exists starts out `Patched`, so a crashed run can be restored
//! and never clobbers the only copy of the original.

use crate::config::PipelineConfig;
use crate::result::{GantryError, GantryResult};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Vendor file state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorState {
    /// Live file holds the vendor's content
    Original,
    /// Live file holds the stub; the original is in the backup
    Patched,
}

/// Live/backup/stub triple guarded by the swap state machine
#[derive(Debug)]
pub struct VendorPatch {
    live: PathBuf,
    backup: PathBuf,
    stub: PathBuf,
    /// `None` until the backup file has been checked
    state: Mutex<Option<VendorState>>,
}

impl VendorPatch {
    /// Create a swap; its state is read from the backup file on first use
    #[must_use]
    pub fn new(live: impl Into<PathBuf>, backup: impl Into<PathBuf>, stub: impl Into<PathBuf>) -> Self {
        Self {
            live: live.into(),
            backup: backup.into(),
            stub: stub.into(),
            state: Mutex::new(None),
        }
    }

    /// Create a swap from the `vendor` section of a configuration
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.resolve(&config.vendor.live),
            config.resolve(&config.vendor.backup),
            config.resolve(&config.vendor.stub),
        )
    }

    /// Current state
    pub async fn state(&self) -> GantryResult<VendorState> {
        let mut state = self.state.lock().await;
        self.detect(&mut state).await
    }

    async fn detect(&self, state: &mut Option<VendorState>) -> GantryResult<VendorState> {
        if let Some(known) = *state {
            return Ok(known);
        }
        let detected = if tokio::fs::try_exists(&self.backup).await? {
            VendorState::Patched
        } else {
            VendorState::Original
        };
        tracing::debug!(backup = %self.backup.display(), state = ?detected, "detected vendor state");
        *state = Some(detected);
        Ok(detected)
    }

    /// Live file path
    #[must_use]
    pub fn live(&self) -> &Path {
        &self.live
    }

    /// Backup file path
    #[must_use]
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Back up the live file and install the stub
    pub async fn patch(&self) -> GantryResult<()> {
        let mut state = self.state.lock().await;
        if self.detect(&mut state).await? == VendorState::Patched
            || tokio::fs::try_exists(&self.backup).await?
        {
            *state = Some(VendorState::Patched);
            return Err(GantryError::AlreadyPatched {
                live: self.live.clone(),
                backup: self.backup.clone(),
            });
        }

        let _ = tokio::fs::copy(&self.live, &self.backup).await?;
        if let Err(e) = tokio::fs::copy(&self.stub, &self.live).await {
            // live is untouched; drop the backup so the next patch can run
            let _ = tokio::fs::remove_file(&self.backup).await;
            return Err(e.into());
        }

        *state = Some(VendorState::Patched);
        tracing::info!(live = %self.live.display(), stub = %self.stub.display(), "vendor file patched");
        Ok(())
    }

    /// Copy the backup over the live file and remove the backup
    pub async fn restore(&self) -> GantryResult<()> {
        let mut state = self.state.lock().await;
        let no_backup = || GantryError::NoBackup {
            backup: self.backup.clone(),
        };
        if self.detect(&mut state).await? == VendorState::Original {
            return Err(no_backup());
        }
        if !tokio::fs::try_exists(&self.backup).await? {
            *state = Some(VendorState::Original);
            return Err(no_backup());
        }

        let _ = tokio::fs::copy(&self.backup, &self.live).await?;
        tokio::fs::remove_file(&self.backup).await?;

        *state = Some(VendorState::Original);
        tracing::info!(live = %self.live.display(), "vendor file restored");
        Ok(())
    }
}
