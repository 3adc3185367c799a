//! Cart shadow: the open cart persisted across restarts.
//!
//! The whole line list is written after every mutation and always replaces
//! the previous copy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CartItem, PosError, Result};

#[async_trait]
pub trait CartShadow: Send + Sync {
    /// The persisted lines, empty when nothing is persisted.
    async fn load(&self) -> Result<Vec<CartItem>>;

    /// Replaces the persisted lines.
    async fn save(&self, lines: &[CartItem]) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Shadow stored as a JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFileShadow {
    path: PathBuf,
}

impl JsonFileShadow {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CartShadow for JsonFileShadow {
    async fn load(&self) -> Result<Vec<CartItem>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, lines: &[CartItem]) -> Result<()> {
        let bytes = serde_json::to_vec(lines)?;
        // Write then rename so a crash never leaves a half-written cart.
        let staging = self.staging_path();
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
struct ShadowState {
    lines: Option<Vec<CartItem>>,
    fail: bool,
}

/// In-memory shadow for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShadow {
    state: Arc<RwLock<ShadowState>>,
}

impl InMemoryShadow {
    pub fn new() -> Self {
        Self::default()
    }

    /// The persisted lines, `None` after a clear.
    pub async fn snapshot(&self) -> Option<Vec<CartItem>> {
        self.state.read().await.lines.clone()
    }

    /// Makes every operation fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    async fn check(&self) -> Result<()> {
        if self.state.read().await.fail {
            return Err(PosError::Shadow(std::io::Error::other(
                "shadow rejected by in-memory store",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CartShadow for InMemoryShadow {
    async fn load(&self) -> Result<Vec<CartItem>> {
        self.check().await?;
        Ok(self.snapshot().await.unwrap_or_default())
    }

    async fn save(&self, lines: &[CartItem]) -> Result<()> {
        self.check().await?;
        self.state.write().await.lines = Some(lines.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check().await?;
        self.state.write().await.lines = None;
        Ok(())
    }
}
