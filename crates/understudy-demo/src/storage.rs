//! Saving a user's name through a database collaborator.

use thiserror::Error;
use tracing::info;
use understudy_core::{Double, DoubleError, Fault, Seam, TargetId};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("save failed: {0}")]
    SaveFailed(Fault),

    #[error(transparent)]
    Double(DoubleError),
}

impl From<DoubleError> for StorageError {
    fn from(err: DoubleError) -> Self {
        match err {
            DoubleError::Thrown(fault) | DoubleError::Rejected(fault) => {
                StorageError::SaveFailed(fault)
            }
            other => StorageError::Double(other),
        }
    }
}

pub trait Database: Send + Sync {
    fn save(&self, name: &str) -> Result<(), StorageError>;
}

pub const SAVED: &str = "Name has been saved!";

pub struct User<D> {
    db: D,
}

impl<D: Database> User<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    pub fn save_name(&self, name: &str) -> Result<&'static str, StorageError> {
        self.db.save(name)?;
        Ok(SAVED)
    }
}

/// A database reached over the network. Saving is a seam so tests can
/// keep writes off the wire.
#[derive(Debug, Clone)]
pub struct RemoteDatabase {
    url: String,
    save: Seam<String, ()>,
}

impl RemoteDatabase {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let target = url.clone();
        Self {
            save: Seam::new(TargetId::new(), "save", move |name: String| {
                info!(database = %target, name = %name, "Writing name");
            }),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn save_seam(&self) -> &Seam<String, ()> {
        &self.save
    }
}

impl Database for RemoteDatabase {
    fn save(&self, name: &str) -> Result<(), StorageError> {
        self.save.call(name.to_string())?;
        Ok(())
    }
}

impl Database for Double<String, ()> {
    fn save(&self, name: &str) -> Result<(), StorageError> {
        self.call(name.to_string())?;
        Ok(())
    }
}
