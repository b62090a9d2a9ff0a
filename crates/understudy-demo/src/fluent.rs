//! A chained database setup API.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use understudy_core::DoubleError;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{operation} broke the chain: {reason}")]
    BrokenChain { operation: String, reason: String },

    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Double(#[from] DoubleError),
}

/// A third-party library whose methods return the library itself.
pub trait DatabaseLibrary: Send + Sync {
    fn connect(&self) -> Result<&Self, LibraryError>;
    fn wipe(&self) -> Result<&Self, LibraryError>;
    fn add_test_data(&self) -> Result<&Self, LibraryError>;
}

pub struct Database<L> {
    library: L,
}

impl<L: DatabaseLibrary> Database<L> {
    pub fn new(library: L) -> Self {
        Self { library }
    }

    pub fn set_up_db(&self) -> Result<(), LibraryError> {
        self.library.connect()?.wipe()?.add_test_data()?;
        Ok(())
    }

    pub fn library(&self) -> &L {
        &self.library
    }
}

/// An in-process library with a handful of fixture rows.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    connected: AtomicBool,
    rows: AtomicUsize,
}

impl MemoryLibrary {
    pub const FIXTURE_ROWS: usize = 3;

    pub fn rows(&self) -> usize {
        self.rows.load(Ordering::SeqCst)
    }

    fn require_connection(&self) -> Result<(), LibraryError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LibraryError::NotConnected)
        }
    }
}

impl DatabaseLibrary for MemoryLibrary {
    fn connect(&self) -> Result<&Self, LibraryError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self)
    }

    fn wipe(&self) -> Result<&Self, LibraryError> {
        self.require_connection()?;
        self.rows.store(0, Ordering::SeqCst);
        Ok(self)
    }

    fn add_test_data(&self) -> Result<&Self, LibraryError> {
        self.require_connection()?;
        self.rows.fetch_add(Self::FIXTURE_ROWS, Ordering::SeqCst);
        Ok(self)
    }
}
