pub mod memory;
pub mod rocks;
pub mod secret;

use anyhow::Result;
use zkpocket_privacy::{NoteRecord, TokenKind};

pub use memory::MemoryNoteStore;
pub use rocks::RocksNoteStore;
pub use secret::{EncryptedFileSecretStore, MemorySecretStore, SecretStore};

/// Note rows and per-class sync progress, decoupled from the backend
///
/// Rows are keyed by `(kind, cm)`. Writing a row never clears a spent flag.
pub trait NoteStore: Send + Sync {
    /// Last block already scanned for `kind`; 0 before the first sweep
    fn synced_height(&self, kind: TokenKind) -> Result<u64>;

    fn set_synced_height(&self, kind: TokenKind, height: u64) -> Result<()>;

    /// Insert or refresh a note row
    fn put_note(&self, record: &NoteRecord) -> Result<()>;

    fn get_note(&self, kind: TokenKind, cm: &str) -> Result<Option<NoteRecord>>;

    /// All rows of a class, ordered by leaf index
    fn notes(&self, kind: TokenKind) -> Result<Vec<NoteRecord>>;

    /// Flag a row spent; returns whether it was unspent before
    fn set_spent(&self, kind: TokenKind, cm: &str) -> Result<bool>;

    fn unspent_notes(&self, kind: TokenKind) -> Result<Vec<NoteRecord>> {
        Ok(self
            .notes(kind)?
            .into_iter()
            .filter(|n| !n.is_spent)
            .collect())
    }
}

/// Merge an incoming row with the stored one
pub(crate) fn merge_record(existing: Option<NoteRecord>, incoming: &NoteRecord) -> NoteRecord {
    let mut merged = incoming.clone();
    if existing.is_some_and(|e| e.is_spent) {
        merged.is_spent = true;
    }
    merged
}
