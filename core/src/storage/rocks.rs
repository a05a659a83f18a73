use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use zkpocket_privacy::{NoteRecord, TokenKind};

use crate::storage::{NoteStore, merge_record};

const CF_NOTES: &str = "notes";
const CF_SYNC: &str = "sync";

fn note_key(kind: TokenKind, cm: &str) -> Vec<u8> {
    format!("{kind}:{cm}").into_bytes()
}

/// A thread-safe note store on RocksDB
#[derive(Clone)]
pub struct RocksNoteStore {
    db: Arc<DB>,
}

impl RocksNoteStore {
    /// Opens the database at the specified path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![
            ColumnFamilyDescriptor::new(CF_NOTES, Options::default()),
            ColumnFamilyDescriptor::new(CF_SYNC, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read_note(&self, key: &[u8]) -> Result<Option<NoteRecord>> {
        let cf = self
            .db
            .cf_handle(CF_NOTES)
            .context("Column family 'notes' missing")?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("Corrupt note row")?,
            )),
            None => Ok(None),
        }
    }

    fn write_note(&self, record: &NoteRecord) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_NOTES)
            .context("Column family 'notes' missing")?;
        let bytes = serde_json::to_vec(record)?;
        self.db.put_cf(cf, note_key(record.kind, &record.cm), bytes)?;
        Ok(())
    }
}

impl NoteStore for RocksNoteStore {
    fn synced_height(&self, kind: TokenKind) -> Result<u64> {
        let cf = self
            .db
            .cf_handle(CF_SYNC)
            .context("Column family 'sync' missing")?;
        match self.db.get_cf(cf, kind.as_str())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .context("Corrupt sync height")?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn set_synced_height(&self, kind: TokenKind, height: u64) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_SYNC)
            .context("Column family 'sync' missing")?;
        self.db.put_cf(cf, kind.as_str(), height.to_be_bytes())?;
        Ok(())
    }

    fn put_note(&self, record: &NoteRecord) -> Result<()> {
        let existing = self.read_note(&note_key(record.kind, &record.cm))?;
        self.write_note(&merge_record(existing, record))
    }

    fn get_note(&self, kind: TokenKind, cm: &str) -> Result<Option<NoteRecord>> {
        self.read_note(&note_key(kind, cm))
    }

    fn notes(&self, kind: TokenKind) -> Result<Vec<NoteRecord>> {
        let cf = self
            .db
            .cf_handle(CF_NOTES)
            .context("Column family 'notes' missing")?;
        let prefix = format!("{kind}:");
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            if key.starts_with(prefix.as_bytes()) {
                rows.push(serde_json::from_slice::<NoteRecord>(&value).context("Corrupt note row")?);
            }
        }
        rows.sort_by_key(|r| r.idx);
        Ok(rows)
    }

    fn set_spent(&self, kind: TokenKind, cm: &str) -> Result<bool> {
        match self.read_note(&note_key(kind, cm))? {
            Some(mut row) if !row.is_spent => {
                row.is_spent = true;
                self.write_note(&row)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zkpocket_privacy::Address;

    /// Create a temporary DB for each test
    fn temp_db() -> (TempDir, RocksNoteStore) {
        let dir = TempDir::new().unwrap();
        let store = RocksNoteStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn record(kind: TokenKind, cm: &str, idx: u64) -> NoteRecord {
        NoteRecord {
            idx,
            open: "01".into(),
            bal: "64".into(),
            addr: "03".into(),
            cm: cm.into(),
            token_address: Address::ZERO,
            is_spent: false,
            kind,
        }
    }

    #[test]
    fn missing_height_is_zero() {
        let (_dir, store) = temp_db();
        assert_eq!(store.synced_height(TokenKind::Ft).unwrap(), 0);
        store.set_synced_height(TokenKind::Ft, 99).unwrap();
        assert_eq!(store.synced_height(TokenKind::Ft).unwrap(), 99);
    }

    #[test]
    fn notes_are_partitioned_by_kind() {
        let (_dir, store) = temp_db();
        store.put_note(&record(TokenKind::Ft, "aa", 4)).unwrap();
        store.put_note(&record(TokenKind::Ft, "bb", 1)).unwrap();
        store.put_note(&record(TokenKind::Nft, "aa", 7)).unwrap();

        let ft: Vec<u64> = store.notes(TokenKind::Ft).unwrap().iter().map(|n| n.idx).collect();
        assert_eq!(ft, vec![1, 4]);
        assert_eq!(store.notes(TokenKind::Nft).unwrap().len(), 1);
    }

    #[test]
    fn spent_flag_survives_rewrite_and_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksNoteStore::open(dir.path()).unwrap();
            store.put_note(&record(TokenKind::Ft, "aa", 1)).unwrap();
            assert!(store.set_spent(TokenKind::Ft, "aa").unwrap());
            store.put_note(&record(TokenKind::Ft, "aa", 1)).unwrap();
        }
        let store = RocksNoteStore::open(dir.path()).unwrap();
        assert!(store.get_note(TokenKind::Ft, "aa").unwrap().unwrap().is_spent);
        assert!(store.unspent_notes(TokenKind::Ft).unwrap().is_empty());
        assert!(!store.set_spent(TokenKind::Ft, "aa").unwrap(), "already spent");
    }
}
