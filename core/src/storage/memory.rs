use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{Result, anyhow};
use zkpocket_privacy::{NoteRecord, TokenKind};

use crate::storage::{NoteStore, merge_record};

/// In-process note store for tests and short-lived tools
#[derive(Default)]
pub struct MemoryNoteStore {
    heights: RwLock<HashMap<TokenKind, u64>>,
    notes: RwLock<HashMap<TokenKind, BTreeMap<String, NoteRecord>>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("note store lock poisoned")
}

impl NoteStore for MemoryNoteStore {
    fn synced_height(&self, kind: TokenKind) -> Result<u64> {
        Ok(self
            .heights
            .read()
            .map_err(poisoned)?
            .get(&kind)
            .copied()
            .unwrap_or(0))
    }

    fn set_synced_height(&self, kind: TokenKind, height: u64) -> Result<()> {
        self.heights.write().map_err(poisoned)?.insert(kind, height);
        Ok(())
    }

    fn put_note(&self, record: &NoteRecord) -> Result<()> {
        let mut notes = self.notes.write().map_err(poisoned)?;
        let rows = notes.entry(record.kind).or_default();
        let merged = merge_record(rows.remove(&record.cm), record);
        rows.insert(merged.cm.clone(), merged);
        Ok(())
    }

    fn get_note(&self, kind: TokenKind, cm: &str) -> Result<Option<NoteRecord>> {
        Ok(self
            .notes
            .read()
            .map_err(poisoned)?
            .get(&kind)
            .and_then(|rows| rows.get(cm))
            .cloned())
    }

    fn notes(&self, kind: TokenKind) -> Result<Vec<NoteRecord>> {
        let mut rows: Vec<NoteRecord> = self
            .notes
            .read()
            .map_err(poisoned)?
            .get(&kind)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|r| r.idx);
        Ok(rows)
    }

    fn set_spent(&self, kind: TokenKind, cm: &str) -> Result<bool> {
        let mut notes = self.notes.write().map_err(poisoned)?;
        match notes.get_mut(&kind).and_then(|rows| rows.get_mut(cm)) {
            Some(row) if !row.is_spent => {
                row.is_spent = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
