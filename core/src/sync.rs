//! Note synchronization
//!
//! Scans pool events for notes addressed to the user, per token class.
//!
//! ```text
//! h = stored height (last scanned block), H = chain height
//! H <= h  -> nothing to do
//! else    -> events in [h+1, H] -> decrypt (user view) -> validate
//!            -> isNullified(H(cm, sk)) -> persist bal != 0
//!            -> refresh spent flags of stored unspent notes
//!            -> store H
//! ```

use log::{debug, info};
use zkpocket_privacy::{
    CryptoSuite, Note, NoteRecord, PublicKeyEncryption, TokenKind, UserKey, View,
};

use crate::deadline::CallContext;
use crate::error::{Result, WalletError};
use crate::ledger::{Ledger, RawZkTransferEvent, ZkTransferEvent};
use crate::storage::NoteStore;

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub kind: TokenKind,
    /// Inclusive block range scanned; `None` when already up to date
    pub range: Option<(u64, u64)>,
    pub events: usize,
    /// Events that decrypted to a valid note of ours
    pub notes_found: usize,
    /// Notes written to the store (non-zero balance)
    pub notes_stored: usize,
    /// Stored notes newly found to be spent
    pub newly_spent: usize,
}

pub struct NoteSynchronizer<'a, L: Ledger, S: NoteStore> {
    suite: &'a CryptoSuite,
    ledger: &'a L,
    store: &'a S,
}

impl<'a, L: Ledger, S: NoteStore> NoteSynchronizer<'a, L, S> {
    pub fn new(suite: &'a CryptoSuite, ledger: &'a L, store: &'a S) -> Self {
        Self {
            suite,
            ledger,
            store,
        }
    }

    /// Decrypt one event with the user view; `None` if it is not ours
    pub fn try_decrypt(&self, user: &UserKey, kind: TokenKind, raw: &RawZkTransferEvent) -> Option<Note> {
        let event = match ZkTransferEvent::parse(self.suite, raw) {
            Ok(e) => e,
            Err(e) => {
                debug!("skipping undecodable {kind} event: {e}");
                return None;
            }
        };
        let Some(idx) = event.leaf_index() else {
            debug!("skipping {kind} event with index 0");
            return None;
        };

        let pke = PublicKeyEncryption::new(self.suite.curve(), self.suite.hasher());
        let msgs = match pke.decrypt(&event.pct, &user.sk, View::User) {
            Ok(m) => m,
            Err(e) => {
                debug!("event {} did not decrypt: {e}", event.cm);
                return None;
            }
        };
        let [open, bal, addr] = <[_; 3]>::try_from(msgs).ok()?;

        let note = Note::from_parts(
            self.suite.hasher(),
            open,
            bal,
            addr,
            event.cm,
            idx,
            event.token_address,
            kind,
        )
        .ok()?;

        (note.addr == user.pk.ena).then_some(note)
    }

    /// Incremental sweep from the stored height to the chain head
    pub async fn sync(&self, ctx: &CallContext, user: &UserKey, kind: TokenKind) -> Result<SyncReport> {
        let synced = self.store.synced_height(kind).map_err(WalletError::store)?;
        let head = ctx.run("blockNumber", self.ledger.block_number()).await?;

        let mut report = SyncReport {
            kind,
            ..Default::default()
        };
        if head <= synced {
            debug!("{kind} notes up to date at block {synced}");
            return Ok(report);
        }

        let from = synced + 1;
        let events = ctx
            .run("getZkTransferEvents", self.ledger.zk_transfer_events(kind, from, head))
            .await?;
        report.range = Some((from, head));
        self.ingest(ctx, user, kind, &events, &mut report).await?;
        report.newly_spent = self.refresh_spent(ctx, user, kind).await?;

        if head > self.store.synced_height(kind).map_err(WalletError::store)? {
            self.store
                .set_synced_height(kind, head)
                .map_err(WalletError::store)?;
        }

        info!(
            "{kind} sync [{from}, {head}]: {} events, {} notes found, {} stored, {} newly spent",
            report.events, report.notes_found, report.notes_stored, report.newly_spent
        );
        Ok(report)
    }

    /// Sweep every token class
    pub async fn sync_all(&self, ctx: &CallContext, user: &UserKey) -> Result<Vec<SyncReport>> {
        let mut reports = Vec::with_capacity(TokenKind::ALL.len());
        for kind in TokenKind::ALL {
            reports.push(self.sync(ctx, user, kind).await?);
        }
        Ok(reports)
    }

    /// Re-check specific transactions; the stored height is left alone
    pub async fn sync_transactions(
        &self,
        ctx: &CallContext,
        user: &UserKey,
        kind: TokenKind,
        tx_hashes: &[String],
    ) -> Result<SyncReport> {
        let mut report = SyncReport {
            kind,
            ..Default::default()
        };
        for tx in tx_hashes {
            let events = ctx
                .run("getTransactionEvents", self.ledger.zk_transfer_events_for_tx(kind, tx))
                .await?;
            self.ingest(ctx, user, kind, &events, &mut report).await?;
        }
        Ok(report)
    }

    /// Query the nullifier of every stored unspent note; returns how many flipped
    pub async fn refresh_spent(&self, ctx: &CallContext, user: &UserKey, kind: TokenKind) -> Result<usize> {
        let hasher = self.suite.hasher();
        let mut flipped = 0;
        for record in self.store.unspent_notes(kind).map_err(WalletError::store)? {
            let cm = record.cm.clone();
            let note = match record.into_note(hasher, self.suite.field()) {
                Ok(n) => n,
                Err(e) => {
                    debug!("stored note {cm} no longer validates: {e}");
                    continue;
                }
            };
            let sn = note.nullifier(hasher, &user.sk).to_field().to_padded_hex();
            if ctx.run("isNullified", self.ledger.is_nullified(&sn)).await?
                && self.store.set_spent(kind, &cm).map_err(WalletError::store)?
            {
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn ingest(
        &self,
        ctx: &CallContext,
        user: &UserKey,
        kind: TokenKind,
        events: &[RawZkTransferEvent],
        report: &mut SyncReport,
    ) -> Result<()> {
        let hasher = self.suite.hasher();
        report.events += events.len();

        for raw in events {
            let Some(mut note) = self.try_decrypt(user, kind, raw) else {
                continue;
            };
            report.notes_found += 1;
            if note.bal.is_zero() {
                continue;
            }

            let sn = note.nullifier(hasher, &user.sk).to_field().to_padded_hex();
            if ctx.run("isNullified", self.ledger.is_nullified(&sn)).await? {
                note.mark_spent();
            }
            let record: NoteRecord = note.to_record();
            self.store.put_note(&record).map_err(WalletError::store)?;
            report.notes_stored += 1;
        }
        Ok(())
    }
}
