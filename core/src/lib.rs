//! zkpocket Core
//!
//! Wallet engine on top of the privacy primitives: ledger bindings, note
//! storage and synchronization, and the transfer flows.
//!
//! ```text
//!            ┌────────────┐
//!            │   Wallet   │  charge / withdraw / transfer / receive / nft
//!            └─────┬──────┘
//!       ┌──────────┼───────────────┬──────────────┐
//!       ▼          ▼               ▼              ▼
//!   Ledger    ProofClient     NoteStore      SecretStore
//!  (contract) (prover svc)  (memory/rocks)  (memory/file)
//! ```

pub mod deadline;
pub mod error;
pub mod ledger;
pub mod storage;
pub mod sync;
pub mod wallet;

pub use deadline::{CallContext, SubmitOutcome};
pub use error::{Result, WalletError};
pub use ledger::{HttpTransport, Ledger, ShieldedPoolContract, Transport};
pub use storage::{
    EncryptedFileSecretStore, MemoryNoteStore, MemorySecretStore, NoteStore, RocksNoteStore,
    SecretStore,
};
pub use sync::{NoteSynchronizer, SyncReport};
pub use wallet::Wallet;
