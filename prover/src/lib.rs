//! zkpocket Prover
//!
//! Turns a pocket transfer into a proof the contract accepts.
//!
//! ```text
//! keys + pocket + note + chain state
//!         │
//!         ▼  WitnessBuilder
//!     SnarkInput ──to_snark_json──► ProofClient::run_proof
//!         │                              │
//!         │                  run_verify == "success"
//!         ▼                              ▼
//!   ZkTransferParam ◄──────────────── Proof
//!         │
//!         ▼
//!   ContractArgs
//! ```

pub mod client;
pub mod error;
pub mod proof;
pub mod transfer_param;
pub mod witness;
pub mod witness_builder;

pub use client::{HttpProofClient, ProverClientConfig};
pub use error::{Result, WitnessError};
pub use proof::{Proof, ProofClient, RawProof, VERIFY_SUCCESS, generate_proof};
pub use transfer_param::{ContractArgs, ZkTransferParam};
pub use witness::SnarkInput;
pub use witness_builder::{
    ChainState, TransferKeys, WitnessBuilder, conserve_balance, old_note_or_placeholder,
};
