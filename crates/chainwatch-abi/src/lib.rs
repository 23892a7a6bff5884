//! chainwatch-abi: EigenDA contract ABIs and payload decoding.
//!
//! The service-manager and BLS APK registry ABIs are embedded at build time.
//! A [`ContractResolver`] turns a protocol environment into an immutable
//! [`Deployment`] (addresses, ABIs, event topics), and the decoders in
//! [`decode`] turn raw calldata and log data into plain structs.

pub mod decode;
pub mod deployment;
pub mod error;
pub mod events;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use decode::{
    decode_batch_confirmation, decode_quorum_event, BatchConfirmationRecord, G1Point, G2Point, QuorumChange,
};
pub use deployment::{ContractAddresses, ContractResolver, Deployment, CONFIRM_BATCH};
pub use error::{DecodeError, ResolveError};
pub use events::{EventKind, EventSignatures};
