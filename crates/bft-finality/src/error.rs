//! Error types for the finality gadget.

use crate::types::Address;
use thiserror::Error;

/// Failure of the underlying key-value state store.
///
/// Kept separate from [`BftError`] so store adapters do not depend on the
/// gadget's domain vocabulary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure in the backing store
    #[error("store I/O failure: {message}")]
    Io { message: String },

    /// Backend-specific failure (corruption, closed handle, ...)
    #[error("store backend failure: {message}")]
    Backend { message: String },
}

/// Finality gadget errors
#[derive(Debug, Error)]
pub enum BftError {
    /// Floor lookup found no parameter version applicable at the height
    #[error("no BFT parameters apply at or below height {height}")]
    ParameterNotFound { height: u32 },

    /// Floor lookup found no generator-key version applicable at the height
    #[error("no generator keys apply at or below height {height}")]
    GeneratorKeysNotFound { height: u32 },

    /// More validators proposed than one batch may contain
    #[error("validator count {count} exceeds batch size {batch_size}")]
    BatchSizeExceeded { count: usize, batch_size: u32 },

    /// A proposed validator carries no voting power
    #[error("validator {address:?} has zero BFT weight")]
    ZeroValidatorWeight { address: Address },

    /// Proposed threshold outside the `[aggregate/3 + 1, aggregate]` bound
    #[error("{name} threshold {value} outside [{min}, {max}]")]
    ThresholdOutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    /// Header height does not match or extend the current chain tip
    #[error("header height {actual} does not match or extend the chain tip {tip}")]
    InvalidHeaderHeight { actual: u32, tip: u32 },

    /// Internal-state corruption; silently tolerating it would break finality
    #[error("BFT state corrupted: {detail}")]
    InvariantViolation { detail: String },

    /// Persisted record could not be (de)serialized
    #[error("record (de)serialization failed: {reason}")]
    Codec { reason: String },

    /// Underlying state store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for finality gadget operations
pub type BftResult<T> = Result<T, BftError>;
