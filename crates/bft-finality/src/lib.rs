//! Byzantine-fault-tolerant finality gadget.
//!
//! Accounts prevotes and precommits implied by signed block headers and
//! derives three monotonically non-decreasing finality heights:
//! `max_height_prevoted`, `max_height_precommitted` and
//! `max_height_certified`. Alongside the vote ledger it maintains two
//! height-versioned stores consulted by floor lookup: the BFT parameters
//! (active validators, weights, thresholds) and the generator signing keys.
//!
//! The gadget is deterministic and single-writer: the block-processing
//! pipeline drives it once per accepted block through [`BftModule`], and all
//! state lives behind the [`ports::StateStore`] port scoped to that block's
//! transactional batch.
//!
//! - [`domain`] — vote window, parameter validation, contradiction rules
//! - [`store`] — key layout and height-versioned persistence
//! - [`ports`] — the state-store port and its in-memory adapter
//! - [`service`] — the lifecycle facade

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod store;
pub mod types;

pub use domain::contradiction::BftBlockHeader;
pub use domain::params::{BftParameters, Validator};
pub use domain::votes::{ActiveValidatorVoteInfo, BftVotes, BlockBftInfo};
pub use error::{BftError, BftResult, StoreError};
pub use ports::{InMemoryStateStore, IterateOptions, KvPair, StateStore};
pub use service::{BftConfig, BftModule};
pub use types::{
    Address, AggregateCommit, BftHeights, BlockHeader, BlsKey, GeneratorKey, GeneratorKeyEntry,
    GeneratorKeys, Hash,
};
