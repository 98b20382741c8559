//! Domain model of the finality gadget.
//!
//! ## Modules
//! - params: versioned validator-set parameters and threshold validation
//! - votes: the sliding vote window and the incremental weight algorithm
//! - contradiction: fork/double-sign detection over same-generator headers

pub mod contradiction;
pub mod params;
pub mod votes;

pub use contradiction::{are_distinct_headers_contradicting, BftBlockHeader};
pub use params::{
    aggregate_bft_weight, check_threshold_range, compute_validators_hash, prevote_threshold,
    same_validators, BftParameters, Validator,
};
pub use votes::{ActiveValidatorVoteInfo, BftVotes, BlockBftInfo};
