//! Fork/double-sign detection over pairs of headers from one generator.
//!
//! Two headers signed by the same validator are contradicting when no honest
//! sequence of events could have produced both. The check is pure and
//! argument-order independent: the pair is first put into a canonical
//! (earlier, later) order by generation priority.

use crate::domain::votes::BlockBftInfo;
use crate::types::{Address, BlockHeader};

/// The vote-relevant fields shared by full headers and window entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BftBlockHeader {
    pub generator_address: Address,
    pub height: u32,
    pub max_height_generated: u32,
    pub max_height_prevoted: u32,
}

impl From<&BlockHeader> for BftBlockHeader {
    fn from(header: &BlockHeader) -> Self {
        Self {
            generator_address: header.generator_address,
            height: header.height,
            max_height_generated: header.max_height_generated,
            max_height_prevoted: header.max_height_prevoted,
        }
    }
}

impl From<&BlockBftInfo> for BftBlockHeader {
    fn from(info: &BlockBftInfo) -> Self {
        Self {
            generator_address: info.generator_address,
            height: info.height,
            max_height_generated: info.max_height_generated,
            max_height_prevoted: info.max_height_prevoted,
        }
    }
}

/// Canonical (earlier, later) pair: the later header is the one with the
/// larger `max_height_generated`, tie-broken by larger `max_height_prevoted`,
/// then by larger `height`. Returns a new pair instead of mutating inputs.
fn order_by_generation_priority<'a>(
    a: &'a BftBlockHeader,
    b: &'a BftBlockHeader,
) -> (&'a BftBlockHeader, &'a BftBlockHeader) {
    let priority =
        |h: &BftBlockHeader| (h.max_height_generated, h.max_height_prevoted, h.height);
    if priority(a) > priority(b) {
        (b, a)
    } else {
        (a, b)
    }
}

/// Whether two distinct headers are evidence of double-signing or forking.
///
/// Headers from different generators never contradict. Identical headers are
/// filtered out by the caller before delegating here.
pub fn are_distinct_headers_contradicting(b1: &BftBlockHeader, b2: &BftBlockHeader) -> bool {
    if b1.generator_address != b2.generator_address {
        return false;
    }
    let (earlier, later) = order_by_generation_priority(b1, b2);

    // Double production without height progress.
    if earlier.max_height_prevoted == later.max_height_prevoted && earlier.height >= later.height {
        return true;
    }
    // The later header fails to acknowledge the earlier one.
    if earlier.height > later.max_height_generated {
        return true;
    }
    // Prevote information regression.
    earlier.max_height_prevoted > later.max_height_prevoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(
        generator: u8,
        height: u32,
        max_height_generated: u32,
        max_height_prevoted: u32,
    ) -> BftBlockHeader {
        BftBlockHeader {
            generator_address: Address([generator; 20]),
            height,
            max_height_generated,
            max_height_prevoted,
        }
    }

    #[test]
    fn test_different_generators_never_contradict() {
        let a = facts(1, 10, 9, 8);
        let b = facts(2, 10, 9, 8);
        assert!(!are_distinct_headers_contradicting(&a, &b));
    }

    #[test]
    fn test_honest_progression_does_not_contradict() {
        // The later block acknowledges the earlier one and moves forward.
        let earlier = facts(1, 10, 9, 8);
        let later = facts(1, 11, 10, 9);
        assert!(!are_distinct_headers_contradicting(&earlier, &later));
    }

    #[test]
    fn test_double_production_without_height_progress() {
        // Same max_height_prevoted, earlier height >= later height.
        let a = facts(1, 10, 5, 8);
        let b = facts(1, 10, 6, 8);
        assert!(are_distinct_headers_contradicting(&a, &b));
    }

    #[test]
    fn test_unacknowledged_earlier_block() {
        // earlier.height (10) > later.max_height_generated (7).
        let earlier = facts(1, 10, 5, 8);
        let later = facts(1, 12, 7, 9);
        assert!(are_distinct_headers_contradicting(&earlier, &later));
    }

    #[test]
    fn test_prevote_regression() {
        // Later block reports a smaller max_height_prevoted.
        let earlier = facts(1, 10, 5, 9);
        let later = facts(1, 11, 10, 7);
        assert!(are_distinct_headers_contradicting(&earlier, &later));
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (facts(1, 10, 5, 8), facts(1, 10, 6, 8)),
            (facts(1, 10, 5, 8), facts(1, 12, 7, 9)),
            (facts(1, 10, 9, 8), facts(1, 11, 10, 9)),
            (facts(1, 10, 5, 9), facts(1, 11, 10, 7)),
            (facts(1, 10, 9, 8), facts(2, 11, 10, 9)),
        ];
        for (a, b) in &pairs {
            assert_eq!(
                are_distinct_headers_contradicting(a, b),
                are_distinct_headers_contradicting(b, a),
            );
        }
    }
}
