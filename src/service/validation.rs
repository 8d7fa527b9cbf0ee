use std::collections::HashSet;

use crate::error::ConflictError;
use crate::models::block::TimeBlock;

/// Checks that the proposed blocks fit the day without colliding with each
/// other or with busy time.
///
/// All blocks are merged, stably sorted by start time, and scanned pairwise:
/// once sorted, any overlap anywhere implies an overlap between some
/// adjacent pair, so neighbors are the only comparisons needed. This holds
/// only for positive-duration blocks, which `TimeBlock::new` guarantees.
///
/// Reports the first conflict in sorted order, classified by whether one
/// side belongs to the busy set.
pub fn validate_blocks(blocks: &[TimeBlock], busy_blocks: &[TimeBlock]) -> Result<(), ConflictError> {
    let busy_keys: HashSet<String> = busy_blocks.iter().map(block_key).collect();

    let mut all_blocks: Vec<&TimeBlock> = blocks.iter().chain(busy_blocks.iter()).collect();
    all_blocks.sort_by_key(|block| block.start);

    for pair in all_blocks.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if !blocks_overlap(first, second) {
            continue;
        }

        let first_is_busy = busy_keys.contains(&block_key(first));
        let second_is_busy = busy_keys.contains(&block_key(second));

        if first_is_busy || second_is_busy {
            let (proposed, busy) = if first_is_busy {
                (second, first)
            } else {
                (first, second)
            };
            return Err(ConflictError::Busy {
                proposed: proposed.clone(),
                busy: busy.clone(),
            });
        }

        return Err(ConflictError::Proposed {
            first: first.clone(),
            second: second.clone(),
        });
    }

    Ok(())
}

/// Half-open interval semantics: a block ending exactly when the next one
/// starts does not overlap it.
fn blocks_overlap(a: &TimeBlock, b: &TimeBlock) -> bool {
    a.start < b.end && b.start < a.end
}

/// Identity used to tell busy blocks apart from proposed ones when a
/// conflict needs classifying.
fn block_key(block: &TimeBlock) -> String {
    format!("{}|{}|{}", block.title, block.start.to_rfc3339(), block.end.to_rfc3339())
}
