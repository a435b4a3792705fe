//! Merging of adjacent variant blocks
//!
//! Two variant blocks fuse when they touch in alignment coordinates and
//! neither contains a match column. Their reference and alternate block
//! lists are joined independently, fusing the seam only where that
//! sequence's own coordinates are contiguous.

use crate::types::{Block, VariantBlock};

/// Check if `left` can absorb `right`, which must follow it in the alignment.
pub fn can_merge_variant_blocks(left: &VariantBlock, right: &VariantBlock) -> bool {
    if !left.alignment_block.is_adjacent_to(&right.alignment_block) {
        return false;
    }

    // A match column is sequence identity and never part of a variant region
    !left.contains_match() && !right.contains_match()
}

/// Join two ordered block lists from the same coordinate space.
///
/// The last block of `left` and the first block of `right` are fused when
/// adjacent; otherwise both are kept, preserving the discontinuity.
pub fn merge_block_lists(left: &[Block], right: &[Block]) -> Vec<Block> {
    let (Some((last, head)), Some((first, tail))) = (left.split_last(), right.split_first()) else {
        return left.iter().chain(right).cloned().collect();
    };

    let mut merged = Vec::with_capacity(left.len() + right.len());
    merged.extend_from_slice(head);
    if last.is_adjacent_to(first) {
        merged.push(last.fuse(first));
    } else {
        merged.push(last.clone());
        merged.push(first.clone());
    }
    merged.extend_from_slice(tail);
    merged
}

/// Merge two variant blocks that passed [`can_merge_variant_blocks`].
pub fn merge_variant_blocks(left: &VariantBlock, right: &VariantBlock) -> VariantBlock {
    debug_assert!(
        can_merge_variant_blocks(left, right),
        "merging blocks {} and {} that are not adjacent or contain a match",
        left.alignment_block,
        right.alignment_block
    );

    VariantBlock::new(
        left.alignment_block.fuse(&right.alignment_block),
        merge_block_lists(&left.reference_blocks, &right.reference_blocks),
        merge_block_lists(&left.alternate_blocks, &right.alternate_blocks),
    )
}
