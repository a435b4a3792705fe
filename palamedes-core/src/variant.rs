//! Variant block extraction
//!
//! Walks a global alignment once, turns every non-match column into a
//! one-column [`VariantBlock`], and folds each into the last block produced
//! so far when the two are mergeable. Match columns are skipped, so regions
//! separated by a single identical column are never adjacent and never fuse.

use crate::alignment::{
    align_records, AlignResult, AlignedColumn, Aligner, PairwiseAlignment, Residue,
};
use crate::merge::{can_merge_variant_blocks, merge_variant_blocks};
use crate::record::SeqRecord;
use crate::types::{Block, VariantBase, VariantBlock};
use rayon::prelude::*;
use serde::Serialize;

/// One-column variant block for `column`, or `None` for a match.
pub fn column_variant_block(column: &AlignedColumn) -> Option<VariantBlock> {
    let base = column.variant_base();
    if base.is_match() {
        return None;
    }

    let project = |residue: Option<Residue>| -> Vec<Block> {
        residue
            .map(|r| vec![Block::single(r.position, char::from(r.base))])
            .unwrap_or_default()
    };

    Some(VariantBlock::new(
        Block::single(column.index, base.symbol()),
        project(column.reference),
        project(column.alternate),
    ))
}

/// Fold `next` onto the accumulated blocks.
fn push_or_merge(mut blocks: Vec<VariantBlock>, next: VariantBlock) -> Vec<VariantBlock> {
    if let Some(last) = blocks.last_mut() {
        if can_merge_variant_blocks(last, &next) {
            log::trace!("Merging {} into {}", next.alignment_block, last.alignment_block);
            *last = merge_variant_blocks(last, &next);
            return blocks;
        }
    }

    log::trace!("Opening variant block at {}", next.alignment_block);
    blocks.push(next);
    blocks
}

/// Minimal ordered list of variant blocks covering every non-match column.
pub fn build_variant_blocks(alignment: &PairwiseAlignment) -> Vec<VariantBlock> {
    let blocks = alignment
        .columns()
        .filter_map(|column| column_variant_block(&column))
        .fold(Vec::new(), push_or_merge);

    log::debug!(
        "Found {} variant blocks across {} alignment columns",
        blocks.len(),
        alignment.len()
    );
    blocks
}

/// Align two records and extract their variant blocks.
pub fn variant_blocks<A: Aligner + ?Sized>(
    reference: &SeqRecord,
    alternate: &SeqRecord,
    aligner: &A,
) -> AlignResult<Vec<VariantBlock>> {
    let alignment = align_records(reference, alternate, aligner)?;
    Ok(build_variant_blocks(&alignment))
}

/// Process independent record pairs in parallel. Results keep input order.
pub fn variant_blocks_batch<A: Aligner + Sync + ?Sized>(
    pairs: &[(SeqRecord, SeqRecord)],
    aligner: &A,
) -> Vec<AlignResult<Vec<VariantBlock>>> {
    pairs
        .par_iter()
        .map(|(reference, alternate)| variant_blocks(reference, alternate, aligner))
        .collect()
}

/// Count of each classification inside a block list.
pub fn summarize(blocks: &[VariantBlock]) -> VariantSummary {
    let mut summary = VariantSummary::default();
    for base in blocks.iter().flat_map(|b| b.variant_bases()) {
        match base {
            VariantBase::Match => {}
            VariantBase::Mismatch => summary.mismatches += 1,
            VariantBase::Deletion => summary.deletions += 1,
            VariantBase::Insertion => summary.insertions += 1,
        }
    }
    summary.blocks = blocks.len();
    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub blocks: usize,
    pub mismatches: usize,
    pub deletions: usize,
    pub insertions: usize,
}
