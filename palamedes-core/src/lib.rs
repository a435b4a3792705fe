//! Palamedes Core Library
//!
//! Turns a pairwise global alignment of a reference and an alternate
//! sequence into the minimal list of variant blocks, each carrying its span
//! in alignment, reference and alternate coordinates.

pub mod types;
pub mod record;
pub mod alignment;
pub mod merge;
pub mod variant;

// Re-export commonly used types and functions
pub use types::{Block, Position, VariantBase, VariantBlock, GAP};
pub use record::{
    generate_seq_record, MoleculeType, RecordError, SeqRecord, ALT_SEQUENCE_ID, REF_SEQUENCE_ID,
};
pub use alignment::{
    align_records, validate_molecule_types, AlignError, AlignResult, AlignedColumn, Aligner,
    AlignerParams, AlignmentMode, PairwiseAligner, PairwiseAlignment, Residue,
};
pub use merge::{can_merge_variant_blocks, merge_block_lists, merge_variant_blocks};
pub use variant::{
    build_variant_blocks, summarize, variant_blocks, variant_blocks_batch, VariantSummary,
};

/// Version information for the palamedes core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
