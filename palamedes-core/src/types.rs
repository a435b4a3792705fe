use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based offset in one of the three coordinate spaces.
pub type Position = usize;

/// Placeholder occupying a column where one sequence has no base.
pub const GAP: u8 = b'-';

/// Per-column classification, from the reference sequence's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantBase {
    /// Both bases present and identical.
    Match,
    /// Both bases present and different.
    Mismatch,
    /// The alternate lacks a base the reference has.
    Deletion,
    /// The alternate has a base the reference lacks.
    Insertion,
}

impl VariantBase {
    /// Classify one aligned column. Either side may be [`GAP`], but not both.
    pub fn classify(reference: u8, alternate: u8) -> Self {
        debug_assert!(
            !(reference == GAP && alternate == GAP),
            "an aligned column cannot be a gap on both sequences"
        );

        match (reference, alternate) {
            (r, a) if r == a => VariantBase::Match,
            (_, GAP) => VariantBase::Deletion,
            (GAP, _) => VariantBase::Insertion,
            _ => VariantBase::Mismatch,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            VariantBase::Match => 'M',
            VariantBase::Mismatch => 'm',
            VariantBase::Deletion => 'd',
            VariantBase::Insertion => 'i',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'M' => Some(VariantBase::Match),
            'm' => Some(VariantBase::Mismatch),
            'd' => Some(VariantBase::Deletion),
            'i' => Some(VariantBase::Insertion),
            _ => None,
        }
    }

    pub fn is_match(self) -> bool {
        matches!(self, VariantBase::Match)
    }
}

impl From<VariantBase> for char {
    fn from(base: VariantBase) -> Self {
        base.symbol()
    }
}

impl fmt::Display for VariantBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Half-open span `[start, end)` over one coordinate space, with one
/// character of `bases` per position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub start: Position,
    pub end: Position,
    pub bases: String,
}

impl Block {
    pub fn new<S: Into<String>>(start: Position, end: Position, bases: S) -> Self {
        let bases = bases.into();
        debug_assert!(start <= end, "block start {} is past its end {}", start, end);
        debug_assert_eq!(
            bases.chars().count(),
            end - start,
            "block [{}, {}) must carry exactly one base per position",
            start,
            end
        );
        Self { start, end, bases }
    }

    /// One-position block at `position`.
    pub fn single(position: Position, base: char) -> Self {
        Self::new(position, position + 1, base.to_string())
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when `next` starts exactly where this block ends.
    pub fn is_adjacent_to(&self, next: &Block) -> bool {
        self.end == next.start
    }

    /// Join this block with the block directly following it.
    pub fn fuse(&self, next: &Block) -> Block {
        debug_assert!(
            self.is_adjacent_to(next),
            "cannot fuse [{}, {}) with non-adjacent [{}, {})",
            self.start,
            self.end,
            next.start,
            next.end
        );

        let mut bases = String::with_capacity(self.bases.len() + next.bases.len());
        bases.push_str(&self.bases);
        bases.push_str(&next.bases);
        Block::new(self.start, next.end, bases)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}) {}", self.start, self.end, self.bases)
    }
}

/// A contiguous non-identical region of an alignment together with its
/// projections onto the reference and alternate sequences.
///
/// `alignment_block` is in alignment-column coordinates and its bases are
/// [`VariantBase`] symbols. The reference and alternate lists are in each
/// sequence's own coordinates; an empty list means that sequence contributes
/// no bases to the region (a pure insertion or a pure deletion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantBlock {
    pub alignment_block: Block,
    pub reference_blocks: Vec<Block>,
    pub alternate_blocks: Vec<Block>,
}

impl VariantBlock {
    pub fn new(
        alignment_block: Block,
        reference_blocks: Vec<Block>,
        alternate_blocks: Vec<Block>,
    ) -> Self {
        Self {
            alignment_block,
            reference_blocks,
            alternate_blocks,
        }
    }

    /// Column classifications in alignment order. Unknown symbols are skipped.
    pub fn variant_bases(&self) -> impl Iterator<Item = VariantBase> + '_ {
        self.alignment_block
            .bases
            .chars()
            .filter_map(VariantBase::from_symbol)
    }

    pub fn contains_match(&self) -> bool {
        self.alignment_block
            .bases
            .contains(VariantBase::Match.symbol())
    }

    /// All reference bases covered by this region, concatenated.
    pub fn reference_bases(&self) -> String {
        concat_bases(&self.reference_blocks)
    }

    /// All alternate bases covered by this region, concatenated.
    pub fn alternate_bases(&self) -> String {
        concat_bases(&self.alternate_blocks)
    }

    /// Outer `[start, end)` of the reference projection, if any.
    pub fn reference_span(&self) -> Option<(Position, Position)> {
        outer_span(&self.reference_blocks)
    }

    /// Outer `[start, end)` of the alternate projection, if any.
    pub fn alternate_span(&self) -> Option<(Position, Position)> {
        outer_span(&self.alternate_blocks)
    }
}

fn concat_bases(blocks: &[Block]) -> String {
    blocks.iter().map(|block| block.bases.as_str()).collect()
}

fn outer_span(blocks: &[Block]) -> Option<(Position, Position)> {
    match (blocks.first(), blocks.last()) {
        (Some(first), Some(last)) => Some((first.start, last.end)),
        _ => None,
    }
}

fn fmt_block_list(f: &mut fmt::Formatter<'_>, blocks: &[Block]) -> fmt::Result {
    if blocks.is_empty() {
        return write!(f, "-");
    }
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", block)?;
    }
    Ok(())
}

impl fmt::Display for VariantBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aln {} | ref ", self.alignment_block)?;
        fmt_block_list(f, &self.reference_blocks)?;
        write!(f, " | alt ")?;
        fmt_block_list(f, &self.alternate_blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_columns() {
        assert_eq!(VariantBase::classify(b'A', b'A'), VariantBase::Match);
        assert_eq!(VariantBase::classify(b'A', b'T'), VariantBase::Mismatch);
        assert_eq!(VariantBase::classify(b'A', GAP), VariantBase::Deletion);
        assert_eq!(VariantBase::classify(GAP, b'T'), VariantBase::Insertion);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(VariantBase::classify(b'a', b'A'), VariantBase::Mismatch);
    }

    #[test]
    fn test_symbols_roundtrip() {
        for base in [
            VariantBase::Match,
            VariantBase::Mismatch,
            VariantBase::Deletion,
            VariantBase::Insertion,
        ] {
            assert_eq!(VariantBase::from_symbol(base.symbol()), Some(base));
        }
        assert_eq!(VariantBase::from_symbol('x'), None);
        assert_eq!(char::from(VariantBase::Deletion), 'd');
    }

    #[test]
    fn test_block_fuse() {
        let left = Block::new(2, 4, "AC");
        let right = Block::new(4, 5, "G");

        assert!(left.is_adjacent_to(&right));
        assert!(!right.is_adjacent_to(&left));

        let fused = left.fuse(&right);
        assert_eq!(fused, Block::new(2, 5, "ACG"));
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn test_block_single() {
        let block = Block::single(7, 'T');
        assert_eq!(block.start, 7);
        assert_eq!(block.end, 8);
        assert_eq!(block.bases, "T");
        assert!(!block.is_empty());
    }

    #[test]
    fn test_variant_block_accessors() {
        let block = VariantBlock::new(
            Block::new(3, 6, "mii"),
            vec![Block::new(3, 4, "T")],
            vec![Block::new(2, 5, "GAA")],
        );

        assert!(!block.contains_match());
        assert_eq!(
            block.variant_bases().collect::<Vec<_>>(),
            vec![
                VariantBase::Mismatch,
                VariantBase::Insertion,
                VariantBase::Insertion
            ]
        );
        assert_eq!(block.reference_bases(), "T");
        assert_eq!(block.alternate_bases(), "GAA");
        assert_eq!(block.reference_span(), Some((3, 4)));
        assert_eq!(block.alternate_span(), Some((2, 5)));
    }

    #[test]
    fn test_variant_block_without_alternate() {
        let block = VariantBlock::new(
            Block::new(1, 2, "d"),
            vec![Block::new(1, 2, "T")],
            Vec::new(),
        );

        assert_eq!(block.alternate_bases(), "");
        assert_eq!(block.alternate_span(), None);
        assert_eq!(block.to_string(), "aln [1,2) d | ref [1,2) T | alt -");
    }

    fn residue() -> impl Strategy<Value = u8> {
        any::<u8>().prop_filter("gap is not a residue", |b| *b != GAP)
    }

    proptest! {
        #[test]
        fn prop_classify_residue_pairs(reference in residue(), alternate in residue()) {
            let expected = if reference == alternate {
                VariantBase::Match
            } else {
                VariantBase::Mismatch
            };
            prop_assert_eq!(VariantBase::classify(reference, alternate), expected);
        }

        #[test]
        fn prop_classify_one_sided_gaps(base in residue()) {
            prop_assert_eq!(VariantBase::classify(base, GAP), VariantBase::Deletion);
            prop_assert_eq!(VariantBase::classify(GAP, base), VariantBase::Insertion);
            prop_assert!(!VariantBase::classify(base, GAP).is_match());
        }
    }
}
