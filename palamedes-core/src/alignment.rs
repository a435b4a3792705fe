//! Aligner boundary for palamedes
//!
//! The alignment itself is computed by an external aligner (rust-bio by
//! default). This module validates the configuration handed to it, runs it
//! in global mode, and exposes the result column by column with each
//! residue's position in its own sequence.

use crate::record::{MoleculeType, SeqRecord};
use crate::types::{Position, VariantBase, GAP};
use bio::alignment::pairwise::Aligner as BioAligner;
use bio::alignment::{Alignment as BioAlignment, AlignmentMode as BioMode, AlignmentOperation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised at the aligner boundary, before any variant scanning
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("Aligner must run in global mode, got {actual} mode")]
    NonGlobalMode { actual: AlignmentMode },

    #[error("Sequence record {id} has no molecule type annotation")]
    MissingMoleculeType { id: String },

    #[error("Molecule type mismatch: expected {expected}, got {actual}")]
    MoleculeTypeMismatch {
        expected: MoleculeType,
        actual: MoleculeType,
    },

    #[error(
        "Aligned rows differ in length: reference has {reference} columns, \
         alternate has {alternate}"
    )]
    UnequalRowLengths { reference: usize, alternate: usize },

    #[error("Column {column} is a gap on both sequences")]
    EmptyColumn { column: Position },

    #[error("Sequence record {id} contains the gap symbol '-'")]
    GapInSequence { id: String },

    #[error("Sequence record {id} contains non-ASCII characters")]
    NonAsciiSequence { id: String },

    #[error("Malformed alignment: {0}")]
    MalformedAlignment(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

pub type AlignResult<T> = Result<T, AlignError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    #[default]
    Global,
    Local,
    Semiglobal,
    Custom,
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlignmentMode::Global => "global",
            AlignmentMode::Local => "local",
            AlignmentMode::Semiglobal => "semiglobal",
            AlignmentMode::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl From<BioMode> for AlignmentMode {
    fn from(mode: BioMode) -> Self {
        match mode {
            BioMode::Global => AlignmentMode::Global,
            BioMode::Local => AlignmentMode::Local,
            BioMode::Semiglobal => AlignmentMode::Semiglobal,
            BioMode::Custom => AlignmentMode::Custom,
        }
    }
}

/// Scoring and mode for the pairwise aligner.
///
/// Scores are integers in tenths so that a gap extension can be cheaper
/// than a mismatch. A gap of length `k` scores
/// `open_gap_score + (k - 1) * extend_gap_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignerParams {
    #[serde(default)]
    pub mode: AlignmentMode,
    #[serde(default = "default_match_score")]
    pub match_score: i32,
    #[serde(default = "default_mismatch_score")]
    pub mismatch_score: i32,
    #[serde(default = "default_open_gap_score")]
    pub open_gap_score: i32,
    #[serde(default = "default_extend_gap_score")]
    pub extend_gap_score: i32,
}

fn default_match_score() -> i32 { 10 }
fn default_mismatch_score() -> i32 { -10 }
fn default_open_gap_score() -> i32 { -10 }
fn default_extend_gap_score() -> i32 { -1 }

impl Default for AlignerParams {
    /// Favours a single substitution over an insertion/deletion pair.
    fn default() -> Self {
        Self {
            mode: AlignmentMode::Global,
            match_score: default_match_score(),
            mismatch_score: default_mismatch_score(),
            open_gap_score: default_open_gap_score(),
            extend_gap_score: default_extend_gap_score(),
        }
    }
}

impl AlignerParams {
    /// Check the scoring scheme. The mode is checked separately by
    /// [`ensure_global_mode`] so that a misconfigured aligner can still be
    /// built and reported on.
    pub fn validate(&self) -> AlignResult<()> {
        if self.match_score <= self.mismatch_score {
            return Err(AlignError::InvalidParams(format!(
                "match score ({}) must exceed mismatch score ({})",
                self.match_score, self.mismatch_score
            )));
        }
        if self.extend_gap_score > 0 {
            return Err(AlignError::InvalidParams(format!(
                "extend gap score must not be positive, got {}",
                self.extend_gap_score
            )));
        }
        if self.open_gap_score > self.extend_gap_score {
            return Err(AlignError::InvalidParams(format!(
                "open gap score ({}) must not exceed extend gap score ({})",
                self.open_gap_score, self.extend_gap_score
            )));
        }
        Ok(())
    }

    /// Score of a gap run of `len` columns.
    pub fn gap_score(&self, len: usize) -> i32 {
        match len {
            0 => 0,
            n => self.open_gap_score + (n as i32 - 1) * self.extend_gap_score,
        }
    }
}

pub trait Aligner {
    /// Align `reference` against `alternate`.
    fn align(&self, reference: &[u8], alternate: &[u8]) -> AlignResult<PairwiseAlignment>;
    fn mode(&self) -> AlignmentMode;
    fn name(&self) -> &'static str;
}

/// Affine-gap aligner backed by `bio::alignment::pairwise`.
#[derive(Debug, Clone, Default)]
pub struct PairwiseAligner {
    params: AlignerParams,
}

impl PairwiseAligner {
    pub fn new(params: AlignerParams) -> AlignResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AlignerParams {
        &self.params
    }
}

impl Aligner for PairwiseAligner {
    fn align(&self, reference: &[u8], alternate: &[u8]) -> AlignResult<PairwiseAlignment> {
        ensure_global_mode(self.mode())?;

        // A global alignment against an empty sequence is a single gap run.
        if reference.is_empty() || alternate.is_empty() {
            let score = self.params.gap_score(reference.len().max(alternate.len()));
            let reference_row = gap_padded(reference, alternate.len());
            let alternate_row = gap_padded(alternate, reference.len());
            let alignment = PairwiseAlignment::from_rows(reference_row, alternate_row)?;
            return Ok(alignment.with_score(score));
        }

        let (match_score, mismatch_score) = (self.params.match_score, self.params.mismatch_score);
        let score = move |a: u8, b: u8| if a == b { match_score } else { mismatch_score };

        // rust-bio charges `gap_open + k * gap_extend` for a gap of length k
        let gap_open = self.params.open_gap_score - self.params.extend_gap_score;
        let gap_extend = self.params.extend_gap_score;

        let mut aligner = BioAligner::with_capacity(
            reference.len(),
            alternate.len(),
            gap_open,
            gap_extend,
            score,
        );
        let alignment = aligner.global(reference, alternate);

        PairwiseAlignment::from_bio(&alignment, reference, alternate)
    }

    fn mode(&self) -> AlignmentMode {
        self.params.mode
    }

    fn name(&self) -> &'static str {
        "rust-bio"
    }
}

fn gap_padded(seq: &[u8], other_len: usize) -> Vec<u8> {
    if seq.is_empty() {
        vec![GAP; other_len]
    } else {
        seq.to_vec()
    }
}

/// A residue and its offset in its own (ungapped) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Residue {
    pub position: Position,
    pub base: u8,
}

/// One column of a pairwise alignment. `None` marks a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedColumn {
    pub index: Position,
    pub reference: Option<Residue>,
    pub alternate: Option<Residue>,
}

impl AlignedColumn {
    pub fn variant_base(&self) -> VariantBase {
        VariantBase::classify(
            self.reference.map_or(GAP, |r| r.base),
            self.alternate.map_or(GAP, |r| r.base),
        )
    }
}

/// Global alignment of a reference and an alternate sequence, stored as
/// two gapped rows of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseAlignment {
    reference_row: Vec<u8>,
    alternate_row: Vec<u8>,
    score: Option<i32>,
}

impl PairwiseAlignment {
    /// Build an alignment from already gapped rows, e.g. `"ATC-T"` / `"A-GAT"`.
    pub fn from_rows<R: AsRef<[u8]>, A: AsRef<[u8]>>(
        reference_row: R,
        alternate_row: A,
    ) -> AlignResult<Self> {
        let reference_row = reference_row.as_ref();
        let alternate_row = alternate_row.as_ref();

        if reference_row.len() != alternate_row.len() {
            return Err(AlignError::UnequalRowLengths {
                reference: reference_row.len(),
                alternate: alternate_row.len(),
            });
        }

        if let Some(column) = reference_row
            .iter()
            .zip(alternate_row)
            .position(|(&r, &a)| r == GAP && a == GAP)
        {
            return Err(AlignError::EmptyColumn { column });
        }

        Ok(Self {
            reference_row: reference_row.to_vec(),
            alternate_row: alternate_row.to_vec(),
            score: None,
        })
    }

    /// Convert a rust-bio alignment of `reference` (x) against `alternate` (y).
    pub fn from_bio(
        alignment: &BioAlignment,
        reference: &[u8],
        alternate: &[u8],
    ) -> AlignResult<Self> {
        let mode = AlignmentMode::from(alignment.mode);
        ensure_global_mode(mode)?;

        let mut reference_row = Vec::with_capacity(alignment.operations.len());
        let mut alternate_row = Vec::with_capacity(alignment.operations.len());
        let (mut x, mut y) = (0usize, 0usize);

        for op in &alignment.operations {
            let (consumes_x, consumes_y) = match op {
                AlignmentOperation::Match | AlignmentOperation::Subst => (true, true),
                AlignmentOperation::Ins => (true, false),
                AlignmentOperation::Del => (false, true),
                AlignmentOperation::Xclip(0) | AlignmentOperation::Yclip(0) => continue,
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {
                    return Err(AlignError::MalformedAlignment(format!(
                        "clipping operation at column {} in a global alignment",
                        reference_row.len()
                    )));
                }
            };

            reference_row.push(if consumes_x {
                take(reference, &mut x, "reference")?
            } else {
                GAP
            });
            alternate_row.push(if consumes_y {
                take(alternate, &mut y, "alternate")?
            } else {
                GAP
            });
        }

        if x != reference.len() || y != alternate.len() {
            return Err(AlignError::MalformedAlignment(format!(
                "alignment covers {} of {} reference and {} of {} alternate residues",
                x,
                reference.len(),
                y,
                alternate.len()
            )));
        }

        Ok(Self::from_rows(reference_row, alternate_row)?.with_score(alignment.score))
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn score(&self) -> Option<i32> {
        self.score
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.reference_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference_row.is_empty()
    }

    pub fn reference_row(&self) -> &[u8] {
        &self.reference_row
    }

    pub fn alternate_row(&self) -> &[u8] {
        &self.alternate_row
    }

    pub fn columns(&self) -> Columns<'_> {
        Columns {
            alignment: self,
            index: 0,
            reference_position: 0,
            alternate_position: 0,
        }
    }

    /// Three-line rendering: reference row, match line, alternate row.
    pub fn pretty(&self) -> String {
        let midline: String = self
            .columns()
            .map(|column| match column.variant_base() {
                VariantBase::Match => '|',
                VariantBase::Mismatch => '.',
                VariantBase::Deletion | VariantBase::Insertion => ' ',
            })
            .collect();

        format!(
            "{}\n{}\n{}",
            String::from_utf8_lossy(&self.reference_row),
            midline,
            String::from_utf8_lossy(&self.alternate_row)
        )
    }
}

fn take(seq: &[u8], cursor: &mut usize, label: &str) -> AlignResult<u8> {
    let base = seq.get(*cursor).copied().ok_or_else(|| {
        AlignError::MalformedAlignment(format!(
            "alignment runs past the end of the {} sequence ({} residues)",
            label,
            seq.len()
        ))
    })?;
    *cursor += 1;
    Ok(base)
}

/// Column iterator tracking each sequence's own coordinate.
pub struct Columns<'a> {
    alignment: &'a PairwiseAlignment,
    index: Position,
    reference_position: Position,
    alternate_position: Position,
}

impl Iterator for Columns<'_> {
    type Item = AlignedColumn;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let reference_base = *self.alignment.reference_row.get(index)?;
        let alternate_base = *self.alignment.alternate_row.get(index)?;
        self.index += 1;

        let reference = advance(reference_base, &mut self.reference_position);
        let alternate = advance(alternate_base, &mut self.alternate_position);

        Some(AlignedColumn {
            index,
            reference,
            alternate,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.alignment.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Columns<'_> {}

fn advance(base: u8, position: &mut Position) -> Option<Residue> {
    if base == GAP {
        return None;
    }
    let residue = Residue {
        position: *position,
        base,
    };
    *position += 1;
    Some(residue)
}

pub fn ensure_global_mode(mode: AlignmentMode) -> AlignResult<()> {
    match mode {
        AlignmentMode::Global => Ok(()),
        actual => Err(AlignError::NonGlobalMode { actual }),
    }
}

/// Both records must carry the same molecule type; returns it.
pub fn validate_molecule_types(
    reference: &SeqRecord,
    alternate: &SeqRecord,
) -> AlignResult<MoleculeType> {
    let expected = reference
        .molecule_type
        .ok_or_else(|| AlignError::MissingMoleculeType {
            id: reference.id.clone(),
        })?;
    let actual = alternate
        .molecule_type
        .ok_or_else(|| AlignError::MissingMoleculeType {
            id: alternate.id.clone(),
        })?;

    if expected != actual {
        return Err(AlignError::MoleculeTypeMismatch { expected, actual });
    }
    Ok(expected)
}

/// Validate the aligner and both records, then align them.
pub fn align_records<A: Aligner + ?Sized>(
    reference: &SeqRecord,
    alternate: &SeqRecord,
    aligner: &A,
) -> AlignResult<PairwiseAlignment> {
    ensure_global_mode(aligner.mode())?;
    let molecule_type = validate_molecule_types(reference, alternate)?;
    for record in [reference, alternate] {
        if !record.seq.is_ascii() {
            return Err(AlignError::NonAsciiSequence {
                id: record.id.clone(),
            });
        }
        if record.as_bytes().contains(&GAP) {
            return Err(AlignError::GapInSequence {
                id: record.id.clone(),
            });
        }
    }

    log::debug!(
        "Aligning {} ({} residues) against {} ({} residues) as {} with {}",
        reference.id,
        reference.len(),
        alternate.id,
        alternate.len(),
        molecule_type,
        aligner.name()
    );

    let alignment = aligner.align(reference.as_bytes(), alternate.as_bytes())?;
    ensure_row_spells(alignment.reference_row(), reference)?;
    ensure_row_spells(alignment.alternate_row(), alternate)?;
    log::debug!(
        "Alignment has {} columns, score {:?}",
        alignment.len(),
        alignment.score()
    );
    Ok(alignment)
}

/// The row with its gaps removed must be the record's own sequence.
fn ensure_row_spells(row: &[u8], record: &SeqRecord) -> AlignResult<()> {
    let residues = row.iter().filter(|&&base| base != GAP);
    if residues.eq(record.as_bytes().iter()) {
        return Ok(());
    }
    Err(AlignError::MalformedAlignment(format!(
        "aligned row {} does not spell sequence record {}",
        String::from_utf8_lossy(row),
        record.id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::generate_seq_record;

    fn residue(position: Position, base: u8) -> Option<Residue> {
        Some(Residue { position, base })
    }

    #[test]
    fn test_from_rows_rejects_unequal_lengths() {
        let err = PairwiseAlignment::from_rows("ACT", "AC").unwrap_err();
        assert_eq!(
            err,
            AlignError::UnequalRowLengths {
                reference: 3,
                alternate: 2
            }
        );
    }

    #[test]
    fn test_from_rows_rejects_double_gap() {
        let err = PairwiseAlignment::from_rows("A-T", "A-T").unwrap_err();
        assert_eq!(err, AlignError::EmptyColumn { column: 1 });
    }

    #[test]
    fn test_columns_track_native_positions() {
        let alignment = PairwiseAlignment::from_rows("ATC-T", "A-GAT").unwrap();
        let columns: Vec<_> = alignment.columns().collect();

        assert_eq!(columns.len(), 5);
        assert_eq!(alignment.columns().len(), 5);
        assert_eq!(columns[1].reference, residue(1, b'T'));
        assert_eq!(columns[1].alternate, None);
        assert_eq!(columns[2].reference, residue(2, b'C'));
        assert_eq!(columns[2].alternate, residue(1, b'G'));
        assert_eq!(columns[3].reference, None);
        assert_eq!(columns[3].alternate, residue(2, b'A'));
        assert_eq!(columns[4].reference, residue(3, b'T'));
        assert_eq!(columns[4].alternate, residue(3, b'T'));

        let bases: Vec<_> = columns.iter().map(|c| c.variant_base()).collect();
        assert_eq!(
            bases,
            vec![
                VariantBase::Match,
                VariantBase::Deletion,
                VariantBase::Mismatch,
                VariantBase::Insertion,
                VariantBase::Match
            ]
        );
    }

    #[test]
    fn test_pairwise_aligner_substitution() {
        let aligner = PairwiseAligner::default();
        let alignment = aligner.align(b"ACT", b"AGT").unwrap();

        assert_eq!(alignment.reference_row(), b"ACT");
        assert_eq!(alignment.alternate_row(), b"AGT");
        assert_eq!(alignment.score(), Some(10));
    }

    #[test]
    fn test_pairwise_aligner_deletion_orientation() {
        let aligner = PairwiseAligner::default();
        let alignment = aligner.align(b"ACGT", b"ACT").unwrap();

        assert_eq!(alignment.reference_row(), b"ACGT");
        assert_eq!(alignment.alternate_row(), b"AC-T");
        assert_eq!(alignment.score(), Some(20));
    }

    #[test]
    fn test_pairwise_aligner_insertion_orientation() {
        let aligner = PairwiseAligner::default();
        let alignment = aligner.align(b"ACT", b"ACGT").unwrap();

        assert_eq!(alignment.reference_row(), b"AC-T");
        assert_eq!(alignment.alternate_row(), b"ACGT");
    }

    #[test]
    fn test_pairwise_aligner_empty_alternate() {
        let aligner = PairwiseAligner::default();
        let alignment = aligner.align(b"ACG", b"").unwrap();

        assert_eq!(alignment.reference_row(), b"ACG");
        assert_eq!(alignment.alternate_row(), b"---");
        assert_eq!(alignment.score(), Some(-12));
    }

    #[test]
    fn test_pairwise_aligner_rejects_local_mode() {
        let params = AlignerParams {
            mode: AlignmentMode::Local,
            ..AlignerParams::default()
        };
        let aligner = PairwiseAligner::new(params).unwrap();
        let err = aligner.align(b"ACT", b"AGT").unwrap_err();

        assert_eq!(
            err,
            AlignError::NonGlobalMode {
                actual: AlignmentMode::Local
            }
        );
        assert_eq!(err.to_string(), "Aligner must run in global mode, got local mode");
    }

    #[test]
    fn test_params_validation() {
        assert!(AlignerParams::default().validate().is_ok());

        let flat = AlignerParams {
            match_score: -10,
            ..AlignerParams::default()
        };
        assert!(matches!(flat.validate(), Err(AlignError::InvalidParams(_))));

        let cheap_open = AlignerParams {
            open_gap_score: -1,
            extend_gap_score: -5,
            ..AlignerParams::default()
        };
        assert!(matches!(
            PairwiseAligner::new(cheap_open),
            Err(AlignError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_gap_score() {
        let params = AlignerParams::default();
        assert_eq!(params.gap_score(0), 0);
        assert_eq!(params.gap_score(1), -10);
        assert_eq!(params.gap_score(4), -13);
    }

    #[test]
    fn test_validate_molecule_types() {
        let reference = generate_seq_record("ACT", "ref", MoleculeType::Dna);
        let alternate = generate_seq_record("AGT", "alt", MoleculeType::Dna);
        assert_eq!(
            validate_molecule_types(&reference, &alternate),
            Ok(MoleculeType::Dna)
        );

        let protein = generate_seq_record("AGT", "alt", MoleculeType::Protein);
        let err = validate_molecule_types(&reference, &protein).unwrap_err();
        assert_eq!(
            err,
            AlignError::MoleculeTypeMismatch {
                expected: MoleculeType::Dna,
                actual: MoleculeType::Protein
            }
        );
        assert_eq!(
            err.to_string(),
            "Molecule type mismatch: expected dna, got protein"
        );

        let bare = SeqRecord::new("alt", "AGT", None);
        assert_eq!(
            validate_molecule_types(&reference, &bare),
            Err(AlignError::MissingMoleculeType {
                id: "alt".to_string()
            })
        );
    }

    #[test]
    fn test_align_records_checks_mode_first() {
        let params = AlignerParams {
            mode: AlignmentMode::Semiglobal,
            ..AlignerParams::default()
        };
        let aligner = PairwiseAligner::new(params).unwrap();
        let reference = SeqRecord::new("ref", "ACT", None);
        let alternate = SeqRecord::new("alt", "AGT", None);

        assert_eq!(
            align_records(&reference, &alternate, &aligner),
            Err(AlignError::NonGlobalMode {
                actual: AlignmentMode::Semiglobal
            })
        );
    }

    #[test]
    fn test_align_records_rejects_gapped_input() {
        let reference = generate_seq_record("AC-T", "ref", MoleculeType::Dna);
        let alternate = generate_seq_record("ACGT", "alt", MoleculeType::Dna);

        assert_eq!(
            align_records(&reference, &alternate, &PairwiseAligner::default()),
            Err(AlignError::GapInSequence {
                id: "ref".to_string()
            })
        );
    }

    #[test]
    fn test_align_records_rejects_non_ascii_input() {
        let reference = generate_seq_record("A\u{c9}T", "ref", MoleculeType::Protein);
        let alternate = generate_seq_record("AET", "alt", MoleculeType::Protein);

        let err = align_records(&reference, &alternate, &PairwiseAligner::default()).unwrap_err();
        assert_eq!(
            err,
            AlignError::NonAsciiSequence {
                id: "ref".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Sequence record ref contains non-ASCII characters"
        );
    }

    #[test]
    fn test_params_validation_leaves_mode_to_boundary() {
        let params = AlignerParams {
            mode: AlignmentMode::Local,
            ..AlignerParams::default()
        };
        assert!(params.validate().is_ok());

        let aligner = PairwiseAligner::new(params).unwrap();
        let reference = generate_seq_record("ACT", "ref", MoleculeType::Dna);
        let alternate = generate_seq_record("AGT", "alt", MoleculeType::Dna);
        assert_eq!(
            align_records(&reference, &alternate, &aligner),
            Err(AlignError::NonGlobalMode {
                actual: AlignmentMode::Local
            })
        );
    }

    #[test]
    fn test_ensure_row_spells() {
        let record = generate_seq_record("ACGT", "ref", MoleculeType::Dna);
        assert!(ensure_row_spells(b"AC-GT", &record).is_ok());
        assert!(matches!(
            ensure_row_spells(b"AC-T", &record),
            Err(AlignError::MalformedAlignment(_))
        ));
        assert!(matches!(
            ensure_row_spells(b"ACGTA", &record),
            Err(AlignError::MalformedAlignment(_))
        ));
    }

    #[test]
    fn test_pretty() {
        let alignment = PairwiseAlignment::from_rows("ATC-T", "A-GAT").unwrap();
        assert_eq!(alignment.pretty(), "ATC-T\n| . |\nA-GAT");
    }
}
