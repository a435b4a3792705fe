//! Sequence records handed to the aligner boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const REF_SEQUENCE_ID: &str = "ref";
pub const ALT_SEQUENCE_ID: &str = "alt";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Unknown molecule type: {0} (expected one of protein, dna, rna)")]
    UnknownMoleculeType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoleculeType {
    #[default]
    Protein,
    Dna,
    Rna,
}

impl MoleculeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoleculeType::Protein => "protein",
            MoleculeType::Dna => "dna",
            MoleculeType::Rna => "rna",
        }
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoleculeType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protein" => Ok(MoleculeType::Protein),
            "dna" => Ok(MoleculeType::Dna),
            "rna" => Ok(MoleculeType::Rna),
            _ => Err(RecordError::UnknownMoleculeType(s.to_string())),
        }
    }
}

/// A named sequence with an optional molecule-type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqRecord {
    pub id: String,
    pub seq: String,
    pub molecule_type: Option<MoleculeType>,
}

impl SeqRecord {
    pub fn new<I: Into<String>, S: Into<String>>(
        id: I,
        seq: S,
        molecule_type: Option<MoleculeType>,
    ) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
            molecule_type,
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.seq.as_bytes()
    }
}

/// Wrap a raw sequence into an annotated record.
///
/// Records built here always carry a molecule type, so a pair of them only
/// fails validation when the two types differ.
pub fn generate_seq_record(seq: &str, id: &str, molecule_type: MoleculeType) -> SeqRecord {
    SeqRecord::new(id, seq, Some(molecule_type))
}
