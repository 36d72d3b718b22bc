use std::fmt;

/// A structural edit applied to a protein sequence.
///
/// Positions are 1-based and inclusive, relative to the sequence as it was when the edit
/// was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl Modification {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    /// Number of residues the edit removed.
    pub fn residue_count(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}-{}]", self.label, self.start, self.end)
    }
}
