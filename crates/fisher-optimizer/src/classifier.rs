//! Weak/strong classification with index maps for reassembly.
//!
//! A batch is split into two ordered sub-batches. Each keeps a map from its
//! local position back to the operation's position in the input batch, so
//! results produced per group can be spliced back into input order exactly.
//!
//! The partition is total and disjoint: every input index appears in
//! exactly one of the two index maps.

use std::fmt;

use fisher_types::{FisherError, Result, SignedOperation};

/// Which settlement strategy an operation is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Era-bound (`period_bound == true`): counted into the era accumulator.
    Weak,
    /// Generic operation: settled through the chunked settler.
    Strong,
}

impl OperationKind {
    #[must_use]
    pub fn of(op: &SignedOperation) -> Self {
        if op.is_period_bound() {
            Self::Weak
        } else {
            Self::Strong
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weak => write!(f, "WEAK"),
            Self::Strong => write!(f, "STRONG"),
        }
    }
}

/// An ordered, kind-homogeneous slice of the input batch.
#[derive(Debug, Clone)]
pub struct SubBatch<'a> {
    pub kind: OperationKind,
    pub operations: Vec<&'a SignedOperation>,
    /// `index_map[i]` is the input position of `operations[i]`.
    pub index_map: Vec<usize>,
}

impl<'a> SubBatch<'a> {
    fn empty(kind: OperationKind) -> Self {
        Self {
            kind,
            operations: Vec::new(),
            index_map: Vec::new(),
        }
    }

    fn push(&mut self, index: usize, op: &'a SignedOperation) {
        self.operations.push(op);
        self.index_map.push(index);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Result of classifying a batch.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    pub weak: SubBatch<'a>,
    pub strong: SubBatch<'a>,
    /// Length of the input batch.
    pub total: usize,
}

impl Partition<'_> {
    /// Splice per-group results back into input order.
    pub fn reassemble(&self, weak_results: &[bool], strong_results: &[bool]) -> Result<Vec<bool>> {
        if weak_results.len() != self.weak.len() {
            return Err(FisherError::LengthMismatch {
                expected: self.weak.len(),
                actual: weak_results.len(),
            });
        }
        if strong_results.len() != self.strong.len() {
            return Err(FisherError::LengthMismatch {
                expected: self.strong.len(),
                actual: strong_results.len(),
            });
        }

        let mut out = vec![false; self.total];
        for (&idx, &ok) in self.weak.index_map.iter().zip(weak_results) {
            out[idx] = ok;
        }
        for (&idx, &ok) in self.strong.index_map.iter().zip(strong_results) {
            out[idx] = ok;
        }
        Ok(out)
    }
}

/// Classify `operations` into weak and strong groups, preserving order.
///
/// With `era_path_enabled == false` everything is routed to the strong group.
#[must_use]
pub fn classify(operations: &[SignedOperation], era_path_enabled: bool) -> Partition<'_> {
    let mut weak = SubBatch::empty(OperationKind::Weak);
    let mut strong = SubBatch::empty(OperationKind::Strong);

    for (idx, op) in operations.iter().enumerate() {
        match OperationKind::of(op) {
            OperationKind::Weak if era_path_enabled => weak.push(idx, op),
            _ => strong.push(idx, op),
        }
    }

    tracing::trace!(
        total = operations.len(),
        weak = weak.len(),
        strong = strong.len(),
        "Batch classified"
    );

    Partition {
        weak,
        strong,
        total: operations.len(),
    }
}
