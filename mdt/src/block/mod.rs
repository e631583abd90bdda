pub mod reference;

use std::fmt;
use std::str::FromStr;

use crate::block::reference::ProofSubject;

/// The fixed vocabulary of block types.
///
/// Matching is case-sensitive: only the capitalized spelling (`Theorem`,
/// not `theorem` or `THEOREM`) opens a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockKind {
    Theorem,
    Proposition,
    Lemma,
    Fact,
    Observation,
    Definition,
    Example,
    Remark,
    Proof,
}

impl BlockKind {
    pub const ALL: [BlockKind; 9] = [
        BlockKind::Theorem,
        BlockKind::Proposition,
        BlockKind::Lemma,
        BlockKind::Fact,
        BlockKind::Observation,
        BlockKind::Definition,
        BlockKind::Example,
        BlockKind::Remark,
        BlockKind::Proof,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Theorem => "Theorem",
            BlockKind::Proposition => "Proposition",
            BlockKind::Lemma => "Lemma",
            BlockKind::Fact => "Fact",
            BlockKind::Observation => "Observation",
            BlockKind::Definition => "Definition",
            BlockKind::Example => "Example",
            BlockKind::Remark => "Remark",
            BlockKind::Proof => "Proof",
        }
    }

    /// Environment name used by the typesetting backend.
    pub fn environment(self) -> String {
        self.as_str().to_lowercase()
    }

    pub fn is_proof(self) -> bool {
        self == BlockKind::Proof
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a token is not in the block vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for BlockKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Structured description of a block node.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockInfo {
    pub kind: BlockKind,
    /// False for starred blocks, proofs, and blocks the resolver chose not
    /// to number.
    pub numbered: bool,
    /// Parenthetical name, e.g. `Fermat` in `Theorem (Fermat):`.
    pub name: Option<String>,
    /// Bracketed author list, e.g. `Balcar, Dow`.
    pub references: Option<String>,
    /// External label given as a `{#key}` prefix.
    pub label: Option<String>,
    /// Subject of a proof (`Proof (of #key):`).
    pub subject: Option<ProofSubject>,
    /// Number of proofs enclosing this one (0 for top-level proofs).
    pub proof_depth: u32,
}

impl BlockInfo {
    pub fn new(kind: BlockKind) -> Self {
        BlockInfo {
            kind,
            numbered: !kind.is_proof(),
            name: None,
            references: None,
            label: None,
            subject: None,
            proof_depth: 0,
        }
    }
}
