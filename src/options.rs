use serde::{Deserialize, Serialize};

/// Largest canonical atom number any layer may mention.
pub const MAX_ATOMS: u32 = 32766;

/// Reader configuration.
///
/// Deserializable so callers can keep it next to the rest of their
/// settings; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Parse an `AuxInfo=` appendix when one follows the identifier.
    pub read_auxinfo: bool,
    /// Fail when the AuxInfo coordinates are missing or do not cover
    /// every atom.
    pub require_coordinates: bool,
    /// Upper bound for atom numbers; clamped to [`MAX_ATOMS`].
    pub max_atoms: u32,
    /// Require every component's connection table to be one connected
    /// graph.
    pub validate_connectivity: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            read_auxinfo: true,
            require_coordinates: false,
            max_atoms: MAX_ATOMS,
            validate_connectivity: true,
        }
    }
}

impl ReadOptions {
    pub(crate) fn atom_limit(&self) -> u32 {
        self.max_atoms.clamp(1, MAX_ATOMS)
    }
}
