use std::fmt;

use serde::{Deserialize, Serialize};

/// Employment tiers at the establishment, lowest to highest.
///
/// The declaration order is the permission order: `Cdd < Cdi <
/// Responsable < Patron`. Finalization, configuration edits and the
/// retention purge require [`Role::Patron`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Cdd,
    Cdi,
    Responsable,
    Patron,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cdd => "CDD",
            Self::Cdi => "CDI",
            Self::Responsable => "RESPONSABLE",
            Self::Patron => "PATRON",
        }
    }

    /// Parses a stored role string. Case-insensitive so values typed at
    /// the command line and values stored by older tooling both load.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CDD" => Some(Self::Cdd),
            "CDI" => Some(Self::Cdi),
            "RESPONSABLE" => Some(Self::Responsable),
            "PATRON" => Some(Self::Patron),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
