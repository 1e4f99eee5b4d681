//! The three diagram canvases a project can hold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Diagram kind. A project holds at most one live diagram per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Architecture,
    Database,
    Frontend,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 3] = [
        DiagramKind::Architecture,
        DiagramKind::Database,
        DiagramKind::Frontend,
    ];

    /// The wire/storage tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Architecture => "architecture",
            DiagramKind::Database => "database",
            DiagramKind::Frontend => "frontend",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the three diagram kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagram kind: '{0}'")]
pub struct UnknownDiagramKind(pub String);

impl FromStr for DiagramKind {
    type Err = UnknownDiagramKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "architecture" => Ok(DiagramKind::Architecture),
            "database" => Ok(DiagramKind::Database),
            "frontend" => Ok(DiagramKind::Frontend),
            other => Err(UnknownDiagramKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for kind in DiagramKind::ALL {
            assert_eq!(kind.as_str().parse::<DiagramKind>().unwrap(), kind);
            assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{}\"", kind));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "sequence".parse::<DiagramKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown diagram kind: 'sequence'");
    }
}
