//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// The semantic channel an edge belongs to.
///
/// Edges of different media between the same pair of agents are fully
/// independent: each medium has its own adjacency and outgoing-edge index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medium {
    /// Agents exchange information about innovations.
    Communication,
    /// Agents rely on each other's judgement.
    Trust,
}

impl Medium {
    /// Every medium, in declaration order.
    pub const ALL: [Self; 2] = [Self::Communication, Self::Trust];

    /// Configuration key for this medium.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::Trust => "trust",
        }
    }
}

impl core::fmt::Display for Medium {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_serde_uses_snake_case() {
        let json = serde_json::to_string(&Medium::Communication).ok();
        assert_eq!(json.as_deref(), Some("\"communication\""));
        let parsed: Result<Medium, _> = serde_json::from_str("\"trust\"");
        assert_eq!(parsed.ok(), Some(Medium::Trust));
    }

    #[test]
    fn display_matches_config_key() {
        for medium in Medium::ALL {
            assert_eq!(medium.to_string(), medium.as_str());
        }
    }
}
