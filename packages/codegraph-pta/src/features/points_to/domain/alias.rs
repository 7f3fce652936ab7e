//! Alias query verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of an alias query between two pointers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AliasResult {
    NoAlias,
    MayAlias,
    /// Both pointers refer to the same single concrete location
    MustAlias,
}

impl AliasResult {
    /// MayAlias or MustAlias
    #[inline]
    pub fn may_alias(&self) -> bool {
        !matches!(self, AliasResult::NoAlias)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AliasResult::NoAlias => "NoAlias",
            AliasResult::MayAlias => "MayAlias",
            AliasResult::MustAlias => "MustAlias",
        }
    }
}

impl fmt::Display for AliasResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
