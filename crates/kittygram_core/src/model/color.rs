//! Closed set of valid cat colors.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Valid cat colors. The wire value is the lowercase variant name.
///
/// The first variant doubles as the default for cats created without an
/// explicit color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatColor {
    #[default]
    Gray,
    Black,
    White,
    Ginger,
    Mixed,
}

impl CatColor {
    /// Every accepted color, in declaration order.
    pub const ALL: [CatColor; 5] = [
        CatColor::Gray,
        CatColor::Black,
        CatColor::White,
        CatColor::Ginger,
        CatColor::Mixed,
    ];

    /// Returns the wire/storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Black => "black",
            Self::White => "white",
            Self::Ginger => "ginger",
            Self::Mixed => "mixed",
        }
    }

    /// Parses an exact wire value. Matching is case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.as_str() == value)
    }
}

impl Display for CatColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
