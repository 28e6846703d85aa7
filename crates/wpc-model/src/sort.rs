//! Sort state for a paged table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Active sort: an optional column plus a direction.
///
/// A `None` column means the source's natural order; the direction is
/// still carried so that re-selecting a column after clearing starts from
/// a known state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// No sort column, ascending.
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Sort by `column` in the given direction.
    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    /// Sort by `column` ascending.
    pub fn ascending(column: impl Into<String>) -> Self {
        Self::by(column, SortDirection::Asc)
    }

    /// Sort by `column` descending.
    pub fn descending(column: impl Into<String>) -> Self {
        Self::by(column, SortDirection::Desc)
    }

    /// Whether a sort column is selected.
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.column.is_some()
    }

    /// The state produced by clicking the header of `column`.
    ///
    /// Clicking the active column flips its direction; clicking any other
    /// column selects it ascending.
    #[must_use]
    pub fn toggled(&self, column: &str) -> Self {
        match self.column.as_deref() {
            Some(active) if active == column => Self {
                column: self.column.clone(),
                direction: self.direction.flipped(),
            },
            _ => Self::ascending(column),
        }
    }
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{} {}", column, self.direction),
            None => write!(f, "unsorted"),
        }
    }
}
