use serde::{Deserialize, Serialize};

/// Asset inventory columns offered as dropdown filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFilterField {
    /// Free-form asset category.
    Category,
    /// Site or room the asset lives in.
    Location,
    /// Lifecycle status.
    Status,
}

impl AssetFilterField {
    /// Returns the storage column backing this filter.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Location => "location",
            Self::Status => "status",
        }
    }
}
