use serde::{Deserialize, Serialize};

/// A named token row. `name` is unique across active and inactive rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

/// Which rows a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    #[default]
    Active,
    Inactive,
}

impl StatusFilter {
    /// Maps the `?query=` value of `GET /tokens`. Only `inactive` selects
    /// archived rows; anything else (including nothing) lists active ones.
    pub fn from_query(query: Option<&str>) -> Self {
        match query {
            Some("inactive") => StatusFilter::Inactive,
            _ => StatusFilter::Active,
        }
    }

    /// `None` means no constraint on the `active` column.
    pub fn as_active(self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            other => Err(format!(
                "invalid status: {}. Must be one of all, active, inactive",
                other
            )),
        }
    }
}
