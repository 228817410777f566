use std::fmt;

use serde::Serialize;

use crate::food::api::traits::LabelCandidate;

pub const UNKNOWN_FOOD: &str = "Unknown food";

/// The single food name used for nutrition lookup. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FoodIdentity(String);

impl FoodIdentity {
    /// Blank names collapse to [`UNKNOWN_FOOD`].
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            Self::unknown()
        } else {
            Self(name)
        }
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_FOOD.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_FOOD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FoodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Picks the highest-ranked label verbatim.
pub fn select_food_identity(labels: &[LabelCandidate]) -> FoodIdentity {
    labels
        .first()
        .map(|label| FoodIdentity::new(label.description.clone()))
        .unwrap_or_else(FoodIdentity::unknown)
}
