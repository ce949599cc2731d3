//! Rating value object for seller reviews (1 to 5 stars).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Star rating: 1 (poor) to 5 (excellent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    /// Minimum allowed rating.
    pub const MIN: u8 = 1;
    /// Maximum allowed rating.
    pub const MAX: u8 = 5;

    /// Creates a Rating, rejecting values outside 1..=5.
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value < Self::MIN as i32 || value > Self::MAX as i32 {
            return Err(DomainError::InvalidRating { value });
        }
        Ok(Self(value as u8))
    }

    /// Returns the numeric value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the zero-based histogram bucket for this rating.
    pub fn bucket(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<i32> for Rating {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> i32 {
        rating.0 as i32
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}
