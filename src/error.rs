//! Error taxonomy for the analytics pipeline.
//!
//! Configuration problems are fatal and surface to the caller. Validation
//! failures describe a single rejected record; the cleaner logs and drops the
//! record instead of returning them. Insufficient data only arises when an
//! insight computation receives nothing at all.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Record {id} failed validation: {failure}")]
    Validation { id: u64, failure: ValidationFailure },
}

impl AnalyticsError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AnalyticsError::Configuration(message.into())
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        AnalyticsError::InsufficientData(message.into())
    }
}

/// Reason a record was rejected during cleaning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("missing price")]
    MissingPrice,
    #[error("missing square footage")]
    MissingSquareFootage,
    #[error("missing neighborhood")]
    MissingNeighborhood,
    #[error("price {0} outside accepted range")]
    PriceOutOfRange(f64),
    #[error("square footage {0} outside accepted range")]
    SquareFootageOutOfRange(i64),
    #[error("neighborhood '{0}' is not in the catalog")]
    UnknownNeighborhood(String),
    #[error("sale date {0} outside configured range")]
    SaleDateOutOfRange(NaiveDate),
    #[error("id already used by an earlier record")]
    DuplicateId,
}

impl ValidationFailure {
    /// Short stable label used when tallying rejections.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationFailure::MissingPrice => "missing_price",
            ValidationFailure::MissingSquareFootage => "missing_square_footage",
            ValidationFailure::MissingNeighborhood => "missing_neighborhood",
            ValidationFailure::PriceOutOfRange(_) => "price_out_of_range",
            ValidationFailure::SquareFootageOutOfRange(_) => "square_footage_out_of_range",
            ValidationFailure::UnknownNeighborhood(_) => "unknown_neighborhood",
            ValidationFailure::SaleDateOutOfRange(_) => "sale_date_out_of_range",
            ValidationFailure::DuplicateId => "duplicate_id",
        }
    }
}

pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;
