//! Property transaction records and their derived fields.
//!
//! Declared field order is the CSV column order used by export and import.
//! Optional fields model missing values; derived fields may be omitted from
//! imported files and are rebuilt by [`PropertyRecord::recompute_derived`].

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{PriceBuckets, SizeBuckets};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: u64,
    pub neighborhood: Option<String>,
    pub property_type: Option<String>,
    pub sale_date: NaiveDate,
    #[serde(deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub square_footage: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub bedrooms: Option<u8>,
    #[serde(deserialize_with = "lenient")]
    pub bathrooms: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub age_years: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub parking_spaces: Option<u8>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub price_per_sqft: Option<f64>,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub quarter: u32,
    #[serde(default)]
    pub season: Season,
    #[serde(default)]
    pub age_category: Option<AgeCategory>,
}

impl PropertyRecord {
    /// Rebuilds every derived field from the current base fields.
    pub fn recompute_derived(&mut self) {
        self.price_per_sqft = match (self.price, self.square_footage) {
            (Some(price), Some(sqft)) if sqft > 0 => Some(price / sqft as f64),
            _ => None,
        };
        self.year = self.sale_date.year();
        self.month = self.sale_date.month();
        self.quarter = quarter_of(self.sale_date);
        self.season = Season::from_month(self.month);
        self.age_category = self.age_years.map(AgeCategory::from_age);
    }

    pub fn price_category(&self, buckets: &PriceBuckets) -> Option<PriceCategory> {
        self.price.map(|price| PriceCategory::classify(price, buckets))
    }

    pub fn size_category(&self, buckets: &SizeBuckets) -> Option<SizeCategory> {
        self.square_footage
            .map(|sqft| SizeCategory::classify(sqft, buckets))
    }
}

/// Optional numeric cell where blank or unparseable text reads as missing.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .and_then(|cell| cell.parse().ok()))
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "0-5 years")]
    New,
    #[serde(rename = "6-15 years")]
    Recent,
    #[serde(rename = "16-30 years")]
    Established,
    #[serde(rename = "31-50 years")]
    Mature,
    #[serde(rename = "50+ years")]
    Historic,
}

impl AgeCategory {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=5 => AgeCategory::New,
            6..=15 => AgeCategory::Recent,
            16..=30 => AgeCategory::Established,
            31..=50 => AgeCategory::Mature,
            _ => AgeCategory::Historic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::New => "0-5 years",
            AgeCategory::Recent => "6-15 years",
            AgeCategory::Established => "16-30 years",
            AgeCategory::Mature => "31-50 years",
            AgeCategory::Historic => "50+ years",
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceCategory {
    Budget,
    #[serde(rename = "Mid-Market")]
    MidMarket,
    Premium,
    Luxury,
}

impl PriceCategory {
    /// Right-open buckets: a price equal to a boundary falls in the higher bucket.
    pub fn classify(price: f64, buckets: &PriceBuckets) -> Self {
        if price < buckets.budget_below {
            PriceCategory::Budget
        } else if price < buckets.mid_market_below {
            PriceCategory::MidMarket
        } else if price < buckets.premium_below {
            PriceCategory::Premium
        } else {
            PriceCategory::Luxury
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCategory::Budget => "Budget",
            PriceCategory::MidMarket => "Mid-Market",
            PriceCategory::Premium => "Premium",
            PriceCategory::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeCategory {
    Compact,
    Standard,
    Large,
    #[serde(rename = "Extra Large")]
    ExtraLarge,
}

impl SizeCategory {
    pub fn classify(sqft: i64, buckets: &SizeBuckets) -> Self {
        if sqft < buckets.compact_below {
            SizeCategory::Compact
        } else if sqft < buckets.standard_below {
            SizeCategory::Standard
        } else if sqft < buckets.large_below {
            SizeCategory::Large
        } else {
            SizeCategory::ExtraLarge
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::Compact => "Compact",
            SizeCategory::Standard => "Standard",
            SizeCategory::Large => "Large",
            SizeCategory::ExtraLarge => "Extra Large",
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
