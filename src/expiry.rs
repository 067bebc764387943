use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use serde::Deserializer;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime keys are stored with a far-future expiry instead of none.
const LIFETIME_YEARS: u32 = 99;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum LicenseType {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "LIFETIME")]
    Lifetime,
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("unknown license type `{0}`")]
pub struct UnknownLicenseType(pub String);

impl LicenseType {
    pub const ALL: [LicenseType; 5] = [
        LicenseType::OneMonth,
        LicenseType::ThreeMonths,
        LicenseType::SixMonths,
        LicenseType::OneYear,
        LicenseType::Lifetime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LicenseType::OneMonth => "1M",
            LicenseType::ThreeMonths => "3M",
            LicenseType::SixMonths => "6M",
            LicenseType::OneYear => "1Y",
            LicenseType::Lifetime => "LIFETIME",
        }
    }

    /// Calendar months added to the issuance time.
    pub fn months(self) -> u32 {
        match self {
            LicenseType::OneMonth => 1,
            LicenseType::ThreeMonths => 3,
            LicenseType::SixMonths => 6,
            LicenseType::OneYear => 12,
            LicenseType::Lifetime => LIFETIME_YEARS * 12,
        }
    }

    pub fn is_lifetime(self) -> bool {
        self == LicenseType::Lifetime
    }
}

impl FromStr for LicenseType {
    type Err = UnknownLicenseType;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        LicenseType::ALL
            .into_iter()
            .find(|license_type| license_type.as_str() == tag)
            .ok_or_else(|| UnknownLicenseType(tag.to_owned()))
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serde adapter for stored `license_type` tags; pair with `#[serde(default)]`.
///
/// The expiry is already fixed on the record, so an unrecognised tag reads as
/// `None` instead of failing the whole document.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<LicenseType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.as_str().and_then(|tag| tag.parse().ok()))
}

/// Computes the expiry stored at issuance.
///
/// Month arithmetic clamps to the last day of the target month, so Jan 31
/// plus one month is the last day of February. The time of day is kept.
pub fn compute_expiry(issued_at: DateTime<Utc>, license_type: LicenseType) -> DateTime<Utc> {
    issued_at
        .checked_add_months(Months::new(license_type.months()))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
