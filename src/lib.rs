//! License lifecycle core for the CafeMonster admin console.
//!
//! Serial keys are generated at issuance, expiry dates are fixed from the
//! license type, and the status shown to operators is derived on every read
//! from the stored flag, the expiry date and the current time.

pub mod config;
pub mod expiry;
pub mod issuance;
pub mod listing;
pub mod serial;
pub mod status;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};

pub use crate::config::ConsoleConfig;
pub use crate::expiry::{compute_expiry, LicenseType};
pub use crate::serial::{generate_serial, SerialKey};
pub use crate::status::{derive_status, DerivedStatus, Severity, StatusFlag};

use crate::status::derive_status_with_window;

/// A license document as it is stored in the `licenses` collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LicenseRecord {
    /// Store-assigned document id.
    #[serde(default)]
    pub id: String,
    pub serial_key: String,
    pub product_id: String,
    /// `None` when the stored tag is missing or not one the console issues.
    #[serde(default, deserialize_with = "expiry::deserialize_lenient")]
    pub license_type: Option<LicenseType>,
    pub status: StatusFlag,
    #[serde(default, deserialize_with = "timestamp::deserialize_lenient")]
    pub expire_date: Option<DateTime<Utc>>,
    pub buyer_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub constraint_type: String,
    /// Device identifier the key is bound to once activated.
    #[serde(default)]
    pub bound_value: Option<String>,
    #[serde(default)]
    pub price_sold: f64,
    #[serde(default)]
    pub memo: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LicenseRecord {
    pub fn derived_status(&self, now: DateTime<Utc>, config: &ConsoleConfig) -> DerivedStatus {
        derive_status_with_window(
            &self.status,
            self.expire_date,
            now,
            config.expiring_soon_window(),
        )
    }
}

/// A document from the `buyers` collection.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Buyer {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref STORED_LICENSE: serde_json::Value = serde_json::json!({
            "id": "a81Xk2",
            "serial_key": "CM-AB12-CD34-EF56",
            "product_id": "CafeCrawler",
            "license_type": "6M",
            "constraint_type": "HWID",
            "buyer_name": "Park Jiho",
            "contact": "010-5555-0101",
            "email": "",
            "channel": "kakao",
            "price_sold": 90000,
            "memo": "",
            "status": "unused",
            "bound_value": null,
            "expire_date": { "seconds": 1735689600, "nanoseconds": 0 },
            "created_at": { "seconds": 1719792000, "nanoseconds": 500 }
        });
    }

    #[test]
    fn stored_license_decodes() {
        let record: LicenseRecord =
            serde_json::from_value(STORED_LICENSE.clone()).expect("Record should decode");

        assert_eq!(record.license_type, Some(LicenseType::SixMonths));
        assert_eq!(record.status, StatusFlag::Unused);
        assert_eq!(record.bound_value, None);
        assert_eq!(record.price_sold, 90000.0);
        assert_eq!(
            record.expire_date,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn record_with_garbage_expiry_still_decodes() {
        let mut value = STORED_LICENSE.clone();
        value["expire_date"] = serde_json::json!("next tuesday");
        value["status"] = serde_json::json!("active");

        let record: LicenseRecord =
            serde_json::from_value(value).expect("Record should decode");

        assert_eq!(record.expire_date, None);
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            record.derived_status(now, &ConsoleConfig::default()),
            DerivedStatus::InUse
        );
    }

    #[test]
    fn record_without_expiry_field_decodes() {
        let mut value = STORED_LICENSE.clone();
        value
            .as_object_mut()
            .expect("fixture is an object")
            .remove("expire_date");

        let record: LicenseRecord =
            serde_json::from_value(value).expect("Record should decode");

        assert_eq!(record.expire_date, None);
    }

    #[test]
    fn record_with_unknown_license_type_decodes() {
        let mut value = STORED_LICENSE.clone();
        value["license_type"] = serde_json::json!("2W");
        value["status"] = serde_json::json!("active");

        let record: LicenseRecord =
            serde_json::from_value(value).expect("Record should decode");

        assert_eq!(record.license_type, None);
        let now = Utc.with_ymd_and_hms(2024, 12, 28, 0, 0, 0).unwrap();
        assert_eq!(
            record.derived_status(now, &ConsoleConfig::default()),
            DerivedStatus::ExpiringSoon
        );
    }

    #[test]
    fn record_with_missing_or_non_string_license_type_decodes() {
        let mut value = STORED_LICENSE.clone();
        value["license_type"] = serde_json::json!(3);
        let record: LicenseRecord =
            serde_json::from_value(value).expect("Record should decode");
        assert_eq!(record.license_type, None);

        let mut value = STORED_LICENSE.clone();
        value
            .as_object_mut()
            .expect("fixture is an object")
            .remove("license_type");
        let record: LicenseRecord =
            serde_json::from_value(value).expect("Record should decode");
        assert_eq!(record.license_type, None);
    }

    #[test]
    fn buyer_decodes_with_sparse_fields() {
        let buyer: Buyer = serde_json::from_value(serde_json::json!({
            "name": "Lee Seoyeon",
            "created_at": "2024-03-02T10:00:00Z"
        }))
        .expect("Buyer should decode");

        assert_eq!(buyer.name, "Lee Seoyeon");
        assert_eq!(buyer.contact, "");
        assert_eq!(
            buyer.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap())
        );
    }
}
