//! Read side of the license list: ordering, search and per-row status.

use chrono::{DateTime, Utc};
use serde_derive::Serialize;

use crate::config::ConsoleConfig;
use crate::status::DerivedStatus;
use crate::{Buyer, LicenseRecord};

const EXPIRY_DATE_FORMAT: &str = "%Y.%m.%d";

/// Documents ordered by their store-assigned creation time.
pub trait CreatedAt {
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl CreatedAt for LicenseRecord {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl CreatedAt for Buyer {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl<T: CreatedAt> CreatedAt for &T {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        (*self).created_at()
    }
}

/// Sorts newest first; documents still missing a creation time go last.
pub fn newest_first<T: CreatedAt>(items: &mut [T]) {
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// Case-insensitive substring match on buyer name or serial key.
pub fn matches_search(record: &LicenseRecord, term: &str) -> bool {
    let term = term.to_lowercase();
    record.buyer_name.to_lowercase().contains(&term)
        || record.serial_key.to_lowercase().contains(&term)
}

pub fn format_expiry(expire_date: Option<DateTime<Utc>>) -> String {
    match expire_date {
        Some(expire_date) => expire_date.format(EXPIRY_DATE_FORMAT).to_string(),
        None => "-".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseRow<'a> {
    pub record: &'a LicenseRecord,
    pub status: DerivedStatus,
    pub expires: String,
}

pub fn license_rows<'a>(
    records: &'a [LicenseRecord],
    term: &str,
    now: DateTime<Utc>,
    config: &ConsoleConfig,
) -> Vec<LicenseRow<'a>> {
    let mut matching: Vec<&LicenseRecord> = records
        .iter()
        .filter(|record| matches_search(record, term))
        .collect();
    newest_first(&mut matching);

    matching
        .into_iter()
        .map(|record| LicenseRow {
            record,
            status: record.derived_status(now, config),
            expires: format_expiry(record.expire_date),
        })
        .collect()
}
