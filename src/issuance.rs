//! Issuing licenses from the generation form.
//!
//! A key is generated and shown before the store write completes; when the
//! write fails the key is thrown away and the caller gets an error to
//! surface. Nothing is retried, the operator simply submits again.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{ConfigError, ConsoleConfig};
use crate::expiry::{compute_expiry, LicenseType};
use crate::listing::newest_first;
use crate::serial::generate_serial_with;
use crate::status::StatusFlag;
use crate::LicenseRecord;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StoreError {
    #[error("license store unavailable: {0}")]
    Unavailable(String),
    #[error("license store rejected the write: {0}")]
    Rejected(String),
    #[error("license `{0}` not found")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum IssuanceError {
    #[error("buyer name is required")]
    MissingBuyerName,
    #[error("invalid console config: {0}")]
    Config(#[from] ConfigError),
    #[error("license could not be saved: {0}")]
    Store(#[from] StoreError),
}

/// Fields of the license generation form, as typed by the operator.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct LicenseForm {
    pub product_id: String,
    pub license_type: LicenseType,
    pub constraint_type: String,
    pub buyer_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub channel: String,
    /// Free text; anything that is not a number is stored as 0.
    #[serde(default)]
    pub price_sold: String,
    #[serde(default)]
    pub memo: String,
}

impl LicenseForm {
    /// An empty form preselected with the console defaults.
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            product_id: config.default_product.clone(),
            license_type: config.default_license_type,
            constraint_type: config.default_constraint.clone(),
            buyer_name: String::new(),
            contact: String::new(),
            email: String::new(),
            channel: String::new(),
            price_sold: String::new(),
            memo: String::new(),
        }
    }
}

/// A license document ready to be written. The store fills in the id and
/// creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLicense {
    pub serial_key: String,
    pub product_id: String,
    pub license_type: LicenseType,
    pub constraint_type: String,
    pub buyer_name: String,
    pub contact: String,
    pub email: String,
    pub channel: String,
    pub price_sold: f64,
    pub memo: String,
    pub status: StatusFlag,
    pub bound_value: Option<String>,
    pub expire_date: DateTime<Utc>,
}

impl NewLicense {
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> LicenseRecord {
        LicenseRecord {
            id,
            serial_key: self.serial_key,
            product_id: self.product_id,
            license_type: Some(self.license_type),
            status: self.status,
            expire_date: Some(self.expire_date),
            buyer_name: self.buyer_name,
            contact: self.contact,
            email: self.email,
            channel: self.channel,
            constraint_type: self.constraint_type,
            bound_value: self.bound_value,
            price_sold: self.price_sold,
            memo: self.memo,
            created_at: Some(created_at),
        }
    }
}

/// The document store holding license records.
pub trait LicenseStore {
    /// Writes one new document and returns it as stored.
    fn create_license(&mut self, license: NewLicense) -> Result<LicenseRecord, StoreError>;

    /// Overwrites the stored status flag, e.g. to block a key.
    fn update_status(&mut self, id: &str, status: StatusFlag) -> Result<(), StoreError>;
}

fn parse_price(price: &str) -> f64 {
    price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub fn build_new_license<R: Rng>(
    form: &LicenseForm,
    config: &ConsoleConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<NewLicense, IssuanceError> {
    config.validate()?;

    if form.buyer_name.trim().is_empty() {
        return Err(IssuanceError::MissingBuyerName);
    }

    Ok(NewLicense {
        serial_key: generate_serial_with(&config.serial_prefix, rng),
        product_id: form.product_id.clone(),
        license_type: form.license_type,
        constraint_type: form.constraint_type.clone(),
        buyer_name: form.buyer_name.clone(),
        contact: form.contact.clone(),
        email: form.email.clone(),
        channel: form.channel.clone(),
        price_sold: parse_price(&form.price_sold),
        memo: form.memo.clone(),
        status: StatusFlag::Unused,
        bound_value: None,
        expire_date: compute_expiry(now, form.license_type),
    })
}

pub fn issue_license<S: LicenseStore + ?Sized>(
    store: &mut S,
    form: &LicenseForm,
    config: &ConsoleConfig,
    now: DateTime<Utc>,
) -> Result<LicenseRecord, IssuanceError> {
    issue_license_with(store, form, config, now, &mut rand::thread_rng())
}

pub fn issue_license_with<S: LicenseStore + ?Sized, R: Rng>(
    store: &mut S,
    form: &LicenseForm,
    config: &ConsoleConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<LicenseRecord, IssuanceError> {
    let license = build_new_license(form, config, now, rng)?;
    let serial_key = license.serial_key.clone();
    let license_type = license.license_type;
    debug!(serial_key = %serial_key, "Generated serial key, writing license");

    match store.create_license(license) {
        Ok(record) => {
            info!(
                id = %record.id,
                serial_key = %record.serial_key,
                product_id = %record.product_id,
                license_type = %license_type,
                "License issued"
            );
            Ok(record)
        }
        Err(e) => {
            error!(
                serial_key = %serial_key,
                error = %e,
                "Error creating license, discarding generated key"
            );
            Err(e.into())
        }
    }
}

/// In-process `LicenseStore`, for tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    licenses: Vec<LicenseRecord>,
    failure: Option<StoreError>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail with `error` until `recover` is called.
    pub fn fail_with(&mut self, error: StoreError) {
        self.failure = Some(error);
    }

    pub fn recover(&mut self) {
        self.failure = None;
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LicenseRecord> {
        self.licenses.iter().find(|record| record.id == id)
    }

    /// All licenses, newest first.
    pub fn licenses(&self) -> Vec<LicenseRecord> {
        let mut licenses = self.licenses.clone();
        newest_first(&mut licenses);
        licenses
    }

    // Creation times stay strictly increasing so newest-first ordering is total.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.licenses.iter().filter_map(|record| record.created_at).max() {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        }
    }
}

impl LicenseStore for MemoryStore {
    fn create_license(&mut self, license: NewLicense) -> Result<LicenseRecord, StoreError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let record = license.into_record(Uuid::new_v4().to_string(), self.next_created_at());
        self.licenses.push(record.clone());
        Ok(record)
    }

    fn update_status(&mut self, id: &str, status: StatusFlag) -> Result<(), StoreError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let record = self
            .licenses
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        record.status = status;
        Ok(())
    }
}
