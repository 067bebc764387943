use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde_derive::{Deserialize, Serialize};

/// Days before expiry at which an activated license is flagged as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// The persisted status flag of a license.
///
/// Flags outside the known set are kept verbatim so that a record written by
/// another tool round-trips unchanged.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum StatusFlag {
    Unused,
    Active,
    Used,
    Blocked,
    Other(String),
}

impl StatusFlag {
    pub fn as_str(&self) -> &str {
        match self {
            StatusFlag::Unused => "unused",
            StatusFlag::Active => "active",
            StatusFlag::Used => "used",
            StatusFlag::Blocked => "blocked",
            StatusFlag::Other(flag) => flag,
        }
    }
}

impl From<String> for StatusFlag {
    fn from(flag: String) -> Self {
        match flag.as_str() {
            "unused" => StatusFlag::Unused,
            "active" => StatusFlag::Active,
            "used" => StatusFlag::Used,
            "blocked" => StatusFlag::Blocked,
            _ => StatusFlag::Other(flag),
        }
    }
}

impl From<StatusFlag> for String {
    fn from(flag: StatusFlag) -> Self {
        match flag {
            StatusFlag::Other(flag) => flag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display status computed at read time.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStatus {
    Suspended,
    Expired,
    Pending,
    ExpiringSoon,
    InUse,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Danger,
    Muted,
    Info,
    Warning,
    Success,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Danger => "danger",
            Severity::Muted => "muted",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Success => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    English,
    Korean,
}

impl DerivedStatus {
    pub fn label(self) -> &'static str {
        self.label_in(Locale::English)
    }

    pub fn label_in(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::English, DerivedStatus::Suspended) => "suspended",
            (Locale::English, DerivedStatus::Expired) => "expired",
            (Locale::English, DerivedStatus::Pending) => "pending",
            (Locale::English, DerivedStatus::ExpiringSoon) => "expiring soon",
            (Locale::English, DerivedStatus::InUse) => "in use",
            (Locale::Korean, DerivedStatus::Suspended) => "정지",
            (Locale::Korean, DerivedStatus::Expired) => "만료",
            (Locale::Korean, DerivedStatus::Pending) => "대기중",
            (Locale::Korean, DerivedStatus::ExpiringSoon) => "만료 예정",
            (Locale::Korean, DerivedStatus::InUse) => "사용중",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DerivedStatus::Suspended => Severity::Danger,
            DerivedStatus::Expired => Severity::Muted,
            DerivedStatus::Pending => Severity::Info,
            DerivedStatus::ExpiringSoon => Severity::Warning,
            DerivedStatus::InUse => Severity::Success,
        }
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derives the display status with the default seven-day expiring-soon window.
///
/// `expire_at` is `None` when the stored expiry is missing or unreadable; the
/// expiry-dependent rules are skipped in that case.
pub fn derive_status(
    stored: &StatusFlag,
    expire_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DerivedStatus {
    derive_status_with_window(stored, expire_at, now, Duration::days(EXPIRING_SOON_DAYS))
}

/// Rules are checked in order and the first match wins: a block beats
/// everything, a passed expiry beats the remaining flags, and an unused key
/// reads as pending even inside the expiring-soon window.
pub fn derive_status_with_window(
    stored: &StatusFlag,
    expire_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> DerivedStatus {
    if *stored == StatusFlag::Blocked {
        return DerivedStatus::Suspended;
    }

    if let Some(expire_at) = expire_at {
        if expire_at < now {
            return DerivedStatus::Expired;
        }
    }

    match stored {
        StatusFlag::Unused => DerivedStatus::Pending,
        StatusFlag::Active | StatusFlag::Used => match expire_at {
            Some(expire_at) if expire_at - now <= window => DerivedStatus::ExpiringSoon,
            _ => DerivedStatus::InUse,
        },
        _ => DerivedStatus::InUse,
    }
}
