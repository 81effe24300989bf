//! Account data models for regions and users.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Regions keyed by short code (`HN`, `HCM`, ...).
pub type RegionMap = BTreeMap<String, Region>;

/// A Bizfly region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    /// Icon URL.
    #[serde(default)]
    pub icon: String,
    /// Human-readable name.
    #[serde(default, rename = "region_name")]
    pub name: String,
    /// Short code used for endpoint selection.
    #[serde(default)]
    pub short_name: String,
    /// Availability zones within the region.
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// An availability zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Zone {
    /// Icon URL.
    #[serde(default)]
    pub icon: String,
    /// Zone name.
    #[serde(default)]
    pub name: String,
    /// Short code.
    #[serde(default)]
    pub short_name: String,
}

/// Profile of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    /// Login name.
    pub username: String,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Account type (personal, business).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    /// Billing account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_acc_id: Option<String>,
    /// Current balance.
    #[serde(default)]
    pub billing_balance: f64,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub verified_email: bool,
    /// Whether the phone number has been verified.
    #[serde(default)]
    pub verified_phone: bool,
    /// Domains the user belongs to.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Default project for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project_id: Option<String>,
}
