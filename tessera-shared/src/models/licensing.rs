use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pii::Masked;

// ============================================================================
// Inbound order
// ============================================================================

/// A license order as received from the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub ordered_licenses: Vec<OrderedLicense>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderedLicense {
    #[serde(default)]
    pub sku: String,
    pub count: i64,
}

impl OrderedLicense {
    pub fn new(sku: impl Into<String>, count: i64) -> Self {
        Self { sku: sku.into(), count }
    }
}

// ============================================================================
// Provider records
// ============================================================================

/// A company as listed by the provider for a country
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub company_id: String,
    #[serde(default)]
    pub company_name: String,
}

/// Login, contact and entitlements of a single company
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub login: Masked<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub licenses: Vec<License>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
}

/// An entitled SKU and the maximum quantity the company may order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub sku: String,
    pub count: i64,
}

impl License {
    pub fn new(sku: impl Into<String>, count: i64) -> Self {
        Self { sku: sku.into(), count }
    }
}

/// Unit price of a SKU. Negative prices are credits, not errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkuPricing {
    pub sku: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
}

// ============================================================================
// Submission
// ============================================================================

/// A priced, deduplicated line of the submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderedLicenseResult {
    pub sku: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub sum: Decimal,
}

/// The payload submitted back to the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    pub company_id: String,
    pub company_name: String,
    pub user_login: Masked<String>,
    pub user_name: String,
    pub ordered_license: Vec<OrderedLicenseResult>,
}

/// The provider's raw answer to a submission, passed through untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResultResponse(String);

impl SubmitResultResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn body(&self) -> &str {
        &self.0
    }

    pub fn into_body(self) -> String {
        self.0
    }
}
