//! Normalized record types returned by the source adapters
//!
//! Each external response shape gets its own type. Required fields are plain
//! fields so a response missing them fails to decode; optional fields are
//! `Option` and render as empty strings in the output.

use chrono::NaiveDate;
use serde::Deserialize;

/// Reference type under which the payment-order API records the Increase transfer id
pub const TRANSFER_ID_REFERENCE_TYPE: &str = "bnk_dev_transfer_id";

// ============================================================================
// Payment orders
// ============================================================================

/// One payment order from a payroll run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    /// Minor units (cents)
    pub amount: i64,
    pub direction: String,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reference_numbers: Vec<ReferenceNumber>,
}

/// External reference attached to a payment order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceNumber {
    pub reference_number: String,
    pub reference_number_type: String,
}

impl PaymentOrder {
    /// First reference of the given type, in the order the API returned them
    pub fn reference(&self, reference_type: &str) -> Option<&str> {
        self.reference_numbers
            .iter()
            .find(|r| r.reference_number_type == reference_type)
            .map(|r| r.reference_number.as_str())
    }
}

// ============================================================================
// Increase
// ============================================================================

/// ACH transfer as reported by Increase
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AchTransfer {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ============================================================================
// Entity graph (GraphQL)
// ============================================================================

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

/// Employer business information
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employer {
    pub id: String,
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    pub ein: Option<String>,
    pub entity_type: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub address: Option<Address>,
}

/// Worker personal information
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub employer_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub employment_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub address: Option<Address>,
}

/// Employer identity as returned alongside its workers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerSummary {
    pub id: String,
    pub legal_name: Option<String>,
}

/// Employer with its full worker roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployerWithWorkers {
    pub employer: EmployerSummary,
    pub workers: Vec<Worker>,
}

// ============================================================================
// Graph database
// ============================================================================

/// Linked bank account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BankAccount {
    pub id: String,
    pub bank_name: Option<String>,
    pub account_type: Option<String>,
    pub routing_number: Option<String>,
    pub account_number_last4: Option<String>,
    pub status: Option<String>,
}

/// Person who approved a bank-account link, with the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Authorizer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub authorized_at: Option<String>,
}
