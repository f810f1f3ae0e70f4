use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADS_LEFT, DEFAULT_TICKET_LEFT, DEFAULT_TOTAL_SCORE};

// ==================== ACCOUNT ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub total_score: i64,
    pub ticket_left: i64,
    pub usdt_balance: Decimal,
    pub ads_left: i64,
    pub is_joined: bool,
    pub binance_uid: Option<String>,
}

impl UserAccount {
    /// Record inserted on first contact with a user id.
    pub fn with_defaults(id: i64) -> Self {
        Self {
            id,
            total_score: DEFAULT_TOTAL_SCORE,
            ticket_left: DEFAULT_TICKET_LEFT,
            usdt_balance: Decimal::ZERO,
            ads_left: DEFAULT_ADS_LEFT,
            is_joined: false,
            binance_uid: None,
        }
    }
}

/// Partial update; only the `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usdt_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ads_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_joined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binance_uid: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        *self == AccountPatch::default()
    }
}

/// Balance values the row must still hold for a conditional update to apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceGuard {
    pub total_score: Option<i64>,
    pub usdt_balance: Option<Decimal>,
}

impl BalanceGuard {
    /// PostgREST equality filters, e.g. `("total_score", "eq.500000")`.
    pub fn filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(score) = self.total_score {
            filters.push(("total_score", format!("eq.{}", score)));
        }
        if let Some(usdt) = self.usdt_balance {
            filters.push(("usdt_balance", format!("eq.{}", usdt.normalize())));
        }
        filters
    }
}

// ==================== ACTION LOG ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub action: String,
    pub user_id: Option<serde_json::Value>,
    pub payload: serde_json::Value,
}
