use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

use super::account::ActionLogEntry;

// ==================== REQUEST ====================

/// Parsed body of `POST /api`: `{ userId, action, ...payload }`.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: String,
    pub user_id: Option<Value>,
    pub payload: Map<String, Value>,
}

impl ActionRequest {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| AppError::BadRequest("Invalid JSON format.".to_string()))?;

        let Value::Object(mut payload) = value else {
            return Err(AppError::BadRequest(
                "Request body is missing or invalid.".to_string(),
            ));
        };

        let action = match payload.remove("action") {
            Some(Value::String(action)) if !action.trim().is_empty() => action,
            _ => {
                return Err(AppError::BadRequest(
                    "Action field is required in the request body.".to_string(),
                ))
            }
        };
        let user_id = payload.remove("userId").filter(|id| !id.is_null());

        Ok(Self {
            action,
            user_id,
            payload,
        })
    }

    /// Audit record for this request; `user_id` keeps whatever the client sent.
    pub fn log_entry(&self) -> ActionLogEntry {
        ActionLogEntry {
            action: self.action.clone(),
            user_id: self.user_id.clone(),
            payload: Value::Object(self.payload.clone()),
        }
    }

    /// Telegram user id, given either as a JSON integer or a numeric string.
    pub fn user_id(&self) -> Result<i64> {
        let Some(raw) = &self.user_id else {
            return Err(AppError::Unauthorized("User ID is required.".to_string()));
        };

        let parsed = match raw {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        parsed.ok_or_else(|| AppError::BadRequest("Invalid userId.".to_string()))
    }
}

// ==================== ACTIONS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Tasks,
    AddTask,
    Swap,
    Withdraw,
    Back,
}

impl Screen {
    pub fn acknowledgement(self) -> &'static str {
        match self {
            Screen::Tasks => "Open tasks page acknowledged.",
            Screen::AddTask => "Open add task page acknowledged.",
            Screen::Swap => "Open swap page acknowledged.",
            Screen::Withdraw => "Open withdraw page acknowledged.",
            Screen::Back => "Back action acknowledged.",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Play { ticket_left: i64 },
    Collect { total_score: i64, emoji: Option<String> },
    Swap { amount: i64 },
    JoinChannel { ticket_left: i64 },
    WatchAd { ticket_left: i64, ads_left: i64 },
    Withdraw { binance_uid: String, amount: Decimal },
    JoinCommunityTask { task_name: String },
    GetStats,
    Navigate(Screen),
}

impl GameAction {
    /// Resolves an action name and its payload fields. Unknown names are a client error.
    pub fn from_request(name: &str, payload: &Map<String, Value>) -> Result<Self> {
        let action = match name {
            "play" => GameAction::Play {
                ticket_left: count_field(payload, "ticketLeft")?,
            },
            "collect" => GameAction::Collect {
                total_score: count_field(payload, "totalScore")?,
                emoji: optional_text(payload, "emoji"),
            },
            "swap" => GameAction::Swap {
                amount: swap_amount(payload)?,
            },
            "joinChannel" => GameAction::JoinChannel {
                ticket_left: count_field(payload, "ticketLeft")?,
            },
            "watchAd" => GameAction::WatchAd {
                ticket_left: count_field(payload, "ticketLeft")?,
                ads_left: count_field(payload, "adsLeft")?,
            },
            "withdraw" => GameAction::Withdraw {
                binance_uid: binance_uid(payload)?,
                amount: withdraw_amount(payload)?,
            },
            "joinCommunityTask" => GameAction::JoinCommunityTask {
                task_name: optional_text(payload, "taskName").unwrap_or_default(),
            },
            "getStats" => GameAction::GetStats,
            "openTasks" => GameAction::Navigate(Screen::Tasks),
            "openAddTask" => GameAction::Navigate(Screen::AddTask),
            "openSwap" => GameAction::Navigate(Screen::Swap),
            "openWithdraw" => GameAction::Navigate(Screen::Withdraw),
            "back" => GameAction::Navigate(Screen::Back),
            other => {
                return Err(AppError::BadRequest(format!("Unknown action: {}", other)));
            }
        };

        Ok(action)
    }
}

fn count_field(payload: &Map<String, Value>, key: &str) -> Result<i64> {
    let value = payload
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required.", key)))?;

    whole_number(value)
        .filter(|n| *n >= 0)
        .ok_or_else(|| AppError::BadRequest(format!("{} must be a non-negative integer.", key)))
}

/// Accepts `5` and `5.0`, rejects fractions and non-numbers.
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn swap_amount(payload: &Map<String, Value>) -> Result<i64> {
    payload
        .get("amount")
        .and_then(whole_number)
        .filter(|amount| *amount > 0)
        .ok_or_else(|| AppError::BadRequest("Invalid swap amount.".to_string()))
}

fn withdraw_amount(payload: &Map<String, Value>) -> Result<Decimal> {
    let parsed = match payload.get("withdrawAmount") {
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        _ => None,
    };

    parsed.ok_or_else(|| AppError::BadRequest("Invalid amount.".to_string()))
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn binance_uid(payload: &Map<String, Value>) -> Result<String> {
    let raw = payload.get("binanceUid").or_else(|| payload.get("binanceId"));
    let uid = match raw {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    if uid.is_empty() {
        return Err(AppError::BadRequest("Binance UID is required.".to_string()));
    }
    Ok(uid)
}

fn optional_text(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

// ==================== RESPONSE ====================

/// `{ ok: true, message, ...fields }`
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ActionResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }
}
