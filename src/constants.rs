//! Application constants

use rust_decimal::Decimal;

// Tables
pub const DEFAULT_USERS_TABLE: &str = "users";
pub const DEFAULT_ACTIONS_LOG_TABLE: &str = "actions_log";

// Starting allowances for a freshly created account
pub const DEFAULT_TOTAL_SCORE: i64 = 0;
pub const DEFAULT_TICKET_LEFT: i64 = 5;
pub const DEFAULT_ADS_LEFT: i64 = 300;

// Swap: 200_000 score = 0.01 USDT
pub const MIN_SWAP_SCORE: i64 = 200_000;

/// USDT credited per score unit (5e-8).
pub fn usdt_per_score() -> Decimal {
    Decimal::new(5, 8)
}

/// Smallest withdrawal accepted (0.03 USDT).
pub fn min_withdraw_usdt() -> Decimal {
    Decimal::new(3, 2)
}

// Display precision of the USDT balance in stats
pub const USDT_DISPLAY_DECIMALS: usize = 6;
