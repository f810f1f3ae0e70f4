use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    constants::{min_withdraw_usdt, usdt_per_score, MIN_SWAP_SCORE, USDT_DISPLAY_DECIMALS},
    error::{AppError, Result},
    models::*,
};

/// What an action does to an account: the fields to write, the balances that must still
/// hold when writing, and the reply for the client.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub patch: AccountPatch,
    pub guard: Option<BalanceGuard>,
    pub response: ActionResponse,
}

impl Outcome {
    fn reply(response: ActionResponse) -> Self {
        Self {
            patch: AccountPatch::default(),
            guard: None,
            response,
        }
    }
}

/// USDT credited for `score` points.
pub fn score_to_usdt(score: i64) -> Decimal {
    Decimal::from(score) * usdt_per_score()
}

/// Computes the outcome of `action` against the current `account`. Nothing is written here.
pub fn apply(account: &UserAccount, action: &GameAction) -> Result<Outcome> {
    let outcome = match action {
        GameAction::Play { ticket_left } => Outcome {
            patch: AccountPatch {
                ticket_left: Some(*ticket_left),
                ..Default::default()
            },
            guard: None,
            response: ActionResponse::message("Game start signal acknowledged.")
                .with("ticketLeft", json!(ticket_left)),
        },
        GameAction::Collect { total_score, emoji } => {
            let message = match emoji {
                Some(emoji) => format!("Collected {}, new score: {}.", emoji, total_score),
                None => format!("New score: {}.", total_score),
            };
            Outcome {
                patch: AccountPatch {
                    total_score: Some(*total_score),
                    ..Default::default()
                },
                guard: None,
                response: ActionResponse::message(message).with("totalScore", json!(total_score)),
            }
        }
        GameAction::Swap { amount } => swap(account, *amount)?,
        GameAction::JoinChannel { ticket_left } => Outcome {
            patch: AccountPatch {
                ticket_left: Some(*ticket_left),
                is_joined: Some(true),
                ..Default::default()
            },
            guard: None,
            response: ActionResponse::message(format!(
                "Joined channel and updated tickets to {}.",
                ticket_left
            ))
            .with("ticketLeft", json!(ticket_left)),
        },
        GameAction::WatchAd {
            ticket_left,
            ads_left,
        } => Outcome {
            patch: AccountPatch {
                ticket_left: Some(*ticket_left),
                ads_left: Some(*ads_left),
                ..Default::default()
            },
            guard: None,
            response: ActionResponse::message(format!(
                "Watched ad, tickets: {}, ads left: {}.",
                ticket_left, ads_left
            ))
            .with("ticketLeft", json!(ticket_left))
            .with("adsLeft", json!(ads_left)),
        },
        GameAction::Withdraw {
            binance_uid,
            amount,
        } => withdraw(account, binance_uid, *amount)?,
        GameAction::JoinCommunityTask { task_name } => Outcome::reply(ActionResponse::message(
            format!("Joined community task: {}.", task_name),
        )),
        GameAction::GetStats => Outcome::reply(stats(account)),
        GameAction::Navigate(screen) => {
            Outcome::reply(ActionResponse::message(screen.acknowledgement()))
        }
    };

    Ok(outcome)
}

fn swap(account: &UserAccount, amount: i64) -> Result<Outcome> {
    if amount < MIN_SWAP_SCORE {
        return Err(AppError::BadRequest(format!(
            "Minimum swap is {} score.",
            MIN_SWAP_SCORE
        )));
    }
    if amount > account.total_score {
        return Err(AppError::BadRequest(
            "Insufficient score for this swap.".to_string(),
        ));
    }

    let new_score = account.total_score - amount;
    let new_usdt = (account.usdt_balance + score_to_usdt(amount)).normalize();

    Ok(Outcome {
        patch: AccountPatch {
            total_score: Some(new_score),
            usdt_balance: Some(new_usdt),
            ..Default::default()
        },
        guard: Some(BalanceGuard {
            total_score: Some(account.total_score),
            usdt_balance: Some(account.usdt_balance),
        }),
        response: ActionResponse::message(format!("Swapped {} score for USDT.", amount))
            .with("newScore", json!(new_score))
            .with("newUsdt", json!(new_usdt)),
    })
}

fn withdraw(account: &UserAccount, binance_uid: &str, amount: Decimal) -> Result<Outcome> {
    if amount < min_withdraw_usdt() {
        return Err(AppError::BadRequest(format!(
            "Invalid amount. Minimum withdrawal is {} USDT.",
            min_withdraw_usdt()
        )));
    }
    if amount > account.usdt_balance {
        return Err(AppError::BadRequest("Insufficient USDT balance.".to_string()));
    }

    let new_usdt = (account.usdt_balance - amount).normalize();

    Ok(Outcome {
        patch: AccountPatch {
            usdt_balance: Some(new_usdt),
            binance_uid: Some(binance_uid.to_string()),
            ..Default::default()
        },
        guard: Some(BalanceGuard {
            total_score: None,
            usdt_balance: Some(account.usdt_balance),
        }),
        response: ActionResponse::message(format!(
            "Withdrawal of {} USDT requested to Binance UID {}.",
            amount.normalize(),
            binance_uid
        ))
        .with("newUsdt", json!(new_usdt))
        .with("binanceUid", json!(binance_uid)),
    })
}

fn stats(account: &UserAccount) -> ActionResponse {
    ActionResponse::message("Stats loaded.")
        .with("totalScore", json!(account.total_score))
        .with("ticketLeft", json!(account.ticket_left))
        .with(
            "usdt",
            json!(format!(
                "{:.*}",
                USDT_DISPLAY_DECIMALS, account.usdt_balance
            )),
        )
        .with("adsLeft", json!(account.ads_left))
        .with("joined", json!(account.is_joined))
        .with("binanceUid", json!(account.binance_uid))
}
