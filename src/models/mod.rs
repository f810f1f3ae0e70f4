// src/models/mod.rs
pub mod account;
pub mod action;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use account::{AccountPatch, ActionLogEntry, BalanceGuard, UserAccount};
pub use action::{ActionRequest, ActionResponse, GameAction};
