// src/api/mod.rs
pub mod actions;
pub mod health;

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AccountService, ActionLogger};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub audit: ActionLogger,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            accounts: AccountService::new(store.clone()),
            audit: ActionLogger::new(store),
            config,
        }
    }
}
