pub mod account_service;
pub mod action_logger;
pub mod mutation;

pub use account_service::AccountService;
pub use action_logger::ActionLogger;
