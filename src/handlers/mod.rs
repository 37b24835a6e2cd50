pub mod auth;
pub mod listing;
pub mod saved;
pub mod user;
pub mod verification;
