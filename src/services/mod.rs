pub mod cache;
pub mod email;
pub mod listing;
pub mod saved;
pub mod store;
pub mod user;
pub mod verification;
