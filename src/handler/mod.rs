pub mod auth;
pub mod exchange;
pub mod snapshot;
pub mod users;
pub mod websites;
