pub mod domain;
pub mod token;
