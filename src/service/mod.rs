pub mod analysis_service;
pub mod bootstrap;
pub mod error;
pub mod exchange_service;
pub mod google_oauth;
pub mod verification_service;
pub mod website_service;
