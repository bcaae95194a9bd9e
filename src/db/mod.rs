pub mod db;
pub mod snapshot;
pub mod transactiondb;
pub mod userdb;
pub mod websitedb;
