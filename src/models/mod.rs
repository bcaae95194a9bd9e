pub mod transactionmodel;
pub mod usermodel;
pub mod websitemodel;
