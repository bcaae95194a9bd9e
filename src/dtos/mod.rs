pub mod exchangedtos;
pub mod userdtos;
pub mod websitedtos;
