pub mod anonymity;
pub mod format;
