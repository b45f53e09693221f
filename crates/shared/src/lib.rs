pub mod domain;
pub mod error;
pub mod projection;
pub mod protocol;
pub mod units;
