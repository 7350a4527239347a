pub mod auth;
pub mod error;
pub mod patch;
pub mod time;

pub use time::ClockTime;
