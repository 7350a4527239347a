pub mod availability;
pub mod booking;
pub mod memory;
pub mod store;
pub mod summary;
