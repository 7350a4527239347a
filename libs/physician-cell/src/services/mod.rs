pub mod memory;
pub mod physician;
pub mod schedule;
pub mod store;
