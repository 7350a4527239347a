pub mod memory;
pub mod patient;
pub mod store;
