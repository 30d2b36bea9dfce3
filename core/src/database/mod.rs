pub mod identifier;
pub mod memory;
pub mod postgres;
pub mod store;
