pub mod counters;
pub mod decisions;
pub mod error;
pub mod pagination;
pub mod repos;
