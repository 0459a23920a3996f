pub mod decisions;
pub mod error;
