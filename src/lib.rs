//! Smitten records directional like/pass decisions between identities
//! and answers three queries over that ledger: who liked a recipient,
//! who liked them without reciprocation, and how many likers they have.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
