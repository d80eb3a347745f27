//! Infrastructure: session contract, extraction, pagination and supervision.

pub mod config;
pub mod crawler;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pagination;
pub mod session;
pub mod supervisor;
