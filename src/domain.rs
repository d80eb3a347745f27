//! Domain types shared across the extraction pipeline.

pub mod identity;
pub mod record;
