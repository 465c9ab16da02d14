//! Settings cache and page aggregation layer for the Tessera CMS frontend.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
