//! Application services: settings cache, page assembly and spam checks.

pub mod error;
pub mod page;
pub mod repos;
pub mod settings;
pub mod spam;
