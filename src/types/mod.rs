pub mod strategy;
pub mod dashboard;
pub mod api_key;

pub use strategy::*;
pub use dashboard::*;
pub use api_key::*;
