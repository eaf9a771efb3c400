pub mod server;
pub mod pages;
pub mod state;
pub mod poller;

pub use server::*;
pub use state::*;
pub use poller::*;
