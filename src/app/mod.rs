//! 应用层

pub mod state;
pub mod system;
pub mod users;

pub use state::AppState;
