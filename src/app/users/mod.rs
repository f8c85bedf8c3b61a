//! 用户管理

pub mod handler;
pub mod model;
pub mod query;
pub mod store;
pub mod validation;

pub use model::{NewUser, User, UserChanges};
pub use store::UserStore;
