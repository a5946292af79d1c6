//! Chat users and the registry of online users.

pub mod holder;
pub mod model;

pub use holder::UsersHolder;
pub use model::{ChatUser, LastMessaged, UserState};
