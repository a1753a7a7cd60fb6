//! Domain entities.

mod patch;
mod user;

pub use patch::Patch;
pub use user::{NewUser, User, UserPatch};
