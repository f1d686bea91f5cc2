//! Persistence layer: account records and the store contract the session
//! logic is written against.

pub mod models;
pub mod operations;

pub use models::{NewUser, ProfileChanges, PublicUser, User, UserRole};
pub use operations::{PgUserStore, UserStore};

#[cfg(test)]
pub use operations::MockUserStore;
