pub mod property;
pub mod traits;
pub mod user;

pub use property::SqlitePropertyRepository;
pub use traits::{PropertyRepository, UserRepository};
pub use user::SqliteUserRepository;
