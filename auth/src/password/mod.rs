//! Password hashing for stored credentials (Argon2id).

pub mod argon2;
pub mod errors;

pub use argon2::PasswordHasher;
pub use errors::PasswordError;
