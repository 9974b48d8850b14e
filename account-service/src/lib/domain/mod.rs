pub mod social;
pub mod user;
