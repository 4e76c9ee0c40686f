pub mod luhn;
mod password;

pub use password::{hash_password, verify_password, PasswordHashError};
