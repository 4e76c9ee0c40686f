//! Value types shared between the Gophermart engine and server.
mod amount;
mod secret;

pub use amount::{Amount, AmountConversionError};
pub use secret::Secret;
