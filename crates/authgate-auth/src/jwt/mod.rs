//! Session token issuance and verification.

pub mod claims;
pub mod issuer;

pub use claims::Claims;
pub use issuer::{IssuedToken, TokenIssuer};
