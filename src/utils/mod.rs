pub mod jwt;
pub mod password;

pub use jwt::{decode_token, encode_token};
pub use password::{hash_password, secrets_match, verify_password};
