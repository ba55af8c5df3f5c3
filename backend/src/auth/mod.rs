pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::{bearer_token, AuthUser};
pub use jwt::{decode_token, issue_token, Claims};
pub use password::{hash_password, verify_password};
