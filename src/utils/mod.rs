pub mod code;
pub mod cursor;
pub mod identity;

pub use code::{codes_match, generate_verification_code};
pub use cursor::ListingCursor;
pub use identity::{decode_identity_token, IdentityClaims};
