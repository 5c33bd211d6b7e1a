//! Signed, time-limited identity tokens.

mod codec;
mod key;

pub use codec::{Token, TokenCodec, VerifyError};
pub use key::{SigningKey, MIN_KEY_BYTES};
