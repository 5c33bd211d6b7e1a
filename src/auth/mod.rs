//! Authentication gate, credential lookup and error mapping.
//!
//! Every protected call goes through [`AuthGate::authenticate`], which yields
//! an [`AuthResult`]. Rejections are translated to wire errors in exactly one
//! place, [`ErrorResponse`].

mod credentials;
mod gate;
mod responder;

pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use gate::{AuthGate, AuthResult, AuthenticatedIdentity, RejectReason};
pub use responder::{ErrorCategory, ErrorResponse};
