//! Interceptor that gates the protected service.

use std::sync::Arc;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::trace;

use crate::auth::{AuthGate, AuthResult, AuthenticatedIdentity, ErrorResponse, RejectReason};
use crate::clock::Clock;

/// Metadata key carrying the token.
pub const AUTHORIZATION: &str = "authorization";

/// Runs the [`AuthGate`] before every call to the wrapped service.
///
/// On success the resolved [`AuthenticatedIdentity`] is inserted into the
/// request extensions; on rejection the call is answered with the mapped
/// error and the handler never runs.
#[derive(Clone, Debug)]
pub struct AuthInterceptor {
    gate: AuthGate,
    clock: Arc<dyn Clock>,
}

impl AuthInterceptor {
    pub fn new(gate: AuthGate, clock: Arc<dyn Clock>) -> Self {
        Self { gate, clock }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let result = match request.metadata().get(AUTHORIZATION) {
            None => self.gate.authenticate(None, self.clock.now()),
            Some(value) => match value.to_str() {
                Ok(raw) => self.gate.authenticate(Some(raw), self.clock.now()),
                // Present but not printable ASCII.
                Err(_) => AuthResult::Rejected {
                    reason: RejectReason::InvalidCredential,
                },
            },
        };

        match result {
            AuthResult::Authenticated { identity } => {
                trace!(identity = %identity, "Attaching identity to request");
                request
                    .extensions_mut()
                    .insert(AuthenticatedIdentity(identity));
                Ok(request)
            }
            AuthResult::Rejected { reason } => Err(ErrorResponse::for_reason(reason).to_status()),
        }
    }
}

/// Identity attached by [`AuthInterceptor`].
///
/// A handler reached without one is refused rather than served anonymously.
pub fn authenticated_identity<T>(request: &Request<T>) -> Result<String, Status> {
    request
        .extensions()
        .get::<AuthenticatedIdentity>()
        .map(|identity| identity.as_str().to_owned())
        .ok_or_else(|| ErrorResponse::for_reason(RejectReason::MissingCredential).to_status())
}
