//! Session and secure service implementations.

use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info, instrument};

use super::interceptor::authenticated_identity;
use super::messages::{
    GreetRequest, GreetResponse, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse,
    StatusRequest, StatusResponse,
};
use super::proto::secure_server::Secure;
use super::proto::session_server::Session;
use crate::auth::{AuthGate, ErrorResponse};
use crate::clock::Clock;

/// Login and liveness endpoints. Not gated.
#[derive(Debug)]
pub struct SessionService {
    gate: AuthGate,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(gate: AuthGate, clock: Arc<dyn Clock>) -> Self {
        Self { gate, clock }
    }
}

#[tonic::async_trait]
impl Session for SessionService {
    /// Exchange `{username, password}` for a token.
    #[instrument(skip(self, request), fields(username = %request.get_ref().username))]
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        match self
            .gate
            .login(&req.username, &req.password, self.clock.now())
            .await
        {
            Some(token) => Ok(Response::new(LoginResponse {
                token: token.into_string(),
                status: "ok".to_string(),
            })),
            None => Err(ErrorResponse::invalid_login().to_status()),
        }
    }

    /// Liveness check.
    async fn status(
        &self,
        _request: Request<StatusRequest>,
    ) -> Result<Response<StatusResponse>, Status> {
        debug!("Status check");
        Ok(Response::new(StatusResponse {
            status: "API is running".to_string(),
        }))
    }
}

/// Protected endpoints. Only reachable through
/// [`AuthInterceptor`](super::AuthInterceptor).
#[derive(Debug, Default)]
pub struct SecureService;

impl SecureService {
    pub fn new() -> Self {
        Self
    }
}

#[tonic::async_trait]
impl Secure for SecureService {
    #[instrument(skip(self, request))]
    async fn greet(
        &self,
        request: Request<GreetRequest>,
    ) -> Result<Response<GreetResponse>, Status> {
        let identity = authenticated_identity(&request)?;

        Ok(Response::new(GreetResponse {
            message: format!("Hello, {}! You have accessed a secure endpoint.", identity),
        }))
    }

    /// Tokens are stateless; logging out only acknowledges the caller.
    #[instrument(skip(self, request))]
    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let identity = authenticated_identity(&request)?;
        info!(identity = %identity, "Logout");

        Ok(Response::new(LogoutResponse {
            message: format!("Goodbye, {}!", identity),
        }))
    }
}
