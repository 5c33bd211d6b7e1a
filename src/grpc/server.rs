//! gRPC server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tonic::transport::Server;
use tracing::{error, info};

use super::interceptor::AuthInterceptor;
use super::proto::secure_server::SecureServer;
use super::proto::session_server::SessionServer;
use super::service::{SecureService, SessionService};
use crate::auth::AuthGate;
use crate::clock::Clock;
use crate::error::{GatekeeperError, Result};
use crate::ratelimit::RateLimiter;

/// gRPC server exposing the session and secure services.
pub struct GatewayServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Gate shared by the login endpoint and the interceptor
    gate: AuthGate,
    /// Time source for issuance and gating
    clock: Arc<dyn Clock>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(addr: SocketAddr, gate: AuthGate, clock: Arc<dyn Clock>) -> Self {
        Self { addr, gate, clock }
    }

    /// Start the gRPC server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let session = SessionService::new(self.gate.clone(), Arc::clone(&self.clock));
        let interceptor = AuthInterceptor::new(self.gate, self.clock);

        info!(addr = %self.addr, "Starting gRPC server for Session and Secure services");

        Server::builder()
            .add_service(SessionServer::new(session))
            .add_service(SecureServer::with_interceptor(SecureService::new(), interceptor))
            .serve_with_shutdown(self.addr, signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                GatekeeperError::Grpc(e)
            })
    }
}

/// Periodically drop rate windows with no live entries.
pub fn spawn_window_sweeper(
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            limiter.purge_idle(clock.now());
        }
    })
}
