//! gRPC surface of the gateway.
//!
//! - `gatekeeper.v1.Session`: `Login` and `Status`, open to everyone.
//! - `gatekeeper.v1.Secure`: `Greet` and `Logout`, behind [`AuthInterceptor`].

mod interceptor;
pub mod messages;
mod server;
mod service;

pub use interceptor::{authenticated_identity, AuthInterceptor, AUTHORIZATION};
pub use server::{spawn_window_sweeper, GatewayServer};
pub use service::{SecureService, SessionService};

// Include the generated service stubs
pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/gatekeeper.v1.Session.rs"));
    include!(concat!(env!("OUT_DIR"), "/gatekeeper.v1.Secure.rs"));
}

// Re-export commonly used types
pub use proto::secure_server::SecureServer;
pub use proto::session_server::SessionServer;
