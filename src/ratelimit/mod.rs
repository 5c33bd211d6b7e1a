//! Per-identity sliding-window rate limiting.

mod limiter;
mod window;

pub use limiter::{Decision, RateLimiter};
pub use window::RateWindow;
