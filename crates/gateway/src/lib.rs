pub mod cookie;
pub mod rate_limiter;
pub mod single_flight;
pub mod trusted_proxy;

pub use cookie::{CookieAttributes, CookieSessionCodec, CookieSessionConfig, SameSite};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use single_flight::SingleFlight;
pub use trusted_proxy::{CidrBlock, TrustedProxyResolver};
