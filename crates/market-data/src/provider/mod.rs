//! Gateway abstraction and implementations.

mod http;
mod rate_limiter;
mod traits;

pub use http::HttpQuoteGateway;
pub use rate_limiter::{RateLimitConfig, RateLimitedGateway, TokenBucket};
pub use traits::QuoteGateway;
