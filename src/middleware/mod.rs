/// Middleware module
///
/// Bearer token authentication and per-request logging.

mod jwt_middleware;
mod logger;

pub use jwt_middleware::JwtMiddleware;
pub use logger::LoggerMiddleware;
