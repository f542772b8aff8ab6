// Authentication module
// Validates bearer tokens issued by the identity service

pub mod error;
pub mod middleware;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::AuthenticatedUser;
pub use token::{Claims, TokenService};
