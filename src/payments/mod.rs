pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod service;
pub mod webhook;

pub use error::*;
pub use gateway::*;
pub use handlers::*;
pub use models::*;
pub use service::*;
pub use webhook::*;
