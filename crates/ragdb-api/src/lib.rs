//! HTTP front door: greetings, user registration and question answering.

mod error;
mod handlers;
mod router;
mod server;
pub mod user;

pub use error::{ApiError, FieldError, ServeError};
pub use router::build_router;
pub use server::{ApiServer, AppState};
