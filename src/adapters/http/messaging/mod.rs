//! HTTP adapter for outbound messages.

mod dto;
mod handlers;
mod routes;

pub use dto::SendMessageResponse;
pub use routes::message_routes;
