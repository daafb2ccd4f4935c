//! HTTP adapter for the caller identity and API-key administration.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ApiKeyListResponse, IssueApiKeyRequest, IssueApiKeyResponse, PrincipalResponse,
    UpdateApiKeyRequest, ValidityInput,
};
pub use routes::access_routes;
