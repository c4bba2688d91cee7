//! Request and Response models for the host HTTP surface
//!
//! DTOs serialized to and from JSON request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::SetRequest;
pub use responses::{
    DeleteResponse, GetResponse, HealthResponse, HistoryResponse, SetResponse, StatsResponse,
};
