//! Portal authentication extractors.
//!
//! Authentication flows live in the managed identity provider; this module
//! only resolves bearer tokens into portal sessions and enforces role
//! requirements at handler boundaries.

pub mod middleware;

pub use middleware::{BearerToken, RequireAdmin, RequireStaff, SessionUser};
