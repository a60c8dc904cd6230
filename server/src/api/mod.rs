//! HTTP API endpoints.
//!
//! Handlers are thin: extract the portal session, translate the request
//! into a store call, and map the result onto JSON. Policy lives in
//! `swimdesk-core`; persistence and counter maintenance in
//! `swimdesk-postgres`.

pub mod admin;
pub mod assessments;
pub mod bookings;
pub mod invitations;
pub mod pos;
pub mod sessions;
pub mod swimmers;
pub mod tasks;
