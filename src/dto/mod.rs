//! Request/response payloads for the REST surface.

pub mod admin;
pub mod player;
