//! Service layer between the HTTP routes and the persisted document.

pub mod admin_service;
pub mod player_service;
pub mod runtime;
