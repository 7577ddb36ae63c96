//! Library crate for quizbolt-back, exposing modules for the binary and
//! integration tests.

pub mod collab;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
