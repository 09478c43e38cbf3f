//! Authoritative server for two-player laser chess over WebSockets.

pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;
