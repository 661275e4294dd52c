//! Shared test harness.
//!
//! Each test gets an isolated server over in-memory SQLite stores and
//! scripted provider clients, spawned on an ephemeral port.
#![allow(dead_code)]

pub mod client;
pub mod constants;
pub mod fixtures;
pub mod server;

pub use client::TestClient;
pub use constants::*;
pub use fixtures::StubProvider;
pub use server::TestServer;
