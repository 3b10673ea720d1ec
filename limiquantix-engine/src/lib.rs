//! # limiquantix Engine Client
//!
//! Typed client for a virtualization management engine.
//!
//! This crate provides one interface over two backends:
//! - **REST** (primary) - talks JSON over HTTP to a live engine, with retries
//! - **Mock** - in-memory store enforcing the engine's referential integrity
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           EngineClient Trait            │
//! │  (templates, vms, nics, vnic profiles,  │
//! │              networks)                  │
//! └─────────────────────┬───────────────────┘
//!                       │
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │    RestBackend    │     │    MockBackend    │
//! │ (retry + reqwest) │     │ (Mutex<MockStore>)│
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use limiquantix_engine::{connect, BackendKind, EngineClient, EngineConfig};
//! use limiquantix_engine::params::CreateNicParams;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = EngineConfig { backend: BackendKind::Mock, ..Default::default() };
//!     let client = connect(&config).unwrap();
//!
//!     let blank = client.get_blank_template(&[]).await.unwrap();
//!     let vm = client.create_vm(blank.id(), "web-01", Default::default(), &[]).await.unwrap();
//!     let profile = client.list_vnic_profiles(&[]).await.unwrap().remove(0);
//!     vm.create_nic(client.as_ref(), "eth0", profile.id(), CreateNicParams::new(), &[])
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod ids;
pub mod mac;
pub mod mock;
pub mod params;
pub mod rest;
pub mod retry;
pub mod traits;
pub mod types;

pub use config::{connect, BackendKind, EngineConfig, RetryConfig};
pub use error::{EngineError, ErrorKind, Result};
pub use ids::*;
pub use mac::MacAddress;
pub use mock::MockBackend;
pub use rest::RestBackend;
pub use retry::{DiagnosticSink, RetryStrategy, Severity};
pub use traits::{find_blank_template, EngineClient};
pub use types::*;
