//! REST engine backend.
//!
//! Talks to a live management engine through a [`Connection`]. Every call is
//! executed under the retry engine; remote representations are converted
//! into the crate's entity types on the way back.

mod backend;
mod connection;
pub mod sdk;

pub use backend::RestBackend;
pub use connection::{
    Connection, ConnectionError, EngineRequest, EngineResponse, Method, Resource, RestConnection,
};
