//! quill-axum: Axum adapter for Quill.
//!
//! Mounts `QuillService`s as REST resources, renders the
//! `{success, data, pagination?}` envelopes and converts
//! multipart form submissions into JSON bodies.

pub mod app;
pub mod envelope;
pub mod middlewares;
pub mod params;
pub mod rest;
pub mod state;
mod error;
pub use error::QuillAxumError;
pub use state::QuillAxumState;

pub use app::{axum, AxumApp};
