//! Core types, the store abstraction and the identity-resolution pipeline.
//!
//! This crate knows nothing about SQL or about any particular export format.
//! Producers (`rapport-import`) hand it [`record::SourceBatch`]es; a backend
//! (`rapport-store-sqlite`) implements [`store::MessageStore`]; the
//! [`ingest::Ingestor`] and [`resolver::Resolver`] drive both.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entity;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod record;
pub mod registrar;
pub mod resolver;
pub mod store;
pub mod view;
pub mod writer;

pub use error::{Error, Result};
