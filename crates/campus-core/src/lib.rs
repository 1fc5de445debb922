//! Core types and operations for the campus school directory.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; storage is reached only through the
//! [`store::SchoolStore`] trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod compare;
pub mod enquiry;
pub mod error;
pub mod facility;
pub mod fees;
pub mod identity;
pub mod json;
pub mod media;
pub mod owner;
pub mod profile;
pub mod school;
pub mod store;

#[cfg(test)]
mod mock;

pub use error::{Error, Result};
