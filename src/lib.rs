//! # parkd
//!
//! Backend for a parking-lot management system.
//!
//! The centerpiece is a three-step cancellation handshake between three
//! loosely coupled parties: the web client that requests the cancellation,
//! a secondary device that scans a confirmation code, and the frontend
//! that polls until the scan lands. There is no session or channel between
//! them; the reservation row itself is the shared state, which shapes most
//! of the repository contract.
//!
//! Secondary flows cover long-term passes (whose holders skip the scan
//! handshake), employee enrollment, and employee identification from an
//! uploaded face image via an external classifier with a local fallback.
//!
//! ## Architecture
//!
//! - [`api`]: Identifier newtypes shared across layers
//! - [`models`]: Domain entities (reservations, passes, employees)
//! - [`db`]: Repository pattern with in-memory and Postgres backends
//! - [`services`]: Cancellation coordinator, face chain, enrollment
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
