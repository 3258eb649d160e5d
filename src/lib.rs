//! Visitrack - cookie-backed repeat visitor identification
//!
//! Each browser gets a persistent visitor record. The record id is encoded
//! into an opaque token with a keyed hashids codec and stored in a cookie;
//! later requests are recognised by decoding the cookie and checking the
//! id + token pair against storage. Non-interactive clients (crawlers, CLI
//! tools) are never tracked.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `codec`: Hashids token codec
//! - `visitor`: Bot detection, collaborator ports, resolver and request session
//! - `storage`: SeaORM and in-memory visitor stores
//! - `api`: HTTP services, cookie and UTM adapters
//! - `interfaces`: Command-line interface
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod storage;
pub mod system;
pub mod utils;
pub mod visitor;
