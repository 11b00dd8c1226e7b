//! # squad-server
//!
//! Composes the RCON session, log-parse engine, and event bus into the
//! single control-plane surface external callers drive.

pub mod facade;

pub use facade::{FacadeConfig, ServerFacade};
