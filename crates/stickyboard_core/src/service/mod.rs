//! Board use-case services.
//!
//! # Responsibility
//! - Orchestrate model transitions and record persistence per operation.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod board_store;
