//! Flutter-facing bindings for the StickyBoard core.

pub mod api;
