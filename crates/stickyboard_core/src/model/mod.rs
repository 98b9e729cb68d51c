//! Board domain model.
//!
//! # Responsibility
//! - Define notes, the paint-ordered note collection and connections.
//! - Keep the persisted record shapes and the derived read shapes together.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId` that is never reused.
//! - `NotesState::store` keys and `NotesState::order` are in bijection.
//! - Connections never reference a note that is not on the board.

pub mod board;
pub mod note;
