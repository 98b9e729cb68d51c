//! Board record codec over a slot store.
//!
//! # Responsibility
//! - Serialize `NotesState` and `Connections` as JSON under fixed slots.
//! - Rehydrate both records at startup, repairing or discarding bad data.
//!
//! # Invariants
//! - Missing or unparseable records load as empty state and are logged.
//! - Loaded state satisfies the store/order bijection and holds no dangling
//!   or self-referencing connections.
//! - A save writes only the records passed in, atomically.

use crate::model::board::{Connections, NotesState};
use crate::repo::slot_store::SlotStore;
use crate::repo::RepoResult;
use log::{info, warn};
use serde::de::DeserializeOwned;

/// Slot holding `{"store": {...}, "order": [...]}`.
pub const NOTES_SLOT: &str = "notes";
/// Slot holding `{source_id: [target_id, ...]}`.
pub const CONNECTIONS_SLOT: &str = "connections";

/// Board state read back from the slot area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedBoard {
    pub notes: NotesState,
    pub connections: Connections,
}

/// Reads and writes the two board records.
pub struct BoardRepository<S: SlotStore> {
    slots: S,
}

impl<S: SlotStore> BoardRepository<S> {
    pub fn new(slots: S) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &S {
        &self.slots
    }

    pub fn into_inner(self) -> S {
        self.slots
    }

    /// Loads both records, falling back to empty state per record.
    pub fn load(&self) -> LoadedBoard {
        let mut notes: NotesState = self.load_record(NOTES_SLOT);
        let mut connections: Connections = self.load_record(CONNECTIONS_SLOT);

        if notes.repair() {
            warn!("event=board_load module=repo status=repaired slot={NOTES_SLOT}");
        }
        if connections.repair(&notes) {
            warn!("event=board_load module=repo status=repaired slot={CONNECTIONS_SLOT}");
        }

        info!(
            "event=board_load module=repo status=ok notes={} connections={}",
            notes.len(),
            connections.len()
        );
        LoadedBoard { notes, connections }
    }

    /// Writes whichever records are given in one atomic slot write.
    pub fn save(
        &mut self,
        notes: Option<&NotesState>,
        connections: Option<&Connections>,
    ) -> RepoResult<()> {
        let mut entries = Vec::with_capacity(2);
        if let Some(notes) = notes {
            entries.push((NOTES_SLOT, serde_json::to_string(notes)?));
        }
        if let Some(connections) = connections {
            entries.push((CONNECTIONS_SLOT, serde_json::to_string(connections)?));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.slots.write_slots(&entries)
    }

    fn load_record<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.slots.read_slot(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                warn!(
                    "event=board_load module=repo status=error slot={key} error_code=slot_read_failed error={err}"
                );
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(
                "event=board_load module=repo status=error slot={key} error_code=record_malformed error={err}"
            );
            T::default()
        })
    }
}
