//! Board collection model: paint-ordered notes and directed connections.
//!
//! # Responsibility
//! - Hold the two persisted record shapes (`NotesState`, `Connections`).
//! - Provide in-place transitions that keep their invariants intact.
//! - Compute derived reads (extent, connection lines) from current state.
//!
//! # Invariants
//! - `NotesState::order` lists every `store` key exactly once.
//! - A connection target list is never empty and never holds its source.
//! - Transition methods return whether anything changed.

use crate::geometry::Line;
use crate::model::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Padding added around the furthest note when computing the board extent.
pub const BOARD_PADDING: f64 = 300.0;

/// Notes keyed by id plus their back-to-front paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesState {
    pub store: BTreeMap<NoteId, Note>,
    pub order: Vec<NoteId>,
}

impl NotesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.store.get(&id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.store.get_mut(&id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.store.contains_key(&id)
    }

    /// Iterates notes back to front.
    pub fn iter_ordered(&self) -> impl DoubleEndedIterator<Item = &Note> + '_ {
        self.order.iter().filter_map(|id| self.store.get(id))
    }

    /// Inserts a note as the frontmost one.
    ///
    /// A note whose id is already present is replaced in place and keeps its
    /// paint position.
    pub fn push_front_most(&mut self, note: Note) {
        let id = note.id;
        if self.store.insert(id, note).is_none() {
            self.order.push(id);
        }
    }

    /// Removes every listed note. Returns the ids actually removed.
    pub fn remove_all(&mut self, ids: &[NoteId]) -> BTreeSet<NoteId> {
        let removed: BTreeSet<NoteId> = ids
            .iter()
            .copied()
            .filter(|id| self.store.remove(id).is_some())
            .collect();
        if !removed.is_empty() {
            self.order.retain(|id| !removed.contains(id));
        }
        removed
    }

    /// Moves the listed notes to the end of the paint order.
    ///
    /// The moved notes keep their relative order from `ids`; the rest keep
    /// theirs. Unknown and repeated ids are ignored.
    pub fn bring_to_front(&mut self, ids: &[NoteId]) -> bool {
        let moved = self.known_unique(ids);
        if moved.is_empty() {
            return false;
        }
        let moved_set: BTreeSet<NoteId> = moved.iter().copied().collect();
        let mut next: Vec<NoteId> = self
            .order
            .iter()
            .copied()
            .filter(|id| !moved_set.contains(id))
            .collect();
        next.extend(moved);
        self.replace_order(next)
    }

    /// Moves the listed notes to the start of the paint order.
    ///
    /// Same ordering rules as [`NotesState::bring_to_front`].
    pub fn send_to_back(&mut self, ids: &[NoteId]) -> bool {
        let mut next = self.known_unique(ids);
        if next.is_empty() {
            return false;
        }
        let moved_set: BTreeSet<NoteId> = next.iter().copied().collect();
        next.extend(
            self.order
                .iter()
                .copied()
                .filter(|id| !moved_set.contains(id)),
        );
        self.replace_order(next)
    }

    /// Smallest padded bound enclosing every note; `(0, 0)` when empty.
    pub fn extent(&self, padding: f64) -> BoardExtent {
        self.iter_ordered()
            .fold(BoardExtent::default(), |acc, note| BoardExtent {
                width: acc.width.max(note.x + note.width + padding),
                height: acc.height.max(note.y + note.height + padding),
            })
    }

    /// Reconciles `store` and `order` after loading untrusted data.
    ///
    /// Order entries without a note and repeated order entries are dropped;
    /// notes missing from the order are appended in id order. Notes stored
    /// under a key that differs from their own id are re-keyed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;

        let mismatched: Vec<NoteId> = self
            .store
            .iter()
            .filter(|(key, note)| **key != note.id)
            .map(|(key, _)| *key)
            .collect();
        for key in mismatched {
            if let Some(note) = self.store.remove(&key) {
                changed = true;
                let new_key = note.id;
                self.store.entry(new_key).or_insert(note);
                for id in self.order.iter_mut().filter(|id| **id == key) {
                    *id = new_key;
                }
            }
        }

        let mut seen = BTreeSet::new();
        let before = self.order.len();
        let store = &self.store;
        self.order
            .retain(|id| store.contains_key(id) && seen.insert(*id));
        changed |= self.order.len() != before;

        let missing: Vec<NoteId> = self
            .store
            .keys()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        changed |= !missing.is_empty();
        self.order.extend(missing);

        changed
    }

    fn known_unique(&self, ids: &[NoteId]) -> Vec<NoteId> {
        let mut seen = BTreeSet::new();
        ids.iter()
            .copied()
            .filter(|id| self.store.contains_key(id) && seen.insert(*id))
            .collect()
    }

    fn replace_order(&mut self, next: Vec<NoteId>) -> bool {
        if next == self.order {
            return false;
        }
        self.order = next;
        true
    }
}

/// Directed note-to-note edges keyed by source id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connections(BTreeMap<NoteId, Vec<NoteId>>);

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of directed edges.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Targets connected from `source`, in insertion order.
    pub fn targets(&self, source: NoteId) -> &[NoteId] {
        self.0.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, source: NoteId, target: NoteId) -> bool {
        self.targets(source).contains(&target)
    }

    /// Iterates `(source, target)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (NoteId, NoteId)> + '_ {
        self.0
            .iter()
            .flat_map(|(source, targets)| targets.iter().map(move |target| (*source, *target)))
    }

    /// Adds `source -> target` unless it is a self-loop or already present.
    pub fn connect(&mut self, source: NoteId, target: NoteId) -> bool {
        if source == target {
            return false;
        }
        let targets = self.0.entry(source).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Removes `source -> target`, dropping the source entry once empty.
    pub fn disconnect(&mut self, source: NoteId, target: NoteId) -> bool {
        let Some(targets) = self.0.get_mut(&source) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|id| *id != target);
        let changed = targets.len() != before;
        if targets.is_empty() {
            self.0.remove(&source);
        }
        changed
    }

    /// Drops every edge touching one of `removed`.
    pub fn prune_notes(&mut self, removed: &BTreeSet<NoteId>) -> bool {
        self.retain_edges(|source, target| !removed.contains(&source) && !removed.contains(&target))
    }

    /// Drops self-loops, repeated targets and edges whose endpoints are not
    /// on the board.
    pub fn repair(&mut self, notes: &NotesState) -> bool {
        let mut changed = false;
        for (source, targets) in self.0.iter_mut() {
            let mut seen = BTreeSet::new();
            let before = targets.len();
            targets.retain(|target| *target != *source && seen.insert(*target));
            changed |= targets.len() != before;
        }
        changed |= self.retain_edges(|source, target| notes.contains(source) && notes.contains(target));
        changed
    }

    fn retain_edges(&mut self, mut keep: impl FnMut(NoteId, NoteId) -> bool) -> bool {
        let mut changed = false;
        self.0.retain(|source, targets| {
            let before = targets.len();
            targets.retain(|target| keep(*source, *target));
            changed |= targets.len() != before;
            if targets.is_empty() {
                changed = true;
                false
            } else {
                true
            }
        });
        changed
    }

    /// Endpoint centers for every connection whose notes both exist.
    pub fn lines(&self, notes: &NotesState) -> Vec<ConnectionLine> {
        self.pairs()
            .filter_map(|(from, to)| {
                let source = notes.get(from)?;
                let target = notes.get(to)?;
                Some(ConnectionLine {
                    from,
                    to,
                    line: Line::new(source.centre(), target.centre()),
                })
            })
            .collect()
    }
}

/// Padded size needed to contain every note.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardExtent {
    pub width: f64,
    pub height: f64,
}

/// A drawable connection between two note centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionLine {
    pub from: NoteId,
    pub to: NoteId,
    pub line: Line,
}

#[cfg(test)]
mod tests {
    use super::{BoardExtent, Connections, NotesState, BOARD_PADDING};
    use crate::model::note::{Note, NoteId};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn state_with(count: usize) -> (NotesState, Vec<NoteId>) {
        let mut state = NotesState::new();
        let mut ids = Vec::new();
        for idx in 0..count {
            let note = Note::new(idx as f64 * 10.0, 0.0);
            ids.push(note.id);
            state.push_front_most(note);
        }
        (state, ids)
    }

    #[test]
    fn bring_to_front_preserves_relative_order() {
        let (mut state, ids) = state_with(5);
        assert!(state.bring_to_front(&[ids[3], ids[1]]));
        assert_eq!(state.order, vec![ids[0], ids[2], ids[4], ids[3], ids[1]]);
    }

    #[test]
    fn bring_to_front_is_idempotent() {
        let (mut state, ids) = state_with(4);
        state.bring_to_front(&[ids[0], ids[2]]);
        let once = state.order.clone();
        assert!(!state.bring_to_front(&[ids[0], ids[2]]));
        assert_eq!(state.order, once);
    }

    #[test]
    fn send_to_back_preserves_relative_order() {
        let (mut state, ids) = state_with(4);
        assert!(state.send_to_back(&[ids[3], ids[2]]));
        assert_eq!(state.order, vec![ids[3], ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn ordering_ignores_unknown_and_repeated_ids() {
        let (mut state, ids) = state_with(3);
        let stranger = Uuid::new_v4();
        state.bring_to_front(&[ids[0], stranger, ids[0]]);
        assert_eq!(state.order, vec![ids[1], ids[2], ids[0]]);
        assert!(!state.send_to_back(&[stranger]));
        assert_eq!(state.order.len(), state.store.len());
    }

    #[test]
    fn extent_is_zero_when_empty_and_padded_otherwise() {
        let (empty, _) = state_with(0);
        assert_eq!(empty.extent(BOARD_PADDING), BoardExtent::default());

        let (state, _) = state_with(3);
        let extent = state.extent(BOARD_PADDING);
        assert_eq!(extent.width, 20.0 + 300.0 + BOARD_PADDING);
        assert_eq!(extent.height, 80.0 + BOARD_PADDING);
    }

    #[test]
    fn repair_reconciles_store_and_order() {
        let (mut state, ids) = state_with(3);
        let ghost = Uuid::new_v4();
        state.order = vec![ids[2], ghost, ids[2], ids[0]];

        assert!(state.repair());
        assert_eq!(state.order.len(), 3);
        assert_eq!(&state.order[..2], &[ids[2], ids[0]]);
        assert_eq!(state.order[2], ids[1]);
        assert!(!state.repair());

        let stray = Uuid::new_v4();
        let note = state.store.remove(&ids[0]).unwrap();
        state.store.insert(stray, note);
        state.order = vec![ids[2], stray, ids[1]];

        assert!(state.repair());
        assert!(!state.store.contains_key(&stray));
        assert_eq!(state.get(ids[0]).map(|note| note.id), Some(ids[0]));
        assert_eq!(state.order, vec![ids[2], ids[0], ids[1]]);
        assert!(!state.repair());
    }

    #[test]
    fn connect_rejects_self_loops_and_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cons = Connections::new();
        assert!(!cons.connect(a, a));
        assert!(cons.is_empty());
        assert!(cons.connect(a, b));
        assert!(!cons.connect(a, b));
        assert_eq!(cons.targets(a), &[b]);
    }

    #[test]
    fn disconnect_drops_empty_entries_and_tolerates_unknown_pairs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let mut cons = Connections::new();
        cons.connect(a, b);
        cons.connect(a, c);

        assert!(!cons.disconnect(b, a));
        assert!(cons.disconnect(a, b));
        assert_eq!(cons.targets(a), &[c]);
        assert!(cons.disconnect(a, c));
        assert!(cons.is_empty());
    }

    #[test]
    fn prune_notes_removes_sources_and_targets() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let mut cons = Connections::new();
        cons.connect(a, b);
        cons.connect(c, b);
        cons.connect(c, a);

        let removed: BTreeSet<NoteId> = [a].into_iter().collect();
        assert!(cons.prune_notes(&removed));
        assert_eq!(cons.pairs().collect::<Vec<_>>(), vec![(c, b)]);
    }

    #[test]
    fn lines_skip_missing_endpoints() {
        let (state, ids) = state_with(2);
        let mut cons = Connections::new();
        cons.connect(ids[0], ids[1]);
        cons.connect(ids[0], Uuid::new_v4());

        let lines = cons.lines(&state);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line.x1, 150.0);
        assert_eq!(lines[0].line.x2, 160.0);
        assert_eq!(lines[0].line.y2, 40.0);
    }
}
