//! Board state store.
//!
//! # Responsibility
//! - Own the notes, connections and clipboard of one board.
//! - Apply every mutation write-through: persist, commit, then notify.
//! - Serve derived reads (extent, connection lines, hit-tests) on demand.
//!
//! # Invariants
//! - A mutation becomes visible only after its records were persisted; a
//!   failed write leaves in-memory state untouched.
//! - `order` and `store` stay in bijection after every operation.
//! - After `delete_notes` no connection references a deleted note.
//! - Operations that change nothing neither persist nor notify.

use crate::geometry::{
    fix_negative_rectangle, line_rect_collision, rect_collision, rect_inside, Point, Rect,
};
use crate::model::board::{BoardExtent, ConnectionLine, Connections, NotesState, BOARD_PADDING};
use crate::model::note::{Note, NoteId};
use crate::observer::{ObserverId, ObserverList};
use crate::repo::board_repo::BoardRepository;
use crate::repo::slot_store::SlotStore;
use crate::repo::RepoError;
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Offset applied to each clone when duplicating without a target origin.
pub const DUPLICATE_OFFSET: f64 = 10.0;

pub type BoardResult<T> = Result<T, BoardError>;

/// Errors from board store operations.
#[derive(Debug)]
pub enum BoardError {
    /// Persisting the next state failed; the previous state is kept.
    Repo(RepoError),
    /// A single-note edit targeted an id that is not on the board.
    NoteNotFound(NoteId),
    /// A coordinate or size was NaN or infinite.
    InvalidGeometry(&'static str),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidGeometry(op) => write!(f, "{op}: coordinates must be finite"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BoardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Which records a committed mutation replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub notes: bool,
    pub connections: bool,
}

/// Committed board state handed to observers.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    pub notes: &'a NotesState,
    pub connections: &'a Connections,
    pub change: ChangeSet,
}

/// Callback shape for board observers.
pub type BoardObserver = dyn FnMut(&BoardView<'_>) + Send;

/// Single-writer store for one board.
pub struct BoardStore<S: SlotStore> {
    repo: BoardRepository<S>,
    notes: NotesState,
    connections: Connections,
    clipboard: Option<Vec<Note>>,
    observers: ObserverList<BoardObserver>,
}

impl<S: SlotStore> BoardStore<S> {
    /// Opens a board over `slots`, rehydrating any persisted state.
    ///
    /// Missing or malformed records start the board empty.
    pub fn open(slots: S) -> Self {
        let repo = BoardRepository::new(slots);
        let loaded = repo.load();
        Self {
            repo,
            notes: loaded.notes,
            connections: loaded.connections,
            clipboard: None,
            observers: ObserverList::new(),
        }
    }

    pub fn slot_store(&self) -> &S {
        self.repo.slots()
    }

    pub fn into_slot_store(self) -> S {
        self.repo.into_inner()
    }

    // ---- reads -------------------------------------------------------------

    pub fn notes(&self) -> &NotesState {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    /// Note ids back to front.
    pub fn order(&self) -> &[NoteId] {
        &self.notes.order
    }

    pub fn notes_in_paint_order(&self) -> impl DoubleEndedIterator<Item = &Note> + '_ {
        self.notes.iter_ordered()
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn clipboard(&self) -> Option<&[Note]> {
        self.clipboard.as_deref()
    }

    /// Padded size needed to contain every note.
    pub fn board_extent(&self) -> BoardExtent {
        self.notes.extent(BOARD_PADDING)
    }

    /// Center-to-center lines for every connection with both endpoints on
    /// the board.
    pub fn connection_lines(&self) -> Vec<ConnectionLine> {
        self.connections.lines(&self.notes)
    }

    /// Topmost note containing `point`.
    pub fn note_at(&self, point: Point) -> Option<NoteId> {
        self.notes
            .iter_ordered()
            .rev()
            .find(|note| rect_inside(point, &note.rect()))
            .map(|note| note.id)
    }

    /// Notes overlapping a selection rectangle, back to front.
    ///
    /// The rectangle may have negative extent, as produced by dragging a
    /// selection box up or left.
    pub fn notes_in_rect(&self, selection: Rect) -> Vec<NoteId> {
        let selection = fix_negative_rectangle(selection);
        self.notes
            .iter_ordered()
            .filter(|note| rect_collision(&note.rect(), &selection))
            .map(|note| note.id)
            .collect()
    }

    /// Connections whose line crosses a (possibly negative) rectangle.
    pub fn connections_crossing(&self, area: Rect) -> Vec<(NoteId, NoteId)> {
        let area = fix_negative_rectangle(area);
        self.connection_lines()
            .into_iter()
            .filter(|line| line_rect_collision(&line.line, &area))
            .map(|line| (line.from, line.to))
            .collect()
    }

    // ---- observers ---------------------------------------------------------

    /// Registers a callback run after every committed mutation.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&BoardView<'_>) + Send + 'static,
    ) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ---- notes -------------------------------------------------------------

    /// Creates an empty default-size note at `(x, y)` as the frontmost note.
    pub fn create_note(&mut self, x: f64, y: f64) -> BoardResult<Note> {
        ensure_finite("create_note", &[x, y])?;
        let note = Note::new(x, y);
        let mut next = self.notes.clone();
        next.push_front_most(note.clone());
        self.commit("create_note", Some(next), None)?;
        Ok(note)
    }

    /// Clones `sources` under fresh ids as the frontmost notes.
    ///
    /// Without `relative_origin` each clone is offset by
    /// [`DUPLICATE_OFFSET`] on both axes. With it, the group's top-left
    /// corner (minimum x and minimum y over `sources`) is moved onto the
    /// origin and the group's internal layout is kept. Returns the new ids in
    /// input order.
    pub fn duplicate_notes(
        &mut self,
        sources: &[Note],
        relative_origin: Option<Point>,
    ) -> BoardResult<Vec<NoteId>> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(origin) = relative_origin {
            ensure_finite("duplicate_notes", &[origin.x, origin.y])?;
        }

        let shift = match relative_origin {
            Some(origin) => {
                let anchor = sources.iter().fold(
                    Point::new(f64::INFINITY, f64::INFINITY),
                    |acc, note| Point::new(acc.x.min(note.x), acc.y.min(note.y)),
                );
                Point::new(origin.x - anchor.x, origin.y - anchor.y)
            }
            None => Point::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET),
        };

        let mut next = self.notes.clone();
        let mut ids = Vec::with_capacity(sources.len());
        for source in sources {
            let id = Uuid::new_v4();
            let clone = source.cloned_at(id, source.x + shift.x, source.y + shift.y);
            ensure_note_finite("duplicate_notes", &clone)?;
            next.push_front_most(clone);
            ids.push(id);
        }
        self.commit("duplicate_notes", Some(next), None)?;
        Ok(ids)
    }

    /// Removes notes and every connection touching them.
    pub fn delete_notes(&mut self, ids: &[NoteId]) -> BoardResult<()> {
        let mut next = self.notes.clone();
        let removed = next.remove_all(ids);
        if removed.is_empty() {
            return Ok(());
        }

        let mut next_connections = self.connections.clone();
        let connections = next_connections
            .prune_notes(&removed)
            .then_some(next_connections);
        self.commit("delete_notes", Some(next), connections)
    }

    /// Moves notes to the front, keeping their relative order.
    pub fn bring_to_front(&mut self, ids: &[NoteId]) -> BoardResult<()> {
        let mut next = self.notes.clone();
        if !next.bring_to_front(ids) {
            return Ok(());
        }
        self.commit("bring_to_front", Some(next), None)
    }

    /// Moves notes to the back, keeping their relative order.
    pub fn send_to_back(&mut self, ids: &[NoteId]) -> BoardResult<()> {
        let mut next = self.notes.clone();
        if !next.send_to_back(ids) {
            return Ok(());
        }
        self.commit("send_to_back", Some(next), None)
    }

    pub fn move_note(&mut self, id: NoteId, x: f64, y: f64) -> BoardResult<()> {
        ensure_finite("move_note", &[x, y])?;
        self.edit_note("move_note", id, |note| {
            note.x = x;
            note.y = y;
        })
    }

    /// Shifts every listed note by `(dx, dy)`; unknown ids are skipped.
    pub fn translate_notes(&mut self, ids: &[NoteId], dx: f64, dy: f64) -> BoardResult<()> {
        ensure_finite("translate_notes", &[dx, dy])?;
        if dx == 0.0 && dy == 0.0 {
            return Ok(());
        }

        let mut next = self.notes.clone();
        let mut moved = false;
        for id in ids {
            if let Some(note) = next.get_mut(*id) {
                note.x += dx;
                note.y += dy;
                ensure_note_finite("translate_notes", note)?;
                moved = true;
            }
        }
        if !moved {
            return Ok(());
        }
        self.commit("translate_notes", Some(next), None)
    }

    /// Sets a note's size; a negative extent flips the note around its
    /// origin on that axis.
    pub fn resize_note(&mut self, id: NoteId, width: f64, height: f64) -> BoardResult<()> {
        ensure_finite("resize_note", &[width, height])?;
        self.edit_note("resize_note", id, |note| {
            let fixed = fix_negative_rectangle(Rect::new(note.x, note.y, width, height));
            note.x = fixed.x;
            note.y = fixed.y;
            note.width = fixed.width;
            note.height = fixed.height;
        })
    }

    pub fn set_note_content(&mut self, id: NoteId, content: impl Into<String>) -> BoardResult<()> {
        let content = content.into();
        self.edit_note("set_note_content", id, |note| note.content = content)
    }

    // ---- connections -------------------------------------------------------

    /// Connects `source -> target`.
    ///
    /// Self-loops, repeated connections and ids that are not on the board
    /// are ignored.
    pub fn make_connection(&mut self, (source, target): (NoteId, NoteId)) -> BoardResult<()> {
        if source == target {
            return Ok(());
        }
        if !self.notes.contains(source) || !self.notes.contains(target) {
            debug!(
                "event=make_connection module=service status=skipped reason=unknown_note source={source} target={target}"
            );
            return Ok(());
        }

        let mut next = self.connections.clone();
        if !next.connect(source, target) {
            return Ok(());
        }
        self.commit("make_connection", None, Some(next))
    }

    /// Removes each `(source, target)` connection; unknown pairs are ignored.
    pub fn delete_connections(&mut self, pairs: &[(NoteId, NoteId)]) -> BoardResult<()> {
        let mut next = self.connections.clone();
        let mut changed = false;
        for (source, target) in pairs {
            changed |= next.disconnect(*source, *target);
        }
        if !changed {
            return Ok(());
        }
        self.commit("delete_connections", None, Some(next))
    }

    // ---- clipboard ---------------------------------------------------------

    /// Snapshots the listed notes, back to front, into the clipboard.
    ///
    /// Returns how many notes were copied; copying nothing leaves the
    /// clipboard unchanged.
    pub fn copy_to_clipboard(&mut self, ids: &[NoteId]) -> usize {
        let copied: Vec<Note> = self
            .notes
            .iter_ordered()
            .filter(|note| ids.contains(&note.id))
            .cloned()
            .collect();
        let count = copied.len();
        if count > 0 {
            self.clipboard = Some(copied);
        }
        count
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = None;
    }

    /// Duplicates the clipboard with its top-left corner at `origin`.
    pub fn paste_clipboard(&mut self, origin: Point) -> BoardResult<Vec<NoteId>> {
        let Some(sources) = self.clipboard.clone() else {
            return Ok(Vec::new());
        };
        self.duplicate_notes(&sources, Some(origin))
    }

    // ---- internals ---------------------------------------------------------

    fn edit_note(
        &mut self,
        op: &'static str,
        id: NoteId,
        edit: impl FnOnce(&mut Note),
    ) -> BoardResult<()> {
        let mut next = self.notes.clone();
        let note = next.get_mut(id).ok_or(BoardError::NoteNotFound(id))?;
        let before = note.clone();
        edit(note);
        if *note == before {
            return Ok(());
        }
        ensure_note_finite(op, note)?;
        self.commit(op, Some(next), None)
    }

    fn commit(
        &mut self,
        op: &'static str,
        notes: Option<NotesState>,
        connections: Option<Connections>,
    ) -> BoardResult<()> {
        if let Err(err) = self.repo.save(notes.as_ref(), connections.as_ref()) {
            error!(
                "event=board_commit module=service status=error op={op} error_code=persist_failed error={err}"
            );
            return Err(err.into());
        }

        let change = ChangeSet {
            notes: notes.is_some(),
            connections: connections.is_some(),
        };
        if let Some(notes) = notes {
            self.notes = notes;
        }
        if let Some(connections) = connections {
            self.connections = connections;
        }
        debug!(
            "event=board_commit module=service status=ok op={op} notes={} connections={}",
            self.notes.len(),
            self.connections.len()
        );

        let view = BoardView {
            notes: &self.notes,
            connections: &self.connections,
            change,
        };
        for observer in self.observers.iter_mut() {
            observer(&view);
        }
        Ok(())
    }
}

fn ensure_finite(op: &'static str, values: &[f64]) -> BoardResult<()> {
    if values.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(BoardError::InvalidGeometry(op))
    }
}

/// Rejects edits whose resulting geometry overflowed; a non-finite field
/// would not survive the JSON record.
fn ensure_note_finite(op: &'static str, note: &Note) -> BoardResult<()> {
    ensure_finite(op, &[note.x, note.y, note.width, note.height])
}
