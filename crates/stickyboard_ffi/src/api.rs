//! FFI board API for the UI host.
//!
//! # Responsibility
//! - Own the process-wide board instance behind a single mutex.
//! - Expose every board operation as a sync call with string ids.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Operations are serialized by the board mutex in call order.
//! - Ids that fail to parse are ignored like ids that are not on the board.

use log::warn;
use stickyboard_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_board,
    ping as ping_inner, BoardConfig, BoardError, ConnectionLine, Note, NoteId, Point, Rect,
    SqliteBoardStore,
};
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

static BOARD: OnceLock<Mutex<SqliteBoardStore>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Note snapshot handed to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteItem {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content: String,
}

/// Connection line between two note centers.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub from_id: String,
    pub to_id: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Padded board size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtentItem {
    pub width: f64,
    pub height: f64,
}

/// Generic result envelope for board mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardActionResponse {
    pub ok: bool,
    /// Ids created by the operation, in input order.
    pub note_ids: Vec<String>,
    pub message: String,
}

impl BoardActionResponse {
    fn success(note_ids: Vec<String>) -> Self {
        Self {
            ok: true,
            note_ids,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_ids: Vec::new(),
            message: message.into(),
        }
    }
}

/// Opens the board, rehydrating persisted state.
///
/// A blank `db_path` resolves the path from `STICKYBOARD_DB_PATH` or the
/// temp directory. Only the first successful call opens a board; later calls
/// are no-ops. Returns an empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn board_init(db_path: String) -> String {
    match init_board(db_path.trim()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Returns every note back to front.
#[flutter_rust_bridge::frb(sync)]
pub fn board_notes() -> Vec<NoteItem> {
    with_board(|board| Ok(board.notes_in_paint_order().map(to_note_item).collect()))
        .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_create_note(x: f64, y: f64) -> BoardActionResponse {
    respond("board_create_note", |board| {
        board
            .create_note(x, y)
            .map(|note| vec![note.id.to_string()])
    })
}

/// Duplicates notes by id; `origin` anchors the group's top-left corner.
#[flutter_rust_bridge::frb(sync)]
pub fn board_duplicate_notes(
    ids: Vec<String>,
    origin_x: Option<f64>,
    origin_y: Option<f64>,
) -> BoardActionResponse {
    let origin = match (origin_x, origin_y) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        (None, None) => None,
        _ => {
            return BoardActionResponse::failure(
                "board_duplicate_notes failed: origin needs both x and y",
            )
        }
    };
    let ids = parse_ids(&ids);
    respond("board_duplicate_notes", |board| {
        let sources: Vec<Note> = ids
            .iter()
            .filter_map(|id| board.note(*id).cloned())
            .collect();
        board.duplicate_notes(&sources, origin).map(id_strings)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_notes(ids: Vec<String>) -> BoardActionResponse {
    let ids = parse_ids(&ids);
    respond("board_delete_notes", |board| {
        board.delete_notes(&ids).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_bring_to_front(ids: Vec<String>) -> BoardActionResponse {
    let ids = parse_ids(&ids);
    respond("board_bring_to_front", |board| {
        board.bring_to_front(&ids).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_send_to_back(ids: Vec<String>) -> BoardActionResponse {
    let ids = parse_ids(&ids);
    respond("board_send_to_back", |board| {
        board.send_to_back(&ids).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_move_note(id: String, x: f64, y: f64) -> BoardActionResponse {
    let Some(id) = parse_id(&id) else {
        return BoardActionResponse::failure(format!("invalid note id `{id}`"));
    };
    respond("board_move_note", |board| {
        board.move_note(id, x, y).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_translate_notes(ids: Vec<String>, dx: f64, dy: f64) -> BoardActionResponse {
    let ids = parse_ids(&ids);
    respond("board_translate_notes", |board| {
        board.translate_notes(&ids, dx, dy).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_resize_note(id: String, width: f64, height: f64) -> BoardActionResponse {
    let Some(id) = parse_id(&id) else {
        return BoardActionResponse::failure(format!("invalid note id `{id}`"));
    };
    respond("board_resize_note", |board| {
        board.resize_note(id, width, height).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_set_note_content(id: String, content: String) -> BoardActionResponse {
    let Some(id) = parse_id(&id) else {
        return BoardActionResponse::failure(format!("invalid note id `{id}`"));
    };
    respond("board_set_note_content", |board| {
        board.set_note_content(id, content).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_make_connection(from_id: String, to_id: String) -> BoardActionResponse {
    let (Some(from), Some(to)) = (parse_id(&from_id), parse_id(&to_id)) else {
        return BoardActionResponse::success(Vec::new());
    };
    respond("board_make_connection", |board| {
        board.make_connection((from, to)).map(|()| Vec::new())
    })
}

/// Deletes `from_ids[i] -> to_ids[i]` connections; unmatched tails are
/// ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_connections(from_ids: Vec<String>, to_ids: Vec<String>) -> BoardActionResponse {
    let pairs: Vec<(NoteId, NoteId)> = from_ids
        .iter()
        .zip(to_ids.iter())
        .filter_map(|(from, to)| Some((parse_id(from)?, parse_id(to)?)))
        .collect();
    respond("board_delete_connections", |board| {
        board.delete_connections(&pairs).map(|()| Vec::new())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_connection_lines() -> Vec<LineItem> {
    with_board(|board| Ok(board.connection_lines().iter().map(to_line_item).collect()))
        .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_extent() -> ExtentItem {
    let extent = with_board(|board| Ok(board.board_extent())).unwrap_or_default();
    ExtentItem {
        width: extent.width,
        height: extent.height,
    }
}

/// Topmost note under the pointer, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn board_note_at(x: f64, y: f64) -> Option<String> {
    with_board(|board| Ok(board.note_at(Point::new(x, y))))
        .ok()
        .flatten()
        .map(|id| id.to_string())
}

/// Notes touched by a selection box dragged from `(x, y)` by
/// `(width, height)`; negative extents are allowed.
#[flutter_rust_bridge::frb(sync)]
pub fn board_notes_in_rect(x: f64, y: f64, width: f64, height: f64) -> Vec<String> {
    with_board(|board| Ok(id_strings(board.notes_in_rect(Rect::new(x, y, width, height)))))
        .unwrap_or_default()
}

/// Connection lines crossing a (possibly negative) rectangle.
#[flutter_rust_bridge::frb(sync)]
pub fn board_connections_crossing(x: f64, y: f64, width: f64, height: f64) -> Vec<LineItem> {
    with_board(|board| {
        let crossing = board.connections_crossing(Rect::new(x, y, width, height));
        Ok(board
            .connection_lines()
            .iter()
            .filter(|line| crossing.contains(&(line.from, line.to)))
            .map(to_line_item)
            .collect())
    })
    .unwrap_or_default()
}

/// Returns how many notes were copied.
#[flutter_rust_bridge::frb(sync)]
pub fn board_copy(ids: Vec<String>) -> u32 {
    let ids = parse_ids(&ids);
    with_board(|board| Ok(board.copy_to_clipboard(&ids)))
        .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_paste(x: f64, y: f64) -> BoardActionResponse {
    respond("board_paste", |board| {
        board.paste_clipboard(Point::new(x, y)).map(id_strings)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_clear_clipboard() -> BoardActionResponse {
    respond("board_clear_clipboard", |board| {
        board.clear_clipboard();
        Ok(Vec::new())
    })
}

fn init_board(db_path: &str) -> Result<(), String> {
    if BOARD.get().is_some() {
        return Ok(());
    }

    let mut config = BoardConfig::from_env();
    if !db_path.is_empty() {
        config.db_path = db_path.into();
    }
    let board = open_board(&config).map_err(|err| format!("board_init failed: {err}"))?;
    // A concurrent init may have won the race; its board is kept.
    let _ = BOARD.set(Mutex::new(board));
    Ok(())
}

fn lock_board() -> Result<MutexGuard<'static, SqliteBoardStore>, String> {
    let board = BOARD
        .get()
        .ok_or_else(|| "board is not initialized; call board_init first".to_string())?;
    // A poisoned lock means an observer panicked mid-notify; state was
    // already committed, so keep serving it.
    Ok(board.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
}

fn with_board<T>(f: impl FnOnce(&mut SqliteBoardStore) -> Result<T, String>) -> Result<T, String> {
    let mut board = lock_board()?;
    f(&mut board)
}

fn respond(
    op: &'static str,
    f: impl FnOnce(&mut SqliteBoardStore) -> Result<Vec<String>, BoardError>,
) -> BoardActionResponse {
    match with_board(|board| f(board).map_err(|err| err.to_string())) {
        Ok(ids) => BoardActionResponse::success(ids),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={op} error={err}");
            BoardActionResponse::failure(format!("{op} failed: {err}"))
        }
    }
}

fn parse_id(value: &str) -> Option<NoteId> {
    Uuid::parse_str(value.trim()).ok()
}

fn parse_ids(values: &[String]) -> Vec<NoteId> {
    values.iter().filter_map(|value| parse_id(value)).collect()
}

fn id_strings(ids: Vec<NoteId>) -> Vec<String> {
    ids.into_iter().map(|id| id.to_string()).collect()
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        x: note.x,
        y: note.y,
        width: note.width,
        height: note.height,
        content: note.content.clone(),
    }
}

fn to_line_item(line: &ConnectionLine) -> LineItem {
    LineItem {
        from_id: line.from.to_string(),
        to_id: line.to.to_string(),
        x1: line.line.x1,
        y1: line.line.y1,
        x2: line.line.x2,
        y2: line.line.y2,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        board_bring_to_front, board_clear_clipboard, board_connection_lines,
        board_connections_crossing, board_copy, board_create_note, board_delete_notes,
        board_duplicate_notes, board_extent, board_init, board_make_connection, board_move_note,
        board_note_at, board_notes, board_notes_in_rect, board_paste, core_version,
        init_logging, ping,
    };
    use std::sync::{Mutex, OnceLock};

    static TEST_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    // The clipboard is board-global; tests touching it run one at a time.
    static CLIPBOARD_LOCK: Mutex<()> = Mutex::new(());

    fn ensure_board() {
        let dir = TEST_DIR.get_or_init(|| tempfile::tempdir().expect("create temp dir"));
        let path = dir.path().join("ffi_board.sqlite3");
        let error = board_init(path.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
    }

    fn created_id(x: f64, y: f64) -> String {
        let response = board_create_note(x, y);
        assert!(response.ok, "{}", response.message);
        response.note_ids[0].clone()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn created_note_is_listed_and_hit_testable() {
        ensure_board();
        let id = created_id(-50_000.0, -50_000.0);

        assert!(board_notes().iter().any(|note| note.id == id));
        assert_eq!(board_note_at(-49_990.0, -49_990.0), Some(id.clone()));
        assert!(board_notes_in_rect(-49_000.0, -49_000.0, -2_000.0, -2_000.0).contains(&id));
        assert!(board_bring_to_front(vec![id.clone()]).ok);
    }

    #[test]
    fn connections_are_drawn_and_pruned_on_delete() {
        ensure_board();
        let a = created_id(60_000.0, 0.0);
        let b = created_id(60_500.0, 0.0);

        assert!(board_make_connection(a.clone(), b.clone()).ok);
        assert!(board_connection_lines()
            .iter()
            .any(|line| line.from_id == a && line.to_id == b));

        assert!(board_delete_notes(vec![b.clone()]).ok);
        assert!(!board_connection_lines()
            .iter()
            .any(|line| line.from_id == a || line.to_id == b));
        assert!(board_extent().width >= 60_000.0 + 300.0 + 300.0);
    }

    #[test]
    fn copy_paste_creates_new_notes() {
        let _guard = CLIPBOARD_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        ensure_board();
        let id = created_id(70_000.0, 70_000.0);
        assert_eq!(board_copy(vec![id.clone(), "not-a-uuid".to_string()]), 1);

        let pasted = board_paste(80_000.0, 80_000.0);
        assert!(pasted.ok, "{}", pasted.message);
        assert_eq!(pasted.note_ids.len(), 1);
        assert_ne!(pasted.note_ids[0], id);
        assert_eq!(board_note_at(80_001.0, 80_001.0), Some(pasted.note_ids[0].clone()));
    }

    #[test]
    fn invalid_ids_fail_single_note_edits() {
        ensure_board();
        let response = board_move_note("nope".to_string(), 0.0, 0.0);
        assert!(!response.ok);
        assert!(response.message.contains("invalid note id"));
    }

    #[test]
    fn cleared_clipboard_pastes_nothing() {
        let _guard = CLIPBOARD_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        ensure_board();
        let id = created_id(90_000.0, 90_000.0);
        assert_eq!(board_copy(vec![id]), 1);

        assert!(board_clear_clipboard().ok);
        let pasted = board_paste(95_000.0, 95_000.0);
        assert!(pasted.ok, "{}", pasted.message);
        assert!(pasted.note_ids.is_empty());
        assert_eq!(board_note_at(95_001.0, 95_001.0), None);
    }

    #[test]
    fn connections_crossing_reports_hit_lines() {
        ensure_board();
        let a = created_id(100_000.0, 100_000.0);
        let b = created_id(100_000.0, 101_000.0);
        assert!(board_make_connection(a.clone(), b.clone()).ok);

        let hits = board_connections_crossing(100_200.0, 100_600.0, -100.0, -100.0);
        assert!(hits.iter().any(|line| line.from_id == a && line.to_id == b));
        assert!(board_connections_crossing(100_400.0, 100_500.0, 50.0, 50.0).is_empty());
    }

    #[test]
    fn duplicate_rejects_half_specified_origin() {
        ensure_board();
        let id = created_id(110_000.0, 110_000.0);

        let response = board_duplicate_notes(vec![id.clone()], Some(0.0), None);
        assert!(!response.ok);
        assert!(response.message.contains("origin"));

        let response = board_duplicate_notes(vec![id], Some(120_000.0), Some(120_000.0));
        assert!(response.ok, "{}", response.message);
        assert_eq!(board_note_at(120_001.0, 120_001.0), Some(response.note_ids[0].clone()));
    }
}
