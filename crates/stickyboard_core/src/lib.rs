//! Core board model for StickyBoard.
//! This crate is the single source of truth for board invariants.

pub mod config;
pub mod db;
pub mod geometry;
pub mod logging;
pub mod menu;
pub mod model;
pub mod observer;
pub mod repo;
pub mod service;

pub use config::BoardConfig;
pub use geometry::{
    fix_negative_rectangle, line_rect_collision, rect_centre, rect_collision, rect_inside, Line,
    Point, Rect,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use menu::{ContextMenu, MenuAction, MenuItem, MenuSignal};
pub use model::board::{BoardExtent, ConnectionLine, Connections, NotesState, BOARD_PADDING};
pub use model::note::{Note, NoteId, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH};
pub use observer::ObserverId;
pub use repo::board_repo::{BoardRepository, LoadedBoard, CONNECTIONS_SLOT, NOTES_SLOT};
pub use repo::slot_store::{MemorySlotStore, SlotStore, SqliteSlotStore};
pub use repo::{RepoError, RepoResult};
pub use service::board_store::{
    BoardError, BoardObserver, BoardResult, BoardStore, BoardView, ChangeSet, DUPLICATE_OFFSET,
};

use db::{open_db, open_db_in_memory};

/// Board store persisted in a SQLite slot table.
pub type SqliteBoardStore = BoardStore<SqliteSlotStore>;

/// Opens the board database at `config.db_path` and rehydrates the board.
pub fn open_board(config: &BoardConfig) -> RepoResult<SqliteBoardStore> {
    let conn = open_db(&config.db_path)?;
    let slots = SqliteSlotStore::try_new(conn)?;
    Ok(BoardStore::open(slots))
}

/// Opens an in-memory SQLite board, used by previews and tests.
pub fn open_board_in_memory() -> RepoResult<SqliteBoardStore> {
    let conn = open_db_in_memory()?;
    let slots = SqliteSlotStore::try_new(conn)?;
    Ok(BoardStore::open(slots))
}

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
