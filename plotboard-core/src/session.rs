/// Editing session over one board.
///
/// Every user-facing mutation goes through here: the pre-mutation snapshot
/// is recorded for undo, the board graph is changed, and the autosave
/// debounce is re-armed. The host event loop drives autosave by calling
/// `poll_autosave` with the current time.
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::autosave::Debounce;
use crate::board::Board;
use crate::codec::{self, BoardSnapshot};
use crate::config::BoardConfig;
use crate::history::UndoHistory;
use crate::storage::{BoardStore, StoreError, KANBAN_KEY, TIMELINE_KEY};
use crate::sync::{self, ConvertOutcome, ConvertTally, SyncReport, SyncScope};
use crate::timeline::{Timeline, TimelineBoard};
use crate::types::Card;

const EVENT_CAPACITY: usize = 64;

/// Card changes and persistence outcomes published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    CardAdded { column: String, title: String },
    /// `title` is the card's display title after the edit.
    CardEdited { column: String, index: usize, title: String },
    CardDeleted { column: String, index: usize },
    /// Board written; `history` names the copy kept in the history store.
    Saved { history: String },
    /// An autosave write failed. The in-memory board is unchanged and the
    /// next trigger retries.
    SaveFailed { message: String },
    /// A history version was loaded into the board.
    Restored { version: String },
}

/// Yes/no prompt consulted before destructive deletions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Field changes for `edit_card`. `None` leaves a field alone; for `color`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardEdit {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub links: Option<Vec<String>>,
    pub color: Option<Option<String>>,
}

impl CardEdit {
    fn apply(self, card: &mut Card) {
        if let Some(title) = self.title {
            card.set_title(title);
        }
        if let Some(notes) = self.notes {
            card.set_notes(notes);
        }
        if let Some(tags) = self.tags {
            card.set_tags(tags);
        }
        if let Some(links) = self.links {
            card.set_links(links);
        }
        if let Some(color) = self.color {
            card.set_color(color);
        }
    }
}

/// Result of a board -> timeline or timeline -> board sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced(SyncReport),
    TimelineNotFound,
    ColumnNotFound,
}

pub struct BoardSession<S: BoardStore> {
    board: Board,
    history: UndoHistory,
    autosave: Debounce,
    loading: bool,
    store: S,
    timeline: Option<Box<dyn Timeline>>,
    events: broadcast::Sender<SessionEvent>,
    last_saved: Option<String>,
}

// Borrow only the timeline slot so the board stays readable alongside it.
fn timeline_slot(slot: &mut Option<Box<dyn Timeline>>) -> Option<&mut dyn Timeline> {
    match slot {
        Some(timeline) => Some(timeline.as_mut()),
        None => None,
    }
}

impl<S: BoardStore> BoardSession<S> {
    /// Start a session with the configured columns, then load whatever the
    /// store holds for the board. A persisted tree without columns keeps the
    /// configured defaults.
    pub fn open(store: S, config: &BoardConfig) -> Result<Self, StoreError> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut session = Self {
            board: Board::new(config.default_columns.iter().cloned()),
            history: UndoHistory::new(config.undo_limit),
            autosave: Debounce::new(config.autosave_delay()),
            loading: false,
            store,
            timeline: None,
            events,
            last_saved: None,
        };

        if let Some(tree) = session.store.load(KANBAN_KEY)? {
            let decoded = codec::decode_tree(&tree);
            if decoded.snapshot.is_empty() {
                log::info!("[plotboard.session.open] Stored board has no columns, using defaults");
            } else {
                session.load_state(&decoded.snapshot);
                log::info!(
                    "[plotboard.session.open] Loaded {} cards in {} columns",
                    session.board.card_count(),
                    session.board.columns().len()
                );
                if decoded.minted_ids > 0 {
                    session.write_back_minted_ids(decoded.minted_ids);
                } else {
                    session.last_saved = Some(session.board.save_state().fingerprint());
                }
            }
        }
        Ok(session)
    }

    /// Persist ids assigned while decoding so they survive the next load.
    /// Only the current board is rewritten; no history copy is made. On
    /// failure the autosave is armed to retry.
    fn write_back_minted_ids(&mut self, minted: usize) {
        let snapshot = self.board.save_state();
        let written = snapshot
            .to_value()
            .map_err(StoreError::from)
            .and_then(|tree| self.store.save(KANBAN_KEY, &tree));
        match written {
            Ok(()) => {
                self.last_saved = Some(snapshot.fingerprint());
                log::info!(
                    "[plotboard.session.open] Assigned ids to {} stored cards, board rewritten",
                    minted
                );
            }
            Err(e) => {
                log::warn!(
                    "[plotboard.session.open] Could not persist {} new card ids: {}",
                    minted,
                    e
                );
                self.trigger_autosave(Instant::now());
            }
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ---- state ----

    pub fn save_state(&self) -> BoardSnapshot {
        self.board.save_state()
    }

    /// Replace the board content. Runs under the loading guard so the load
    /// is neither recorded for undo nor scheduled for autosave.
    pub fn load_state(&mut self, snapshot: &BoardSnapshot) {
        let was_loading = std::mem::replace(&mut self.loading, true);
        self.board.load_state(snapshot);
        self.loading = was_loading;
    }

    /// Run a batch of edits under the loading guard.
    pub fn bulk_load<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let was_loading = std::mem::replace(&mut self.loading, true);
        let result = f(self);
        self.loading = was_loading;
        result
    }

    // ---- columns ----

    pub fn add_column(&mut self, name: &str) -> bool {
        if self.board.has_column(name) {
            return false;
        }
        self.push_undo();
        self.board.add_column(name);
        self.touch();
        true
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        if old == new || !self.board.has_column(old) || self.board.has_column(new) {
            return false;
        }
        self.push_undo();
        self.board.rename_column(old, new);
        self.touch();
        true
    }

    /// Delete a column and its cards once `confirm` agrees.
    pub fn delete_column(&mut self, name: &str, confirm: &mut dyn Confirm) -> bool {
        let Some(column) = self.board.column(name) else {
            return false;
        };
        let prompt = format!(
            "Delete column {:?} and its {} cards?",
            name,
            column.len()
        );
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.push_undo();
        self.board.delete_column(name);
        self.touch();
        true
    }

    // ---- cards ----

    /// Append a new card to `column`. Returns the new card's id.
    pub fn add_card(&mut self, column: &str, title: &str) -> Option<String> {
        if !self.board.has_column(column) {
            return None;
        }
        let card = Card::new(title);
        let id = card.id().to_string();
        self.push_undo();
        self.board.column_mut(column)?.add(card);
        self.touch();
        self.emit(SessionEvent::CardAdded {
            column: column.to_string(),
            title: title.to_string(),
        });
        Some(id)
    }

    /// Apply `edit` to one card. False when the card does not exist or the
    /// edit changes nothing.
    pub fn edit_card(&mut self, column: &str, index: usize, edit: CardEdit) -> bool {
        let Some(current) = self.board.card(column, index) else {
            return false;
        };
        let mut updated = current.clone();
        edit.apply(&mut updated);
        if &updated == current {
            return false;
        }
        let title = updated.title().to_string();
        self.push_undo();
        if let Some(slot) = self.board.card_mut(column, index) {
            *slot = updated;
        }
        self.touch();
        self.emit(SessionEvent::CardEdited {
            column: column.to_string(),
            index,
            title,
        });
        true
    }

    pub fn delete_card(&mut self, column: &str, index: usize, confirm: &mut dyn Confirm) -> bool {
        let Some(card) = self.board.card(column, index) else {
            return false;
        };
        let prompt = format!("Delete card {:?}?", card.title());
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.push_undo();
        if let Some(col) = self.board.column_mut(column) {
            col.remove(index);
        }
        self.touch();
        self.emit(SessionEvent::CardDeleted {
            column: column.to_string(),
            index,
        });
        true
    }

    pub fn move_card_within_column(&mut self, column: &str, from: usize, to: usize) -> bool {
        let Some(len) = self.board.column(column).map(|c| c.len()) else {
            return false;
        };
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }
        self.push_undo();
        self.board.move_card_within_column(column, from, to);
        self.touch();
        true
    }

    pub fn move_card_between_columns(&mut self, from: &str, to: &str, index: usize) -> bool {
        let Some(len) = self.board.column(from).map(|c| c.len()) else {
            return false;
        };
        if index >= len || !self.board.has_column(to) {
            return false;
        }
        self.push_undo();
        self.board.move_card_between_columns(from, to, index);
        self.touch();
        true
    }

    /// Selection is view state: not recorded for undo, not persisted.
    pub fn select_card(&mut self, column: &str, index: usize) -> bool {
        self.board
            .column_mut(column)
            .is_some_and(|col| col.select(index))
    }

    pub fn clear_selection(&mut self) {
        for col in self.board.columns_mut() {
            col.clear_selection();
        }
    }

    pub fn enable_multi_selection(&mut self) {
        self.board.enable_multi_selection();
    }

    // ---- undo / redo ----

    /// Record the current board before a mutation. No-op while loading.
    pub fn push_undo(&mut self) {
        if self.loading {
            return;
        }
        self.history.record(self.board.save_state());
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = self.board.save_state();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.load_state(&previous);
        self.touch();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = self.board.save_state();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.load_state(&next);
        self.touch();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- autosave ----

    /// Arm (or re-arm) the autosave debounce. No-op while loading.
    pub fn trigger_autosave(&mut self, now: Instant) {
        if self.loading {
            return;
        }
        self.autosave.trigger(now);
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    /// Fire the autosave if its deadline has passed. True when it fired,
    /// whether or not anything needed writing.
    pub fn poll_autosave(&mut self, now: Instant) -> bool {
        if !self.autosave.poll(now) {
            return false;
        }
        self.autosave_now();
        true
    }

    /// Run a pending autosave immediately, e.g. before shutdown.
    pub fn flush_autosave(&mut self) -> bool {
        if !self.autosave.cancel() {
            return false;
        }
        self.autosave_now();
        true
    }

    fn touch(&mut self) {
        self.trigger_autosave(Instant::now());
    }

    fn autosave_now(&mut self) {
        let snapshot = self.board.save_state();
        if self.last_saved.as_deref() == Some(snapshot.fingerprint().as_str()) {
            log::debug!("[plotboard.session.autosave] Board unchanged since last save, skipping");
            return;
        }
        match self.persist(&snapshot) {
            Ok(history) => self.emit(SessionEvent::Saved { history }),
            Err(e) => {
                log::error!("[plotboard.session.autosave] Autosave failed: {}", e);
                self.emit(SessionEvent::SaveFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    // ---- persistence ----

    /// Write the board now, regardless of pending autosave or changes.
    pub fn save(&mut self) -> Result<String, StoreError> {
        self.autosave.cancel();
        let snapshot = self.board.save_state();
        let history = self.persist(&snapshot)?;
        self.emit(SessionEvent::Saved {
            history: history.clone(),
        });
        Ok(history)
    }

    fn persist(&mut self, snapshot: &BoardSnapshot) -> Result<String, StoreError> {
        let tree = snapshot.to_value()?;
        self.store.save(KANBAN_KEY, &tree)?;
        let history = self.store.save_history(KANBAN_KEY, &tree)?;
        self.last_saved = Some(snapshot.fingerprint());
        log::info!("[plotboard.session.save] Saved board ({})", history);
        Ok(history)
    }

    /// History versions of the board, newest first.
    pub fn list_versions(&self) -> Result<Vec<String>, StoreError> {
        self.store.list_history(KANBAN_KEY)
    }

    pub fn load_version(&self, name: &str) -> Result<BoardSnapshot, StoreError> {
        let tree = self.store.load_history(KANBAN_KEY, name)?;
        Ok(BoardSnapshot::from_value(&tree))
    }

    /// Load a history version into the board as an undoable edit. False when
    /// the version is missing or empty.
    pub fn restore_version(&mut self, name: &str) -> Result<bool, StoreError> {
        let snapshot = self.load_version(name)?;
        if snapshot.is_empty() {
            log::warn!("[plotboard.session.restore] Version {} is empty or missing", name);
            return Ok(false);
        }
        self.push_undo();
        self.load_state(&snapshot);
        self.touch();
        self.emit(SessionEvent::Restored {
            version: name.to_string(),
        });
        Ok(true)
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            log::debug!("[plotboard.session.events] No subscribers");
        }
    }

    // ---- timeline ----

    pub fn attach_timeline(&mut self, timeline: Box<dyn Timeline>) {
        self.timeline = Some(timeline);
    }

    /// Attach the timeline persisted under the `timeline` key (empty when
    /// none was saved). Returns the number of cards loaded.
    pub fn attach_persisted_timeline(&mut self) -> Result<usize, StoreError> {
        let timeline = match self.store.load(TIMELINE_KEY)? {
            Some(tree) => TimelineBoard::from_value(&tree),
            None => TimelineBoard::new(),
        };
        let count = timeline.len();
        self.timeline = Some(Box::new(timeline));
        Ok(count)
    }

    pub fn detach_timeline(&mut self) -> Option<Box<dyn Timeline>> {
        self.timeline.take()
    }

    pub fn timeline(&self) -> Option<&dyn Timeline> {
        self.timeline.as_deref()
    }

    pub fn timeline_mut(&mut self) -> Option<&mut dyn Timeline> {
        timeline_slot(&mut self.timeline)
    }

    /// Persist the attached timeline's cards. Returns the history name, or
    /// `None` when no timeline is attached.
    pub fn save_timeline(&mut self) -> Result<Option<String>, StoreError> {
        let Some(timeline) = self.timeline.as_deref() else {
            return Ok(None);
        };
        let tree = serde_json::to_value(timeline.cards())?;
        self.store.save(TIMELINE_KEY, &tree)?;
        let history = self.store.save_history(TIMELINE_KEY, &tree)?;
        Ok(Some(history))
    }

    /// Make the timeline mirror the whole board, removing cards the board
    /// no longer has.
    pub fn sync_all_to_timeline(&mut self) -> SyncOutcome {
        let Some(timeline) = timeline_slot(&mut self.timeline) else {
            log::warn!("[plotboard.sync.timeline] No timeline attached");
            return SyncOutcome::TimelineNotFound;
        };
        SyncOutcome::Synced(sync::sync_cards_to_timeline(
            self.board.all_cards(),
            timeline,
            SyncScope::Authoritative,
        ))
    }

    /// Push one column's cards. Timeline cards from elsewhere are kept.
    pub fn sync_column_to_timeline(&mut self, column: &str) -> SyncOutcome {
        let Some(col) = self.board.column(column) else {
            return SyncOutcome::ColumnNotFound;
        };
        let Some(timeline) = timeline_slot(&mut self.timeline) else {
            log::warn!("[plotboard.sync.timeline] No timeline attached");
            return SyncOutcome::TimelineNotFound;
        };
        SyncOutcome::Synced(sync::sync_cards_to_timeline(
            col.cards(),
            timeline,
            SyncScope::Partial,
        ))
    }

    /// Push the selected cards only. Nothing is removed from the timeline.
    pub fn sync_selected_to_timeline(&mut self) -> SyncOutcome {
        let Some(timeline) = timeline_slot(&mut self.timeline) else {
            log::warn!("[plotboard.sync.timeline] No timeline attached");
            return SyncOutcome::TimelineNotFound;
        };
        SyncOutcome::Synced(sync::sync_cards_to_timeline(
            self.board.selected_cards(),
            timeline,
            SyncScope::Partial,
        ))
    }

    /// Add one card to the timeline if it is not there yet. `None` when the
    /// card does not exist.
    pub fn convert_card_to_timeline(&mut self, column: &str, index: usize) -> Option<ConvertOutcome> {
        let card = self.board.card(column, index)?;
        Some(sync::convert_card_to_timeline(
            card,
            timeline_slot(&mut self.timeline),
        ))
    }

    /// Add every board card missing from the timeline; existing ones are
    /// counted, not updated.
    pub fn convert_all_to_timeline(&mut self) -> ConvertTally {
        let tally = sync::convert_cards_to_timeline(
            self.board.all_cards(),
            timeline_slot(&mut self.timeline),
        );
        log::info!(
            "[plotboard.sync.timeline] Converted {} cards, {} already present, {} failed",
            tally.synced,
            tally.already,
            tally.failed
        );
        tally
    }

    /// Pull timeline edits into the board. Undoable; records and autosaves
    /// only when the board actually changed.
    pub fn sync_timeline_to_board(&mut self) -> SyncOutcome {
        let Some(timeline) = self.timeline.as_deref() else {
            log::warn!("[plotboard.sync.board] No timeline attached");
            return SyncOutcome::TimelineNotFound;
        };
        let cards = timeline.cards().to_vec();
        let before = self.board.save_state();
        let report = sync::sync_timeline_to_board(&cards, &mut self.board);

        if self.board.save_state().fingerprint() != before.fingerprint() && !self.loading {
            self.history.record(before);
            self.touch();
        }
        SyncOutcome::Synced(report)
    }
}
