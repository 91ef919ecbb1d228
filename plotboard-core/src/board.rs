use std::collections::HashMap;

use crate::codec::{self, BoardSnapshot};
use crate::column::{Column, SelectionMode};
use crate::types::Card;

/// Columns a new board starts with.
pub const DEFAULT_COLUMNS: &[&str] = &["To Do", "In Progress", "Done"];

/// The full Kanban state: ordered columns plus a name index.
///
/// The index maps a column name to its position in `columns` and is rebuilt
/// whenever positions shift, so lookups by name never go stale.
#[derive(Debug, Clone)]
pub struct Board {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS.iter().copied())
    }
}

impl Board {
    /// Build a board with the given columns. Repeated names are skipped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut board = Self {
            columns: Vec::new(),
            index: HashMap::new(),
        };
        for name in names {
            board.add_column(name);
        }
        board
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let i = *self.index.get(name)?;
        self.columns.get_mut(i)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Add an empty column. Idempotent: false if the name already exists.
    pub fn add_column(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.columns.len());
        self.columns.push(Column::new(name));
        true
    }

    /// Relabel a column, keeping its cards and position.
    /// No-op when `old` is missing or `new` is already taken.
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        if old == new || self.index.contains_key(new) {
            return false;
        }
        let Some(i) = self.index.remove(old) else {
            return false;
        };
        self.columns[i].set_name(new.to_string());
        self.index.insert(new.to_string(), i);
        true
    }

    /// Remove a column together with all of its cards.
    pub fn delete_column(&mut self, name: &str) -> Option<Column> {
        let i = self.index.remove(name)?;
        let column = self.columns.remove(i);
        self.rebuild_index();
        Some(column)
    }

    pub fn move_card_within_column(&mut self, column: &str, from: usize, to: usize) -> bool {
        self.column_mut(column)
            .is_some_and(|col| col.move_within(from, to))
    }

    /// Move the card at `index` of `from` to the end of `to`, leaving it
    /// selected in its new column.
    pub fn move_card_between_columns(&mut self, from: &str, to: &str, index: usize) -> bool {
        let (Some(&src), Some(&dst)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        let Some(card) = self.columns[src].remove(index) else {
            return false;
        };
        let target = &mut self.columns[dst];
        target.add(card);
        target.select(target.len() - 1);
        true
    }

    /// Column name and position of the first card with this id.
    pub fn find_card(&self, id: &str) -> Option<(&str, usize)> {
        self.columns
            .iter()
            .find_map(|col| col.position(id).map(|i| (col.name(), i)))
    }

    pub fn card(&self, column: &str, index: usize) -> Option<&Card> {
        self.column(column)?.get(index)
    }

    pub fn card_mut(&mut self, column: &str, index: usize) -> Option<&mut Card> {
        self.column_mut(column)?.get_mut(index)
    }

    /// Every card, column by column, in display order.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.columns.iter().flat_map(|col| col.cards().iter())
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    /// Selected cards across all columns, in board order.
    pub fn selected_cards(&self) -> Vec<&Card> {
        self.columns
            .iter()
            .flat_map(|col| col.selected_cards())
            .collect()
    }

    pub fn enable_multi_selection(&mut self) {
        for col in &mut self.columns {
            col.set_selection_mode(SelectionMode::Multi);
        }
    }

    /// Full serialisable copy of the board.
    pub fn save_state(&self) -> BoardSnapshot {
        codec::encode(self)
    }

    /// Replace the board's columns and cards with the snapshot's content.
    ///
    /// The column set and order come from the snapshot. Columns that survive
    /// by name keep their selection mode and whatever selection still points
    /// at a card they contain.
    pub fn load_state(&mut self, snapshot: &BoardSnapshot) {
        let mut previous: HashMap<String, Column> = self
            .columns
            .drain(..)
            .map(|col| (col.name().to_string(), col))
            .collect();

        for (name, cards) in codec::decode(snapshot) {
            let mut column = previous.remove(&name).unwrap_or_else(|| Column::new(name));
            column.replace_cards(cards);
            self.columns.push(column);
        }
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| (col.name().to_string(), i))
            .collect();
    }
}
