use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Card;

/// How a column treats `select` calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Selecting a card replaces the previous selection.
    Single,
    /// Selections accumulate; used for bulk operations.
    #[default]
    Multi,
}

/// A named, ordered bucket of cards.
///
/// Card order is the display/priority order. Uniqueness of `name` is the
/// owning board's concern, so renaming is only reachable through
/// [`crate::board::Board::rename_column`].
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    cards: Vec<Card>,
    selection_mode: SelectionMode,
    /// Selected card ids.
    selected: HashSet<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cards: Vec::new(),
            selection_mode: SelectionMode::default(),
            selected: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.cards.get_mut(index)
    }

    /// Index of the first card with this id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id() == id)
    }

    /// Append a card. Ids are not checked for duplicates here.
    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Insert at `index`, or append when `index` is past the end.
    pub fn insert(&mut self, index: usize, card: Card) {
        let index = index.min(self.cards.len());
        self.cards.insert(index, card);
    }

    /// Remove the card at `index`. `None` when out of range.
    pub fn remove(&mut self, index: usize) -> Option<Card> {
        if index >= self.cards.len() {
            return None;
        }
        let card = self.cards.remove(index);
        self.forget_selection(card.id());
        Some(card)
    }

    /// Remove the first card with this id.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Card> {
        let index = self.position(id)?;
        self.remove(index)
    }

    /// Move a card within the column. Both indices must be in `[0, len)`.
    pub fn move_within(&mut self, from: usize, to: usize) -> bool {
        let len = self.cards.len();
        if from >= len || to >= len {
            return false;
        }
        let card = self.cards.remove(from);
        self.cards.insert(to, card);
        true
    }

    pub(crate) fn replace_cards(&mut self, cards: Vec<Card>) {
        self.cards = cards;
        let ids: HashSet<&str> = self.cards.iter().map(Card::id).collect();
        self.selected.retain(|id| ids.contains(id.as_str()));
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Switching to `Single` keeps at most one selected card.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.selection_mode = mode;
        if mode == SelectionMode::Single && self.selected.len() > 1 {
            let keep = self
                .cards
                .iter()
                .map(Card::id)
                .find(|id| self.selected.contains(*id))
                .map(str::to_string);
            self.selected.clear();
            self.selected.extend(keep);
        }
    }

    /// Select the card at `index`. False when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(card) = self.cards.get(index) else {
            return false;
        };
        let id = card.id().to_string();
        if self.selection_mode == SelectionMode::Single {
            self.selected.clear();
        }
        self.selected.insert(id);
        true
    }

    pub fn deselect(&mut self, index: usize) -> bool {
        match self.cards.get(index) {
            Some(card) => self.selected.remove(card.id()),
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.cards
            .get(index)
            .is_some_and(|c| self.selected.contains(c.id()))
    }

    /// Selected cards in column order.
    pub fn selected_cards(&self) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|c| self.selected.contains(c.id()))
            .collect()
    }

    fn forget_selection(&mut self, id: &str) {
        if !self.cards.iter().any(|c| c.id() == id) {
            self.selected.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_with(titles: &[&str]) -> Column {
        let mut col = Column::new("Col");
        for t in titles {
            col.add(Card::new(*t));
        }
        col
    }

    fn titles(col: &Column) -> Vec<&str> {
        col.cards().iter().map(Card::title).collect()
    }

    #[test]
    fn test_add_appends_without_dedup() {
        let mut col = Column::new("Col");
        let card = Card::new("A");
        col.add(card.clone());
        col.add(card);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn test_move_within() {
        let mut col = column_with(&["A", "B", "C"]);
        assert!(col.move_within(0, 2));
        assert_eq!(titles(&col), vec!["B", "C", "A"]);
        assert!(col.move_within(2, 0));
        assert_eq!(titles(&col), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_move_within_out_of_range() {
        let mut col = column_with(&["A", "B"]);
        assert!(!col.move_within(0, 2));
        assert!(!col.move_within(5, 0));
        assert_eq!(titles(&col), vec!["A", "B"]);
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut col = column_with(&["A"]);
        assert!(col.remove(1).is_none());
        assert_eq!(col.remove(0).map(|c| c.title().to_string()), Some("A".to_string()));
        assert!(col.is_empty());
    }

    #[test]
    fn test_remove_by_id() {
        let mut col = column_with(&["A", "B"]);
        let id = col.cards()[1].id().to_string();
        assert!(col.remove_by_id(&id).is_some());
        assert!(col.remove_by_id(&id).is_none());
        assert_eq!(titles(&col), vec!["A"]);
    }

    #[test]
    fn test_insert_clamps() {
        let mut col = column_with(&["A"]);
        col.insert(10, Card::new("B"));
        col.insert(0, Card::new("Z"));
        assert_eq!(titles(&col), vec!["Z", "A", "B"]);
    }

    #[test]
    fn test_default_selection_is_multi() {
        let mut col = column_with(&["A", "B", "C"]);
        assert_eq!(col.selection_mode(), SelectionMode::Multi);
        assert!(col.select(0));
        assert!(col.select(2));
        let selected: Vec<&str> = col.selected_cards().iter().map(|c| c.title()).collect();
        assert_eq!(selected, vec!["A", "C"]);
    }

    #[test]
    fn test_single_selection_replaces() {
        let mut col = column_with(&["A", "B"]);
        col.set_selection_mode(SelectionMode::Single);
        col.select(0);
        col.select(1);
        assert!(!col.is_selected(0));
        assert!(col.is_selected(1));
    }

    #[test]
    fn test_switch_to_single_keeps_first_selected() {
        let mut col = column_with(&["A", "B", "C"]);
        col.select(2);
        col.select(1);
        col.set_selection_mode(SelectionMode::Single);
        assert_eq!(col.selected_cards().len(), 1);
        assert!(col.is_selected(1));
    }

    #[test]
    fn test_selection_empty() {
        let col = column_with(&["A", "B"]);
        assert!(col.selected_cards().is_empty());
    }

    #[test]
    fn test_selection_follows_card_on_move() {
        let mut col = column_with(&["A", "B", "C"]);
        col.select(0);
        col.move_within(0, 2);
        assert!(col.is_selected(2));
        assert!(!col.is_selected(0));
    }

    #[test]
    fn test_removed_card_leaves_selection() {
        let mut col = column_with(&["A", "B"]);
        col.select(0);
        col.remove(0);
        assert!(col.selected_cards().is_empty());
    }
}
