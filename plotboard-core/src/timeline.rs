use serde_json::Value;

use crate::types::{string_list, TimelineCard};

/// The ordered card collection a board reconciles with.
///
/// Implementors own the cards; reconciliation only calls these methods, so a
/// UI can refresh its on-screen label in `replace_card`.
pub trait Timeline {
    fn cards(&self) -> &[TimelineCard];

    /// Add a new card. Implementations choose where it goes (end, date
    /// order, ...) and may decline it; callers look positions up afresh.
    fn push_card(&mut self, card: TimelineCard);

    /// Overwrite the card at `index` in place.
    fn replace_card(&mut self, index: usize, card: TimelineCard);

    fn remove_card(&mut self, index: usize) -> Option<TimelineCard>;

    fn position(&self, id: &str) -> Option<usize> {
        self.cards().iter().position(|c| c.id == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }
}

/// Plain in-memory timeline, persisted as a flat list of card objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineBoard {
    cards: Vec<TimelineCard>,
}

impl TimelineBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<TimelineCard>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card_ids(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&TimelineCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn add_card(&mut self, card: TimelineCard) {
        self.cards.push(card);
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<TimelineCard> {
        let index = self.position(id)?;
        self.remove_card(index)
    }

    /// Reorder: take the card at `from` and reinsert it at `to`.
    pub fn move_card(&mut self, from: usize, to: usize) -> bool {
        let len = self.cards.len();
        if from >= len || to >= len {
            return false;
        }
        let card = self.cards.remove(from);
        self.cards.insert(to, card);
        true
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.cards)
    }

    /// Load a persisted timeline. Entries that are not card objects with an
    /// id are skipped; a non-list root is an empty timeline.
    pub fn from_value(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            if !value.is_null() {
                log::warn!("[plotboard.timeline.load] Timeline root is not a list, ignoring it");
            }
            return Self::default();
        };
        let cards = items
            .iter()
            .filter_map(|item| match timeline_card_from_value(item) {
                Ok(card) => Some(card),
                Err(e) => {
                    log::warn!("[plotboard.timeline.load] Skipping timeline entry: {}", e);
                    None
                }
            })
            .collect();
        Self { cards }
    }
}

impl Timeline for TimelineBoard {
    fn cards(&self) -> &[TimelineCard] {
        &self.cards
    }

    fn push_card(&mut self, card: TimelineCard) {
        self.cards.push(card);
    }

    fn replace_card(&mut self, index: usize, card: TimelineCard) {
        if let Some(slot) = self.cards.get_mut(index) {
            *slot = card;
        }
    }

    fn remove_card(&mut self, index: usize) -> Option<TimelineCard> {
        (index < self.cards.len()).then(|| self.cards.remove(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("expected a card object, got {0}")]
    NotAnObject(&'static str),

    #[error("card metadata has no string id")]
    MissingId,
}

/// Project an untyped card payload to a timeline card.
///
/// Accepts either a serialized board card (`{title, metadata: {...}}`) or a
/// bare metadata object. Anything without that shape is a caller bug and is
/// reported as an error rather than coerced.
pub fn timeline_card_from_value(value: &Value) -> Result<TimelineCard, ProjectionError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ProjectionError::NotAnObject(json_kind(value)))?;

    let meta = match obj.get("metadata") {
        Some(Value::Object(meta)) => meta,
        Some(other) => return Err(ProjectionError::NotAnObject(json_kind(other))),
        None => obj,
    };

    let id = meta
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ProjectionError::MissingId)?;
    let title = meta
        .get("title")
        .or_else(|| obj.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = meta
        .get("description")
        .or_else(|| meta.get("notes"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(TimelineCard {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        tags: meta.get("tags").map(string_list).unwrap_or_default(),
        color: meta.get("color").and_then(Value::as_str).map(str::to_string),
        links: meta.get("links").map(string_list).unwrap_or_default(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tcard(id: &str, title: &str) -> TimelineCard {
        TimelineCard {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            tags: Vec::new(),
            color: None,
            links: Vec::new(),
        }
    }

    #[test]
    fn test_move_and_remove() {
        let mut timeline =
            TimelineBoard::from_cards(vec![tcard("a", "A"), tcard("b", "B"), tcard("c", "C")]);
        assert!(timeline.move_card(0, 2));
        assert_eq!(timeline.card_ids(), vec!["b", "c", "a"]);
        assert!(!timeline.move_card(0, 3));
        assert!(timeline.remove_by_id("c").is_some());
        assert!(timeline.remove_by_id("c").is_none());
        assert_eq!(timeline.card_ids(), vec!["b", "a"]);
    }

    #[test]
    fn test_replace_card_out_of_range_is_ignored() {
        let mut timeline = TimelineBoard::from_cards(vec![tcard("a", "A")]);
        timeline.replace_card(5, tcard("z", "Z"));
        assert_eq!(timeline.card_ids(), vec!["a"]);
        assert!(timeline.remove_card(5).is_none());
    }

    #[test]
    fn test_projection_from_serialized_card() {
        let value = json!({
            "title": "Display",
            "metadata": {"id": "id1", "title": "Test", "notes": "desc", "tags": ["t1"], "color": "#abc", "links": ["l1"], "foo": 1}
        });
        let card = timeline_card_from_value(&value).unwrap();
        assert_eq!(card.id, "id1");
        assert_eq!(card.title, "Test");
        assert_eq!(card.description, "desc");
        assert_eq!(card.tags, vec!["t1".to_string()]);
        assert_eq!(card.color.as_deref(), Some("#abc"));
        assert_eq!(card.links, vec!["l1".to_string()]);
    }

    #[test]
    fn test_projection_from_bare_metadata() {
        let card = timeline_card_from_value(&json!({"id": "t1", "title": "Old"})).unwrap();
        assert_eq!(card, tcard("t1", "Old"));
    }

    #[test]
    fn test_projection_rejects_wrong_shape() {
        assert_eq!(
            timeline_card_from_value(&json!("just a title")),
            Err(ProjectionError::NotAnObject("a string"))
        );
        assert_eq!(
            timeline_card_from_value(&json!({"metadata": [1]})),
            Err(ProjectionError::NotAnObject("a list"))
        );
        assert_eq!(
            timeline_card_from_value(&json!({"title": "no id"})),
            Err(ProjectionError::MissingId)
        );
    }

    #[test]
    fn test_from_value_skips_bad_entries() {
        let value = json!([
            {"id": "a", "title": "A", "notes": "n"},
            "bogus",
            {"title": "missing id"},
            {"id": "b", "title": "B", "description": "d"}
        ]);
        let timeline = TimelineBoard::from_value(&value);
        assert_eq!(timeline.card_ids(), vec!["a", "b"]);
        assert_eq!(timeline.get("a").unwrap().description, "n");
        assert_eq!(timeline.get("b").unwrap().description, "d");
    }

    #[test]
    fn test_to_value_uses_description() {
        let mut card = tcard("a", "A");
        card.description = "text".to_string();
        let value = TimelineBoard::from_cards(vec![card]).to_value().unwrap();
        assert_eq!(
            value,
            json!([{"id": "a", "title": "A", "description": "text", "tags": [], "color": null, "links": []}])
        );
    }
}
