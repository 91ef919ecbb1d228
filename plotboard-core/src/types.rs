use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata keys every card carries. Anything else lands in `extra`.
pub const METADATA_KEYS: &[&str] = &["id", "title", "notes", "tags", "color", "links"];

/// Generate a fresh card id (UUID v4, hyphenated).
pub fn generate_card_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Canonical card state, shared in shape with timeline cards.
///
/// Unknown keys found on load are kept in `extra` so they survive a
/// save/load cycle; they are never projected to the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardMetadata {
    /// Fresh default record for a new card. Always a new allocation with a
    /// new id; nothing is shared between cards.
    pub fn fresh(title: &str) -> Self {
        Self {
            id: generate_card_id(),
            title: title.to_string(),
            notes: String::new(),
            tags: Vec::new(),
            color: None,
            links: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Shallow defaulting merge: keys present in `partial` win, missing keys
    /// take their defaults. A missing `title` falls back to `fallback_title`,
    /// a missing `id` gets a freshly generated one.
    pub fn merge_defaults(partial: PartialMetadata, fallback_title: &str) -> Self {
        Self {
            id: partial.id.unwrap_or_else(generate_card_id),
            title: partial.title.unwrap_or_else(|| fallback_title.to_string()),
            notes: partial.notes.unwrap_or_default(),
            tags: partial.tags.unwrap_or_default(),
            color: partial.color.unwrap_or(None),
            links: partial.links.unwrap_or_default(),
            extra: partial.extra,
        }
    }
}

/// Metadata as supplied by a caller or found on disk, with any subset of the
/// canonical keys present.
///
/// `color` is doubly optional: `None` means the key was absent,
/// `Some(None)` means it was explicitly null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialMetadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<Option<String>>,
    pub links: Option<Vec<String>>,
    pub extra: Map<String, Value>,
}

impl PartialMetadata {
    /// Read metadata leniently from an untrusted JSON value.
    ///
    /// A missing or non-object value yields an empty record. Fields of the
    /// wrong type are coerced: `notes` to "", `tags`/`links` to an empty list
    /// (non-string list items are dropped), `color` to none. A non-string
    /// `id` or `title` counts as absent.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };

        let mut partial = Self::default();
        for (key, value) in obj {
            match key.as_str() {
                "id" => partial.id = value.as_str().map(str::to_string),
                "title" => partial.title = value.as_str().map(str::to_string),
                "notes" => partial.notes = Some(value.as_str().unwrap_or_default().to_string()),
                "tags" => partial.tags = Some(string_list(value)),
                "color" => partial.color = Some(value.as_str().map(str::to_string)),
                "links" => partial.links = Some(string_list(value)),
                _ => {
                    partial.extra.insert(key.clone(), value.clone());
                }
            }
        }
        partial
    }
}

/// Coerce a JSON value into a list of strings. Non-lists become empty.
pub(crate) fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// A unit of plot/idea content on the board.
///
/// The card id lives only in `metadata.id`, so the id and the metadata can
/// never disagree. `title` is the display string; `metadata.title` normally
/// mirrors it but legacy files may hold a different value.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    title: String,
    metadata: CardMetadata,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let metadata = CardMetadata::fresh(&title);
        Self { title, metadata }
    }

    /// Create a card from partial metadata, filling only the missing keys.
    pub fn with_metadata(title: impl Into<String>, partial: PartialMetadata) -> Self {
        let title = title.into();
        let metadata = CardMetadata::merge_defaults(partial, &title);
        Self { title, metadata }
    }

    /// Rebuild a card from complete metadata and its display title.
    pub fn from_parts(title: impl Into<String>, metadata: CardMetadata) -> Self {
        Self {
            title: title.into(),
            metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn metadata(&self) -> &CardMetadata {
        &self.metadata
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.metadata.title = title.clone();
        self.title = title;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.metadata.notes = notes.into();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.metadata.tags = tags;
    }

    pub fn set_color(&mut self, color: Option<String>) {
        self.metadata.color = color;
    }

    pub fn set_links(&mut self, links: Vec<String>) {
        self.metadata.links = links;
    }

    /// Set a non-canonical metadata key. Canonical keys are ignored here;
    /// they have dedicated setters.
    pub fn set_extra(&mut self, key: &str, value: Value) -> bool {
        if METADATA_KEYS.contains(&key) {
            return false;
        }
        self.metadata.extra.insert(key.to_string(), value);
        true
    }
}

/// A card as the timeline holds it. Same information as [`CardMetadata`]
/// except that notes are called `description` on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineCard {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "notes")]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}
