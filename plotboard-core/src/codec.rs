/// Board state codec.
///
/// Maps the in-memory board to a plain tree (column name -> ordered card
/// entries) and back. The tree is what gets persisted and what the undo
/// history stores. Decoding from disk is lenient: partially written or
/// hand-edited files load with defaults instead of failing.
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::board::Board;
use crate::types::{Card, CardMetadata, PartialMetadata};

/// One card as stored in a board file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardEntry {
    /// Legacy entry: the title alone, no metadata.
    LegacyTitle(String),
    Structured { title: String, metadata: CardMetadata },
}

impl CardEntry {
    pub fn title(&self) -> &str {
        match self {
            CardEntry::LegacyTitle(title) => title,
            CardEntry::Structured { title, .. } => title,
        }
    }

    /// Structured form of the entry. A legacy title gets fresh metadata,
    /// so call this once and keep the result.
    pub fn normalize(self) -> Self {
        match self {
            CardEntry::LegacyTitle(title) => {
                let metadata = CardMetadata::fresh(&title);
                CardEntry::Structured { title, metadata }
            }
            structured => structured,
        }
    }

    /// Normalise to a card. Legacy entries get fresh metadata.
    pub fn to_card(&self) -> Card {
        match self {
            CardEntry::LegacyTitle(title) => Card::new(title.clone()),
            CardEntry::Structured { title, metadata } => {
                Card::from_parts(title.clone(), metadata.clone())
            }
        }
    }
}

/// Immutable full copy of a board, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoardSnapshot {
    columns: IndexMap<String, Vec<CardEntry>>,
}

/// Titles-only view of a board, for quick diffing and logging.
pub type SummarySnapshot = IndexMap<String, Vec<String>>;

impl BoardSnapshot {
    pub fn from_columns(columns: IndexMap<String, Vec<CardEntry>>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[CardEntry])> {
        self.columns
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    pub fn column(&self, name: &str) -> Option<&[CardEntry]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// SHA-256 of the canonical JSON encoding, hex encoded.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Decode a persisted tree, coercing anything malformed. See
    /// [`decode_tree`] for the rules.
    pub fn from_value(value: &Value) -> Self {
        decode_tree(value).snapshot
    }
}

/// A decoded tree plus the number of cards that had no stored id.
#[derive(Debug, Clone, Default)]
pub struct DecodedTree {
    pub snapshot: BoardSnapshot,
    /// Cards given a fresh id during decoding (legacy titles, metadata
    /// without an id). Non-zero means the stored tree must be rewritten or
    /// those ids change on the next load.
    pub minted_ids: usize,
}

/// Decode a persisted tree, coercing anything malformed.
///
/// - non-object root: empty snapshot
/// - non-list column value: empty column
/// - string entry: legacy title, normalised to a structured entry with
///   fresh metadata
/// - object entry: `title` (non-string -> "") and `metadata`
///   (missing or non-object -> `{}`), then card defaulting
/// - any other entry is skipped
///
/// Ids are minted here, once, so every decode of the resulting snapshot
/// yields the same cards.
pub fn decode_tree(value: &Value) -> DecodedTree {
    let Some(root) = value.as_object() else {
        if !value.is_null() {
            log::warn!("[plotboard.codec.load] Board root is not an object, ignoring it");
        }
        return DecodedTree::default();
    };

    let mut minted_ids = 0;
    let mut columns = IndexMap::with_capacity(root.len());
    for (name, entries) in root {
        let cards = match entries.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|item| {
                    let (entry, minted) = parse_entry(name, item)?;
                    minted_ids += usize::from(minted);
                    Some(entry)
                })
                .collect(),
            None => {
                log::warn!(
                    "[plotboard.codec.load] Column {:?} is not a list, loading it empty",
                    name
                );
                Vec::new()
            }
        };
        columns.insert(name.clone(), cards);
    }
    DecodedTree {
        snapshot: BoardSnapshot { columns },
        minted_ids,
    }
}

/// One stored entry as a structured card entry, and whether its id was minted.
fn parse_entry(column: &str, value: &Value) -> Option<(CardEntry, bool)> {
    match value {
        Value::String(title) => Some((CardEntry::LegacyTitle(title.clone()).normalize(), true)),
        Value::Object(obj) => {
            let title = obj
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let partial = PartialMetadata::from_value(obj.get("metadata"));
            let minted = partial.id.is_none();
            let metadata = CardMetadata::merge_defaults(partial, &title);
            Some((CardEntry::Structured { title, metadata }, minted))
        }
        other => {
            log::warn!(
                "[plotboard.codec.load] Skipping unreadable card in column {:?}: {}",
                column,
                other
            );
            None
        }
    }
}

/// Full encoding: every card becomes `{title, metadata}`.
pub fn encode(board: &Board) -> BoardSnapshot {
    let columns = board
        .columns()
        .iter()
        .map(|col| {
            let entries = col
                .cards()
                .iter()
                .map(|card| CardEntry::Structured {
                    title: card.title().to_string(),
                    metadata: card.metadata().clone(),
                })
                .collect();
            (col.name().to_string(), entries)
        })
        .collect();
    BoardSnapshot { columns }
}

/// Lossy encoding: display titles only.
pub fn summarize(board: &Board) -> SummarySnapshot {
    board
        .columns()
        .iter()
        .map(|col| {
            let titles = col.cards().iter().map(|c| c.title().to_string()).collect();
            (col.name().to_string(), titles)
        })
        .collect()
}

/// Rebuild cards from a snapshot, column by column.
pub fn decode(snapshot: &BoardSnapshot) -> Vec<(String, Vec<Card>)> {
    snapshot
        .columns
        .iter()
        .map(|(name, entries)| (name.clone(), entries.iter().map(CardEntry::to_card).collect()))
        .collect()
}
