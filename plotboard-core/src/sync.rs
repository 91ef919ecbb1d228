/// Id-keyed reconciliation between board cards and a timeline.
///
/// Board -> timeline: update known ids in place, append new ones and, for an
/// authoritative source set, remove timeline cards that were not seen.
/// Timeline -> board: update known ids, append unknown ones to the first
/// column, never delete.
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::board::Board;
use crate::timeline::Timeline;
use crate::types::{Card, CardMetadata, TimelineCard};

/// Whether a board -> timeline sync owns the whole timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncScope {
    /// The source is every card on the board: timeline cards whose id is
    /// not in the source are removed.
    Authoritative,
    /// The source is a subset (one column, a selection): nothing is removed.
    Partial,
}

/// Counts from one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    /// Source entries skipped because their id already appeared earlier in
    /// the same pass.
    pub duplicates: usize,
    /// Timeline cards that could not be placed because the board has no
    /// columns.
    pub unplaced: usize,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.created + self.updated + self.removed > 0
    }
}

/// Result of converting a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertOutcome {
    Created,
    AlreadyExists,
    TimelineNotFound,
}

/// Tally of a bulk conversion. Failures are counted, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConvertTally {
    pub synced: usize,
    pub already: usize,
    pub failed: usize,
}

impl ConvertTally {
    fn record(&mut self, outcome: ConvertOutcome) {
        match outcome {
            ConvertOutcome::Created => self.synced += 1,
            ConvertOutcome::AlreadyExists => self.already += 1,
            ConvertOutcome::TimelineNotFound => self.failed += 1,
        }
    }
}

/// Timeline-shape projection of a card. `notes` becomes `description`;
/// non-canonical metadata keys are dropped.
pub fn card_to_timeline(card: &Card) -> TimelineCard {
    let meta = card.metadata();
    TimelineCard {
        id: meta.id.clone(),
        title: meta.title.clone(),
        description: meta.notes.clone(),
        tags: meta.tags.clone(),
        color: meta.color.clone(),
        links: meta.links.clone(),
    }
}

/// Push board cards into the timeline.
///
/// Within one call the first occurrence of an id wins; later duplicates are
/// no-ops. With [`SyncScope::Authoritative`] every timeline card whose id was
/// not seen is removed afterwards.
pub fn sync_cards_to_timeline<'a, I>(
    cards: I,
    timeline: &mut dyn Timeline,
    scope: SyncScope,
) -> SyncReport
where
    I: IntoIterator<Item = &'a Card>,
{
    let mut report = SyncReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    for card in cards {
        if !seen.insert(card.id().to_string()) {
            report.duplicates += 1;
            continue;
        }
        let projected = card_to_timeline(card);
        // Positions are looked up per card: push_card may place a card anywhere.
        match timeline.position(card.id()) {
            Some(i) => {
                if timeline.cards()[i] == projected {
                    report.unchanged += 1;
                } else {
                    timeline.replace_card(i, projected);
                    report.updated += 1;
                }
            }
            None => {
                timeline.push_card(projected);
                report.created += 1;
            }
        }
    }

    if scope == SyncScope::Authoritative {
        for i in (0..timeline.cards().len()).rev() {
            if !seen.contains(&timeline.cards()[i].id) {
                if let Some(removed) = timeline.remove_card(i) {
                    log::debug!(
                        "[plotboard.sync.timeline] Removed timeline card {} ({:?})",
                        removed.id,
                        removed.title
                    );
                    report.removed += 1;
                }
            }
        }
    }

    log::info!(
        "[plotboard.sync.timeline] {:?} sync: {} created, {} updated, {} removed, {} duplicates",
        scope,
        report.created,
        report.updated,
        report.removed,
        report.duplicates
    );
    report
}

/// Add one card to the timeline unless its id is already there. Existing
/// cards are reported, not updated.
pub fn convert_card_to_timeline(card: &Card, target: Option<&mut dyn Timeline>) -> ConvertOutcome {
    match target {
        Some(timeline) => add_if_missing(card, timeline),
        None => ConvertOutcome::TimelineNotFound,
    }
}

/// Convert many cards one by one and tally the outcomes.
pub fn convert_cards_to_timeline<'a, I>(cards: I, target: Option<&mut dyn Timeline>) -> ConvertTally
where
    I: IntoIterator<Item = &'a Card>,
{
    let mut tally = ConvertTally::default();
    match target {
        Some(timeline) => {
            for card in cards {
                tally.record(add_if_missing(card, &mut *timeline));
            }
        }
        None => {
            for _ in cards {
                tally.record(ConvertOutcome::TimelineNotFound);
            }
        }
    }
    tally
}

fn add_if_missing(card: &Card, timeline: &mut dyn Timeline) -> ConvertOutcome {
    if timeline.contains(card.id()) {
        return ConvertOutcome::AlreadyExists;
    }
    timeline.push_card(card_to_timeline(card));
    ConvertOutcome::Created
}

/// Pull timeline cards into the board.
///
/// Known ids update the existing card's metadata and display title in
/// place; unknown ids are appended to the first column. Board cards missing
/// from the timeline are left alone.
pub fn sync_timeline_to_board(cards: &[TimelineCard], board: &mut Board) -> SyncReport {
    let mut report = SyncReport::default();
    let mut index: HashMap<String, (usize, usize)> = HashMap::new();
    for (c, col) in board.columns().iter().enumerate() {
        for (i, card) in col.cards().iter().enumerate() {
            index.entry(card.id().to_string()).or_insert((c, i));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for tc in cards {
        if !seen.insert(tc.id.as_str()) {
            report.duplicates += 1;
            continue;
        }
        match index.get(&tc.id) {
            Some(&(c, i)) => {
                let Some(card) = board.columns_mut()[c].get_mut(i) else {
                    continue;
                };
                if apply_timeline_card(card, tc) {
                    report.updated += 1;
                } else {
                    report.unchanged += 1;
                }
            }
            None => {
                let Some(first) = board.columns_mut().first_mut() else {
                    report.unplaced += 1;
                    continue;
                };
                first.add(card_from_timeline(tc));
                index.insert(tc.id.clone(), (0, first.len() - 1));
                report.created += 1;
            }
        }
    }

    if report.unplaced > 0 {
        log::warn!(
            "[plotboard.sync.board] Board has no columns, {} timeline cards not placed",
            report.unplaced
        );
    }
    report
}

fn card_from_timeline(tc: &TimelineCard) -> Card {
    let mut metadata = CardMetadata::fresh(&tc.title);
    metadata.id = tc.id.clone();
    metadata.notes = tc.description.clone();
    metadata.tags = tc.tags.clone();
    metadata.color = tc.color.clone();
    metadata.links = tc.links.clone();
    Card::from_parts(tc.title.clone(), metadata)
}

/// Copy timeline fields onto a board card. Returns whether anything changed.
fn apply_timeline_card(card: &mut Card, tc: &TimelineCard) -> bool {
    if card_to_timeline(card) == *tc && card.title() == tc.title {
        return false;
    }
    card.set_title(tc.title.clone());
    card.set_notes(tc.description.clone());
    card.set_tags(tc.tags.clone());
    card.set_color(tc.color.clone());
    card.set_links(tc.links.clone());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineBoard;
    use crate::types::PartialMetadata;

    fn card(id: &str, title: &str) -> Card {
        Card::with_metadata(
            title,
            PartialMetadata {
                id: Some(id.to_string()),
                title: Some(title.to_string()),
                ..Default::default()
            },
        )
    }

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
    fn test_projection_all_fields() {
        let mut c = card("id1", "Test");
        c.set_notes("desc");
        c.set_tags(vec!["t1".to_string(), "t2".to_string()]);
        c.set_color(Some("#abc".to_string()));
        c.set_links(vec!["l1".to_string()]);
        c.set_extra("foo", serde_json::json!(123));

        let t = card_to_timeline(&c);
        assert_eq!(t.id, "id1");
        assert_eq!(t.title, "Test");
        assert_eq!(t.description, "desc");
        assert_eq!(t.tags, vec!["t1".to_string(), "t2".to_string()]);
        assert_eq!(t.color.as_deref(), Some("#abc"));
        assert_eq!(t.links, vec!["l1".to_string()]);
    }

    #[test]
    fn test_projection_defaults() {
        let t = card_to_timeline(&card("id2", "Edge"));
        assert_eq!(t.description, "");
        assert!(t.tags.is_empty());
        assert_eq!(t.color, None);
        assert!(t.links.is_empty());
    }

    #[test]
    fn test_sync_creates_then_updates_then_deletes() {
        let mut timeline = TimelineBoard::new();
        let k1 = card("id1", "A");
        let k2 = card("id2", "B");

        let report = sync_cards_to_timeline([&k1, &k2], &mut timeline, SyncScope::Authoritative);
        assert_eq!(report.created, 2);
        assert_eq!(timeline.len(), 2);

        let k1_renamed = card("id1", "A2");
        let report =
            sync_cards_to_timeline([&k1_renamed, &k2], &mut timeline, SyncScope::Authoritative);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.get("id1").unwrap().title, "A2");

        let report = sync_cards_to_timeline([&k1_renamed], &mut timeline, SyncScope::Authoritative);
        assert_eq!(report.removed, 1);
        assert_eq!(timeline.card_ids(), vec!["id1"]);
    }

    #[test]
    fn test_sync_duplicate_ids_collapse() {
        let mut timeline = TimelineBoard::new();
        let k1 = card("id1", "A");
        let k2 = card("id1", "A copy");
        let report = sync_cards_to_timeline([&k1, &k2], &mut timeline, SyncScope::Authoritative);
        assert_eq!(report.created, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.get("id1").unwrap().title, "A");

        let k3 = card("id2", "B");
        sync_cards_to_timeline([&k1, &k3], &mut timeline, SyncScope::Authoritative);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_sync_updates_description_from_notes() {
        let mut timeline = TimelineBoard::from_cards(vec![tcard("t1", "Old")]);
        let mut k = card("t1", "New");
        k.set_notes("n");
        sync_cards_to_timeline([&k], &mut timeline, SyncScope::Authoritative);
        assert_eq!(timeline.len(), 1);
        let t = timeline.get("t1").unwrap();
        assert_eq!(t.title, "New");
        assert_eq!(t.description, "n");
    }

    #[test]
    fn test_partial_sync_never_removes() {
        let mut timeline = TimelineBoard::from_cards(vec![tcard("a", "A"), tcard("b", "B")]);
        let a = card("a", "A");
        let report = sync_cards_to_timeline([&a], &mut timeline, SyncScope::Partial);
        assert_eq!(report.removed, 0);
        assert_eq!(timeline.card_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_authoritative_sync_removes_unseen() {
        let mut timeline = TimelineBoard::from_cards(vec![tcard("a", "A"), tcard("b", "B")]);
        let a = card("a", "A");
        sync_cards_to_timeline([&a], &mut timeline, SyncScope::Authoritative);
        assert_eq!(timeline.card_ids(), vec!["a"]);
    }

    #[test]
    fn test_convert_single_card() {
        let mut timeline = TimelineBoard::new();
        let mut k = card("x", "X");
        assert_eq!(
            convert_card_to_timeline(&k, Some(&mut timeline)),
            ConvertOutcome::Created
        );
        k.set_title("X renamed");
        assert_eq!(
            convert_card_to_timeline(&k, Some(&mut timeline)),
            ConvertOutcome::AlreadyExists
        );
        assert_eq!(timeline.get("x").unwrap().title, "X");
        assert_eq!(
            convert_card_to_timeline(&k, None),
            ConvertOutcome::TimelineNotFound
        );
    }

    #[test]
    fn test_convert_tally() {
        let mut timeline = TimelineBoard::from_cards(vec![tcard("a", "A")]);
        let cards = [card("a", "A"), card("b", "B"), card("b", "B again")];
        let tally = convert_cards_to_timeline(cards.iter(), Some(&mut timeline));
        assert_eq!(
            tally,
            ConvertTally {
                synced: 1,
                already: 2,
                failed: 0
            }
        );

        let tally = convert_cards_to_timeline(cards.iter(), None);
        assert_eq!(tally.failed, 3);
    }

    #[test]
    fn test_timeline_to_board_updates_and_appends() {
        let mut board = Board::new(["To Do", "Done"]);
        board.column_mut("Done").unwrap().add(card("k1", "Old"));

        let mut updated = tcard("k1", "New");
        updated.description = "from timeline".to_string();
        let fresh = tcard("t9", "Fresh");

        let report = sync_timeline_to_board(&[updated, fresh], &mut board);
        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 1);

        let k1 = board.card("Done", 0).unwrap();
        assert_eq!(k1.title(), "New");
        assert_eq!(k1.metadata().title, "New");
        assert_eq!(k1.metadata().notes, "from timeline");

        let t9 = board.card("To Do", 0).unwrap();
        assert_eq!(t9.id(), "t9");
        assert_eq!(t9.title(), "Fresh");
    }

    #[test]
    fn test_timeline_to_board_never_deletes() {
        let mut board = Board::new(["To Do"]);
        board.column_mut("To Do").unwrap().add(card("only-on-board", "Keep"));
        let report = sync_timeline_to_board(&[], &mut board);
        assert_eq!(report, SyncReport::default());
        assert_eq!(board.card_count(), 1);
    }

    #[test]
    fn test_timeline_to_board_without_columns() {
        let mut board = Board::new(Vec::<String>::new());
        let report = sync_timeline_to_board(&[tcard("a", "A")], &mut board);
        assert_eq!(report.unplaced, 1);
        assert_eq!(board.card_count(), 0);
    }

    #[test]
    fn test_timeline_to_board_keeps_extra_metadata() {
        let mut board = Board::new(["To Do"]);
        let mut k = card("k1", "Old");
        k.set_extra("priority", serde_json::json!(3));
        board.column_mut("To Do").unwrap().add(k);

        sync_timeline_to_board(&[tcard("k1", "New")], &mut board);
        let k = board.card("To Do", 0).unwrap();
        assert_eq!(k.metadata().extra.get("priority"), Some(&serde_json::json!(3)));
    }

    /// Inserts new cards at the front, like a newest-first view.
    #[derive(Default)]
    struct FrontInserting {
        cards: Vec<TimelineCard>,
    }

    impl Timeline for FrontInserting {
        fn cards(&self) -> &[TimelineCard] {
            &self.cards
        }
        fn push_card(&mut self, card: TimelineCard) {
            self.cards.insert(0, card);
        }
        fn replace_card(&mut self, index: usize, card: TimelineCard) {
            self.cards[index] = card;
        }
        fn remove_card(&mut self, index: usize) -> Option<TimelineCard> {
            (index < self.cards.len()).then(|| self.cards.remove(index))
        }
    }

    #[test]
    fn test_sync_with_timeline_that_inserts_at_front() {
        let mut timeline = FrontInserting::default();
        let a = card("a", "A");
        let b = card("b", "B");
        let report = sync_cards_to_timeline([&a, &b], &mut timeline, SyncScope::Partial);
        assert_eq!(report.created, 2);

        let mut a2 = a.clone();
        a2.set_title("A2");
        let report = sync_cards_to_timeline([&a2, &b], &mut timeline, SyncScope::Authoritative);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.removed, 0);

        let titles: Vec<(&str, &str)> = timeline
            .cards()
            .iter()
            .map(|c| (c.id.as_str(), c.title.as_str()))
            .collect();
        assert_eq!(titles, vec![("b", "B"), ("a", "A2")]);
    }
}
