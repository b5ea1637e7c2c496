use serde::{Deserialize, Serialize};

use crate::types::Record;

/// Shown in place of a missing description.
pub const NO_DESCRIPTION: &str = "No description provided.";

/// Identifies one rendered card. Keys from an older render are never valid
/// in a newer one, which is how stale popover anchors are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardKey {
    pub generation: u64,
    pub index: usize,
}

/// Display unit for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCard {
    pub key: CardKey,
    pub title: String,
    /// Category then location.
    pub badges: [String; 2],
    pub description: String,
}

/// Output of one render pass. Always replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedList {
    pub generation: u64,
    pub empty_state_visible: bool,
    pub cards: Vec<RecordCard>,
}

impl RenderedList {
    pub fn contains(&self, key: CardKey) -> bool {
        key.generation == self.generation && key.index < self.cards.len()
    }
}

/// Build the display list for `items`. An empty input shows the empty state
/// and no cards.
pub fn render(items: &[Record], generation: u64) -> RenderedList {
    let cards = items
        .iter()
        .enumerate()
        .map(|(index, record)| RecordCard {
            key: CardKey { generation, index },
            title: record.name.clone(),
            badges: [record.category.clone(), record.location.clone()],
            description: record
                .description
                .clone()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        })
        .collect::<Vec<_>>();

    RenderedList {
        generation,
        empty_state_visible: cards.is_empty(),
        cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_shows_empty_state() {
        let list = render(&[], 1);
        assert!(list.empty_state_visible);
        assert!(list.cards.is_empty());
    }

    #[test]
    fn one_card_per_record_with_badges_and_fallback_text() {
        let items = vec![
            Record {
                id: None,
                name: "Joe's Cafe".to_string(),
                category: "Food".to_string(),
                location: "Main St".to_string(),
                description: None,
            },
            Record {
                id: None,
                name: "Bolt Hardware".to_string(),
                category: "Retail".to_string(),
                location: "5th Ave".to_string(),
                description: Some("Keys cut".to_string()),
            },
        ];
        let list = render(&items, 7);
        assert!(!list.empty_state_visible);
        assert_eq!(list.cards.len(), 2);
        assert_eq!(list.cards[0].title, "Joe's Cafe");
        assert_eq!(list.cards[0].badges, ["Food".to_string(), "Main St".to_string()]);
        assert_eq!(list.cards[0].description, NO_DESCRIPTION);
        assert_eq!(list.cards[1].description, "Keys cut");
        assert_eq!(list.cards[1].key, CardKey { generation: 7, index: 1 });
    }

    #[test]
    fn keys_from_an_older_render_are_rejected() {
        let items = vec![Record {
            id: None,
            name: "A".to_string(),
            category: "B".to_string(),
            location: "C".to_string(),
            description: None,
        }];
        let old = render(&items, 1);
        let new = render(&items, 2);
        assert!(old.contains(old.cards[0].key));
        assert!(!new.contains(old.cards[0].key));
        assert!(!new.contains(CardKey { generation: 2, index: 5 }));
    }
}
