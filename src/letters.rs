//! Archive of AI-generated letters
//!
//! Stored at `ai.generatedLetters`, newest first, capped at 20 entries.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::platform::unique_millis;
use crate::store::StateStore;

/// Maximum number of letters kept
pub const MAX_GENERATED_LETTERS: usize = 20;

pub const AI_PATH: &str = "ai";
pub const LETTERS_PATH: &str = "ai.generatedLetters";

/// What the text generator was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LetterKind {
    Poem,
    #[default]
    Letter,
    Message,
    /// Anything a newer page script wrote that this build does not know
    #[serde(other)]
    Other,
}

impl LetterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterKind::Poem => "poem",
            LetterKind::Letter => "letter",
            LetterKind::Message => "message",
            LetterKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "poem" => Some(LetterKind::Poem),
            "letter" => Some(LetterKind::Letter),
            "message" | "msg" => Some(LetterKind::Message),
            _ => None,
        }
    }
}

/// A stored letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedLetter {
    /// Creation time in epoch milliseconds, unique within the archive
    pub id: i64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: LetterKind,
    pub theme: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    pub is_favorite: bool,
}

/// Fresh output from the generator
#[derive(Debug, Clone, PartialEq)]
pub struct LetterDraft {
    pub content: String,
    pub kind: LetterKind,
    pub theme: String,
}

/// Letter operations over a store
#[derive(Debug, Clone)]
pub struct LetterArchive {
    store: StateStore,
}

impl LetterArchive {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Create the `ai` section if this is the first visit
    pub fn init(&self) {
        if !self.store.contains(AI_PATH) {
            self.store.set(
                AI_PATH,
                json!({
                    "generatedLetters": [],
                    "lastGeneratedTheme": "",
                    "totalGenerations": 0
                }),
            );
        }
    }

    /// All readable letters, newest first.
    ///
    /// Entries that do not parse are skipped here but kept in the stored list.
    pub fn all(&self) -> Vec<GeneratedLetter> {
        self.entries()
            .unwrap_or_default()
            .iter()
            .filter_map(parse_letter)
            .collect()
    }

    /// Store a new letter at the front, dropping the oldest past the cap.
    ///
    /// `None` when `ai.generatedLetters` holds something other than a list;
    /// nothing is written in that case.
    pub fn save(&self, draft: LetterDraft) -> Option<GeneratedLetter> {
        let Some(mut entries) = self.entries() else {
            log::error!("Letter not saved: {} is not a list", LETTERS_PATH);
            return None;
        };
        let clock = self.store.clock();
        let letter = GeneratedLetter {
            id: unique_millis(clock, entries.iter().filter_map(entry_id)),
            content: draft.content,
            kind: draft.kind,
            theme: draft.theme,
            timestamp: clock.now_iso(),
            is_favorite: false,
        };
        let encoded = match serde_json::to_value(&letter) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("Failed to encode letter: {}", e);
                return None;
            }
        };

        entries.insert(0, encoded);
        entries.truncate(MAX_GENERATED_LETTERS);
        self.store.set(LETTERS_PATH, entries);

        log::info!("Letter saved: {}", letter.id);
        Some(letter)
    }

    /// Flip the favorite flag; returns the new flag, `false` for unknown ids
    pub fn toggle_favorite(&self, id: i64) -> bool {
        let Some(mut entries) = self.entries() else {
            return false;
        };
        let Some(entry) = entries.iter_mut().find(|entry| entry_id(entry) == Some(id)) else {
            return false;
        };
        let favorite = !entry
            .get("isFavorite")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        entry["isFavorite"] = json!(favorite);
        self.store.set(LETTERS_PATH, entries);
        favorite
    }

    pub fn favorites(&self) -> Vec<GeneratedLetter> {
        self.all().into_iter().filter(|l| l.is_favorite).collect()
    }

    pub fn delete(&self, id: i64) {
        let Some(mut entries) = self.entries() else {
            return;
        };
        let before = entries.len();
        entries.retain(|entry| entry_id(entry) != Some(id));
        if entries.len() != before {
            self.store.set(LETTERS_PATH, entries);
        }
    }

    pub fn get(&self, id: i64) -> Option<GeneratedLetter> {
        self.all().into_iter().find(|l| l.id == id)
    }

    fn entries(&self) -> Option<Vec<Value>> {
        self.store.get_list(LETTERS_PATH)
    }
}

fn entry_id(entry: &Value) -> Option<i64> {
    entry.get("id").and_then(Value::as_i64)
}

fn parse_letter(entry: &Value) -> Option<GeneratedLetter> {
    match GeneratedLetter::deserialize(entry) {
        Ok(letter) => Some(letter),
        Err(e) => {
            log::warn!("Skipping unreadable letter {:?}: {}", entry_id(entry), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::persistence::MemoryStorage;
    use crate::platform::FixedClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn archive() -> LetterArchive {
        let store = StateStore::with_clock(
            MemoryStorage::new(),
            StoreConfig::default(),
            FixedClock::from_millis(1_700_000_000_000),
        );
        let archive = LetterArchive::new(store);
        archive.init();
        archive
    }

    fn draft(n: usize) -> LetterDraft {
        LetterDraft {
            content: format!("letter {n}"),
            kind: LetterKind::Poem,
            theme: format!("theme {n}"),
        }
    }

    #[test]
    fn test_init_creates_section_once() {
        let archive = archive();
        assert_eq!(
            archive.store.get(AI_PATH),
            Some(json!({
                "generatedLetters": [],
                "lastGeneratedTheme": "",
                "totalGenerations": 0
            }))
        );

        archive.save(draft(1)).unwrap();
        archive.init();
        assert_eq!(archive.all().len(), 1);
    }

    #[test]
    fn test_save_newest_first() {
        let archive = archive();
        let first = archive.save(draft(1)).unwrap();
        let second = archive.save(draft(2)).unwrap();

        assert_ne!(first.id, second.id);
        let letters = archive.all();
        assert_eq!(letters[0], second);
        assert_eq!(letters[1], first);
        assert_eq!(first.timestamp, "2023-11-14T22:13:20.000Z");
        assert!(!first.is_favorite);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let archive = archive();
        let saved: Vec<GeneratedLetter> = (1..=21)
            .map(|n| archive.save(draft(n)).unwrap())
            .collect();

        let letters = archive.all();
        assert_eq!(letters.len(), MAX_GENERATED_LETTERS);
        assert_eq!(letters[0], saved[20]);
        assert_eq!(letters[19], saved[1]);
        assert!(archive.get(saved[0].id).is_none());
    }

    #[test]
    fn test_save_writes_the_section_once() {
        let archive = archive();
        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        let _sub = archive.store.subscribe(AI_PATH, move |_, _| *sink.borrow_mut() += 1);

        archive.save(draft(1)).unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(archive.store.get("ai.totalGenerations"), Some(json!(0)));
    }

    #[test]
    fn test_toggle_favorite() {
        let archive = archive();
        let letter = archive.save(draft(1)).unwrap();

        assert!(archive.toggle_favorite(letter.id));
        assert_eq!(archive.favorites().len(), 1);
        assert!(!archive.toggle_favorite(letter.id));
        assert!(archive.favorites().is_empty());
        assert!(!archive.toggle_favorite(404));
    }

    #[test]
    fn test_delete_and_get() {
        let archive = archive();
        let keep = archive.save(draft(1)).unwrap();
        let gone = archive.save(draft(2)).unwrap();

        archive.delete(gone.id);
        assert_eq!(archive.get(keep.id), Some(keep));
        assert_eq!(archive.get(gone.id), None);
        assert_eq!(archive.all().len(), 1);
    }

    #[test]
    fn test_list_observer_sees_newest_first() {
        let archive = archive();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = archive.store.subscribe(LETTERS_PATH, move |letters, _| {
            sink.borrow_mut().push(letters[0]["content"].clone());
        });

        archive.save(draft(1)).unwrap();
        archive.save(draft(2)).unwrap();
        assert_eq!(*seen.borrow(), vec![json!("letter 1"), json!("letter 2")]);
    }

    #[test]
    fn test_reads_letters_written_by_page_scripts() {
        let archive = archive();
        archive.store.set(
            LETTERS_PATH,
            json!([{ "id": 5, "content": "hi", "type": "sonnet", "theme": "t" }]),
        );
        let letters = archive.all();
        assert_eq!(letters[0].kind, LetterKind::Other);
        assert!(!letters[0].is_favorite);
    }

    #[test]
    fn test_malformed_list_reads_as_empty() {
        let archive = archive();
        archive.store.set(LETTERS_PATH, "oops");
        assert!(archive.all().is_empty());

        assert_eq!(archive.save(draft(1)), None);
        assert!(!archive.toggle_favorite(1));
        archive.delete(1);
        assert_eq!(archive.store.get(LETTERS_PATH), Some(json!("oops")));
    }

    #[test]
    fn test_unreadable_entry_survives_save() {
        let archive = archive();
        let saved: Vec<GeneratedLetter> = (1..=5)
            .map(|n| archive.save(draft(n)).unwrap())
            .collect();
        archive.store.set("ai.generatedLetters.4.theme", Value::Null);

        assert_eq!(archive.all().len(), 4);
        let newest = archive.save(draft(6)).unwrap();

        let stored = archive.store.get_list(LETTERS_PATH).unwrap();
        assert_eq!(stored.len(), 6);
        assert_eq!(stored[5]["id"], json!(saved[0].id));
        assert_eq!(stored[5]["theme"], Value::Null);
        assert_eq!(archive.all().len(), 5);
        assert_eq!(archive.all()[0], newest);
        assert_ne!(newest.id, saved[0].id);
    }

    #[test]
    fn test_toggle_and_delete_keep_unreadable_entries() {
        let archive = archive();
        let letter = archive.save(draft(1)).unwrap();
        archive.store.set("ai.generatedLetters.1", json!({ "id": 7, "theme": 3 }));

        assert!(archive.toggle_favorite(letter.id));
        archive.delete(letter.id);
        assert_eq!(
            archive.store.get(LETTERS_PATH),
            Some(json!([{ "id": 7, "theme": 3 }]))
        );
        assert!(archive.all().is_empty());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(LetterKind::from_str("Poem"), Some(LetterKind::Poem));
        assert_eq!(LetterKind::from_str("msg"), Some(LetterKind::Message));
        assert_eq!(LetterKind::from_str("haiku"), None);
        assert_eq!(LetterKind::Message.as_str(), "message");
    }
}
