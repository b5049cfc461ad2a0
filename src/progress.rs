//! Game progress trackers
//!
//! Paths:
//! - `game.memory` - memory card game (score, attempts, best results)
//! - `game.loveMeter` - love meter current/highest percentage
//! - `game.timeline.viewedMilestones` - timeline milestones seen so far

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::store::StateStore;

pub const MEMORY_PATH: &str = "game.memory";
const MEMORY_BEST_TIME_PATH: &str = "game.memory.bestTime";
const MEMORY_BEST_SCORE_PATH: &str = "game.memory.bestScore";
const LOVE_CURRENT_PATH: &str = "game.loveMeter.current";
const LOVE_HIGHEST_PATH: &str = "game.loveMeter.highest";
pub const TIMELINE_PATH: &str = "game.timeline.viewedMilestones";

/// Milestones on the timeline page
pub const TIMELINE_MILESTONES: usize = 6;

/// One memory game run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryGame {
    pub level: u32,
    pub score: u64,
    pub attempts: u32,
    pub matches: u32,
    /// Epoch milliseconds when the run started
    pub time_started: i64,
    /// Fastest completion in seconds; `None` until a run is completed
    pub best_time: Option<f64>,
    pub best_score: u64,
}

/// Outcome of a finished memory game
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryResult {
    pub score: u64,
    /// Seconds since the run started
    pub time: f64,
    pub is_new_record: bool,
}

/// Game progress accessors over a store
#[derive(Debug, Clone)]
pub struct GameProgress {
    store: StateStore,
}

impl GameProgress {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Start a memory game, keeping best results from earlier runs
    pub fn start_memory_game(&self) -> MemoryGame {
        let best_time = self
            .store
            .get_as::<f64>(MEMORY_BEST_TIME_PATH)
            .filter(|t| *t > 0.0);
        let best_score = self.store.get_as::<u64>(MEMORY_BEST_SCORE_PATH).unwrap_or(0);

        let game = MemoryGame {
            level: 1,
            score: 0,
            attempts: 0,
            matches: 0,
            time_started: self.store.clock().now_millis(),
            best_time,
            best_score,
        };
        if let Err(e) = self.store.set_as(MEMORY_PATH, &game) {
            log::error!("Failed to encode memory game: {}", e);
        }
        game
    }

    pub fn memory_game(&self) -> Option<MemoryGame> {
        self.store.get_as(MEMORY_PATH)
    }

    /// Shallow-merge `updates` into the running game
    pub fn update_memory_game(&self, updates: Value) {
        self.store.update(MEMORY_PATH, updates);
    }

    /// Count a pair flip; a match adds `points`
    pub fn record_attempt(&self, matched: bool, points: u64) {
        let Some(game) = self.memory_game() else {
            log::warn!("Attempt recorded with no memory game running");
            return;
        };
        let mut updates = json!({ "attempts": game.attempts + 1 });
        if matched {
            updates["matches"] = json!(game.matches + 1);
            updates["score"] = json!(game.score + points);
        }
        self.update_memory_game(updates);
    }

    /// Finish the running game and record new bests
    pub fn complete_memory_game(&self) -> Option<MemoryResult> {
        let game = self.memory_game()?;
        let elapsed_ms = self.store.clock().now_millis() - game.time_started;
        let time = elapsed_ms.max(0) as f64 / 1000.0;
        let is_new_record = game.score > game.best_score;

        if is_new_record {
            self.store.set(MEMORY_BEST_SCORE_PATH, game.score);
        }
        if game.best_time.is_none_or(|best| time < best) {
            self.store.set(MEMORY_BEST_TIME_PATH, time);
        }

        log::info!(
            "Memory game complete: score {} in {:.1}s{}",
            game.score,
            time,
            if is_new_record { " (new record)" } else { "" }
        );
        Some(MemoryResult {
            score: game.score,
            time,
            is_new_record,
        })
    }

    /// Set the love meter; the highest reading is kept
    pub fn update_love_meter(&self, percentage: u32) {
        self.store.set(LOVE_CURRENT_PATH, percentage);
        let highest = self.store.get_as::<u32>(LOVE_HIGHEST_PATH).unwrap_or(0);
        if percentage > highest {
            self.store.set(LOVE_HIGHEST_PATH, percentage);
        }
    }

    pub fn love_meter(&self) -> (u32, u32) {
        (
            self.store.get_as(LOVE_CURRENT_PATH).unwrap_or(0),
            self.store.get_as(LOVE_HIGHEST_PATH).unwrap_or(0),
        )
    }

    /// Remember a milestone as seen (each id once)
    pub fn mark_timeline_viewed(&self, milestone: impl Into<Value>) {
        let milestone = milestone.into();
        let Some(mut viewed) = self.store.get_list(TIMELINE_PATH) else {
            return;
        };
        if !viewed.contains(&milestone) {
            viewed.push(milestone);
            self.store.set(TIMELINE_PATH, viewed);
        }
    }

    pub fn viewed_milestones(&self) -> Vec<Value> {
        self.store.get_list(TIMELINE_PATH).unwrap_or_default()
    }

    /// Percentage of milestones seen, rounded
    pub fn timeline_progress(&self) -> u32 {
        let viewed = self.viewed_milestones().len() as f64;
        (viewed / TIMELINE_MILESTONES as f64 * 100.0).round() as u32
    }
}
