//! Visitor preferences
//!
//! Persisted inside the state document at `preferences.*`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StateStore;

pub const PREFERENCES_PATH: &str = "preferences";
const THEME_PATH: &str = "preferences.theme";
const SOUND_PATH: &str = "preferences.soundEnabled";
const PARTICLES_PATH: &str = "preferences.particlesEnabled";
const SPEED_PATH: &str = "preferences.animationSpeed";
const FONT_SIZE_PATH: &str = "preferences.fontSize";

pub const DEFAULT_THEME: &str = "romantic";

/// Animation pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnimationSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl AnimationSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationSpeed::Slow => "slow",
            AnimationSpeed::Normal => "normal",
            AnimationSpeed::Fast => "fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(AnimationSpeed::Slow),
            "normal" => Some(AnimationSpeed::Normal),
            "fast" => Some(AnimationSpeed::Fast),
            _ => None,
        }
    }

    /// Factor applied to animation durations (1.0 = unchanged)
    pub fn duration_multiplier(&self) -> f32 {
        match self {
            AnimationSpeed::Slow => 1.5,
            AnimationSpeed::Normal => 1.0,
            AnimationSpeed::Fast => 0.7,
        }
    }
}

/// Root font size for accessibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" => Some(FontSize::Small),
            "medium" | "med" => Some(FontSize::Medium),
            "large" => Some(FontSize::Large),
            _ => None,
        }
    }

    /// CSS value for the document root
    pub fn css(&self) -> &'static str {
        match self {
            FontSize::Small => "14px",
            FontSize::Medium => "16px",
            FontSize::Large => "18px",
        }
    }
}

/// Visitor preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: String,
    pub sound_enabled: bool,
    pub particles_enabled: bool,
    pub animation_speed: AnimationSpeed,
    pub font_size: FontSize,
    /// Toast notifications
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            sound_enabled: true,
            particles_enabled: true,
            animation_speed: AnimationSpeed::Normal,
            font_size: FontSize::Medium,
            notifications: true,
        }
    }
}

/// Preference accessors over a store
#[derive(Debug, Clone)]
pub struct PreferenceManager {
    store: StateStore,
}

impl PreferenceManager {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Write defaults if no preferences were saved yet
    pub fn init(&self) {
        if !self.store.contains(PREFERENCES_PATH) {
            if let Err(e) = self.store.set_as(PREFERENCES_PATH, &Preferences::default()) {
                log::error!("Failed to encode default preferences: {}", e);
            }
        }
    }

    /// Current preferences; unknown or missing fields take defaults
    pub fn load(&self) -> Preferences {
        self.store
            .get_as::<Preferences>(PREFERENCES_PATH)
            .unwrap_or_default()
    }

    pub fn theme(&self) -> String {
        self.store
            .get_as::<String>(THEME_PATH)
            .filter(|theme| !theme.is_empty())
            .unwrap_or_else(|| DEFAULT_THEME.to_string())
    }

    pub fn set_theme(&self, theme: &str) {
        self.store.set(THEME_PATH, theme);
    }

    /// Enabled unless explicitly switched off
    pub fn sound_enabled(&self) -> bool {
        !self.is_false(SOUND_PATH)
    }

    /// Returns the new setting
    pub fn toggle_sound(&self) -> bool {
        let enabled = !self.sound_enabled();
        self.store.set(SOUND_PATH, enabled);
        enabled
    }

    pub fn particles_enabled(&self) -> bool {
        !self.is_false(PARTICLES_PATH)
    }

    /// Returns the new setting
    pub fn toggle_particles(&self) -> bool {
        let enabled = !self.particles_enabled();
        self.store.set(PARTICLES_PATH, enabled);
        enabled
    }

    /// Store the speed; returns the duration multiplier to apply
    pub fn set_animation_speed(&self, speed: AnimationSpeed) -> f32 {
        self.store.set(SPEED_PATH, speed.as_str());
        speed.duration_multiplier()
    }

    /// Store the size; returns the CSS root font size
    pub fn set_font_size(&self, size: FontSize) -> &'static str {
        self.store.set(FONT_SIZE_PATH, size.as_str());
        size.css()
    }

    fn is_false(&self, path: &str) -> bool {
        self.store
            .read(path, |value| matches!(value, Some(Value::Bool(false))))
    }
}
