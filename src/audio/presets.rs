//! Built-in equalizer presets.

use std::borrow::Cow;

use crate::error::EngineError;

/// Named gain vector, one entry per band in chain order (dB)
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: Cow<'static, str>,
    pub gains_db: Cow<'static, [f32]>,
}

impl Preset {
    /// Preset built at runtime (e.g. user-saved curve)
    pub fn custom(name: impl Into<String>, gains_db: Vec<f32>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            gains_db: Cow::Owned(gains_db),
        }
    }

    const fn builtin(name: &'static str, gains_db: &'static [f32]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            gains_db: Cow::Borrowed(gains_db),
        }
    }

    pub fn len(&self) -> usize {
        self.gains_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains_db.is_empty()
    }
}

pub const FLAT: Preset = Preset::builtin("flat", &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
pub const BASS: Preset =
    Preset::builtin("bass", &[10.0, 8.0, 5.0, 2.0, 0.0, -2.0, -3.0, -2.0, 0.0, 0.0]);
pub const TREBLE: Preset =
    Preset::builtin("treble", &[-2.0, -3.0, -2.0, 0.0, 2.0, 5.0, 8.0, 10.0, 8.0, 6.0]);
pub const VOCAL: Preset =
    Preset::builtin("vocal", &[0.0, -3.0, -2.0, 2.0, 4.0, 3.0, 1.0, -1.0, -2.0, -3.0]);
pub const POP: Preset =
    Preset::builtin("pop", &[3.0, 2.0, 0.0, -2.0, -2.0, 0.0, 2.0, 5.0, 4.0, 2.0]);
pub const ROCK: Preset =
    Preset::builtin("rock", &[5.0, 3.0, 1.0, 0.0, -2.0, -1.0, 2.0, 5.0, 6.0, 5.0]);

/// Every built-in preset, in menu order
pub static BUILTIN_PRESETS: [Preset; 6] = [FLAT, BASS, TREBLE, VOCAL, POP, ROCK];

/// Look up a built-in preset by name (case-insensitive, `-boost` aliases accepted)
pub fn find_preset(name: &str) -> Result<&'static Preset, EngineError> {
    let key = name.trim().to_ascii_lowercase();
    let key = match key.as_str() {
        "bass-boost" | "bass_boost" => "bass",
        "treble-boost" | "treble_boost" => "treble",
        other => other,
    };
    BUILTIN_PRESETS
        .iter()
        .find(|p| p.name == key)
        .ok_or_else(|| EngineError::UnknownPreset(name.to_string()))
}

/// Names of all built-in presets
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_PRESETS.iter().map(|p| p.name.as_ref())
}
