//! Refresh games selected by drowsiness level

use std::fmt;

use drowsiness::Level;
use serde::{Deserialize, Serialize};

/// Digits shown in the memory game
pub const MEMORY_DIGITS: usize = 5;
/// How long the digits stay visible (seconds)
pub const MEMORY_SHOW_SECONDS: u64 = 2;
/// Random wait before the reaction light turns green (seconds)
pub const REACTION_WAIT_SECONDS: (u64, u64) = (2, 5);
/// Breathing rounds per session
pub const BREATHING_ROUNDS: u32 = 3;
/// Breathing phases and their lengths (seconds)
pub const BREATHING_PHASES: [(&str, u64); 3] = [("Inhale", 4), ("Hold", 3), ("Exhale", 5)];

/// The four refresh games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Click as soon as the light turns green
    Reaction,
    /// Add two 2-digit numbers
    MentalArithmetic,
    /// Recall a short digit sequence
    DigitMemory,
    /// Guided breathing
    Breathing,
}

impl GameKind {
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::One => GameKind::Reaction,
            Level::Two => GameKind::MentalArithmetic,
            Level::Three => GameKind::DigitMemory,
            Level::Four => GameKind::Breathing,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            GameKind::Reaction => Level::One,
            GameKind::MentalArithmetic => Level::Two,
            GameKind::DigitMemory => Level::Three,
            GameKind::Breathing => Level::Four,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::Reaction => "Reaction Game",
            GameKind::MentalArithmetic => "Mental Arithmetic",
            GameKind::DigitMemory => "Memory Game",
            GameKind::Breathing => "Breathing Exercise",
        }
    }

    pub fn instructions(&self) -> String {
        match self {
            GameKind::Reaction => format!(
                "The square starts red. Wait {}-{} seconds until it turns green, then click as fast as you can. Clicking early counts as a miss.",
                REACTION_WAIT_SECONDS.0, REACTION_WAIT_SECONDS.1
            ),
            GameKind::MentalArithmetic => {
                "Add the two 2-digit numbers in your head and type the answer.".to_string()
            }
            GameKind::DigitMemory => format!(
                "{} digits are shown for {} seconds. Type them back from memory.",
                MEMORY_DIGITS, MEMORY_SHOW_SECONDS
            ),
            GameKind::Breathing => {
                let phases: Vec<String> = BREATHING_PHASES
                    .iter()
                    .map(|(label, secs)| format!("{} {}s", label, secs))
                    .collect();
                format!("{} rounds of: {}.", BREATHING_ROUNDS, phases.join(", "))
            }
        }
    }
}

impl From<Level> for GameKind {
    fn from(level: Level) -> Self {
        GameKind::for_level(level)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping_round_trips() {
        for level in Level::ALL {
            assert_eq!(GameKind::for_level(level).level(), level);
        }
        assert_eq!(GameKind::from(Level::One), GameKind::Reaction);
        assert_eq!(GameKind::from(Level::Four), GameKind::Breathing);
    }

    #[test]
    fn test_instructions() {
        assert!(GameKind::DigitMemory.instructions().contains("5 digits"));
        assert_eq!(
            GameKind::Breathing.instructions(),
            "3 rounds of: Inhale 4s, Hold 3s, Exhale 5s."
        );
        assert!(GameKind::Reaction.instructions().contains("2-5 seconds"));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&GameKind::MentalArithmetic).unwrap(),
            r#""mental_arithmetic""#
        );
    }
}
