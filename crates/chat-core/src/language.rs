//! Reply language detection.
//!
//! Used for the language-mirroring instruction and for localizing
//! reminder confirmations. Heuristic: Devanagari script means Hindi,
//! romanized Hindi vocabulary means Hinglish, everything else English.

use serde::{Deserialize, Serialize};

/// Detected dominant language of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Hinglish => "Hinglish",
        }
    }

    /// Whether replies should use Hindi vocabulary (native or romanized).
    pub fn is_hindi_family(&self) -> bool {
        matches!(self, Self::Hindi | Self::Hinglish)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

// Common romanized Hindi function words. Two or more hits flag Hinglish.
const HINGLISH_MARKERS: &[&str] = &[
    "hai", "hain", "kya", "karo", "kar", "karna", "main", "mujhe", "mera",
    "meri", "nahi", "nahin", "aur", "par", "lekin", "kaise", "kab", "kahan",
    "tum", "aap", "bata", "batao", "chahiye", "wala", "wali", "raha", "rahi",
    "hoga", "hogi", "samjha", "samjho", "dena", "dijiye",
];

fn has_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Detect the dominant language of a message.
pub fn detect_language(text: &str) -> Language {
    if has_devanagari(text) {
        return Language::Hindi;
    }

    let lower = text.to_lowercase();
    let hits = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .filter(|word| HINGLISH_MARKERS.contains(word))
        .count();

    if hits >= 2 {
        Language::Hinglish
    } else {
        Language::English
    }
}
