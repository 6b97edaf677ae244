// ABOUTME: The closed set of media categories a keyword is reported under.
// ABOUTME: Carries the default file extension and the display label of each category.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A media category. The declaration order is the fixed output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MediaCategory {
    #[serde(rename = "Portal")]
    Portal,
    #[serde(rename = "Impresso")]
    Print,
    #[serde(rename = "TV")]
    Tv,
    #[serde(rename = "Rádio")]
    Radio,
}

impl MediaCategory {
    /// All categories in output order: Portal, Impresso, TV, Rádio.
    pub const ALL: [MediaCategory; 4] = [
        MediaCategory::Portal,
        MediaCategory::Print,
        MediaCategory::Tv,
        MediaCategory::Radio,
    ];

    /// The extension appended when a link has to be synthesized.
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaCategory::Portal => ".pdf",
            MediaCategory::Print => ".jpg",
            MediaCategory::Tv => ".mp4",
            MediaCategory::Radio => ".mp3",
        }
    }

    /// The label written to spreadsheets.
    pub fn label(self) -> &'static str {
        match self {
            MediaCategory::Portal => "Portal",
            MediaCategory::Print => "Impresso",
            MediaCategory::Tv => "TV",
            MediaCategory::Radio => "Rádio",
        }
    }

    /// Parse a category label as found in source spreadsheets.
    ///
    /// Matching is trimmed and case-insensitive. "Online" is an alias of Portal,
    /// "Print" of Impresso and "Radio" of Rádio.
    pub fn from_label(label: &str) -> Option<MediaCategory> {
        match label.trim().to_lowercase().as_str() {
            "portal" | "online" => Some(MediaCategory::Portal),
            "impresso" | "print" => Some(MediaCategory::Print),
            "tv" => Some(MediaCategory::Tv),
            "rádio" | "radio" => Some(MediaCategory::Radio),
            _ => None,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
