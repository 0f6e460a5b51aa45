//! Subjects, display languages and catalog descriptors

use serde::{Deserialize, Serialize};

/// The five subject games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Physics,
    Mathematics,
    Chemistry,
    Biology,
    #[serde(alias = "computer_science")]
    Coding,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Physics,
        Subject::Mathematics,
        Subject::Chemistry,
        Subject::Biology,
        Subject::Coding,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "physics" => Some(Self::Physics),
            "mathematics" | "math" | "maths" => Some(Self::Mathematics),
            "chemistry" => Some(Self::Chemistry),
            "biology" => Some(Self::Biology),
            "coding" | "computer_science" => Some(Self::Coding),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Physics => "physics",
            Self::Mathematics => "mathematics",
            Self::Chemistry => "chemistry",
            Self::Biology => "biology",
            Self::Coding => "coding",
        }
    }

    /// Gesture family the catalog advertises for this subject
    pub fn gesture_type(&self) -> &'static str {
        match self {
            Self::Physics | Self::Coding => "drag_drop",
            Self::Mathematics => "shape_draw",
            Self::Chemistry => "pour_tilt",
            Self::Biology => "rotate_zoom",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display/announcement language. Never affects game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Odia,
    Hindi,
    English,
}

impl Language {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "odia" | "or" => Some(Self::Odia),
            "hindi" | "hi" => Some(Self::Hindi),
            "english" | "en" => Some(Self::English),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Odia => "odia",
            Self::Hindi => "hindi",
            Self::English => "english",
        };
        write!(f, "{}", name)
    }
}

/// One entry of the game catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDescriptor {
    pub id: u32,
    /// Kept as the raw catalog string; see [`GameDescriptor::subject`]
    pub subject: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub gesture_type: String,
}

impl GameDescriptor {
    /// Typed subject, if the catalog string names a known game
    pub fn subject(&self) -> Option<Subject> {
        Subject::parse(&self.subject)
    }
}
