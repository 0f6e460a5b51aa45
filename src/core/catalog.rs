//! Game catalog: fetched once per session start, with a built-in fallback

use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::types::{EngineError, GameDescriptor, Subject};

/// The catalog served when the backend is unreachable
pub fn builtin_catalog() -> Vec<GameDescriptor> {
    let entries = [
        (1, "physics", "Physics Puzzle", "Drag objects using hand gestures to learn Newton's laws", "beginner"),
        (2, "mathematics", "Math Shapes", "Create geometric shapes with gestures and solve problems", "beginner"),
        (3, "chemistry", "Chemistry Lab", "Mix chemicals with hand motions to learn reactions", "intermediate"),
        (4, "biology", "Biology Explorer", "Explore anatomy with 3D gestures and dissect virtual organisms", "intermediate"),
        (5, "computer_science", "Coding Challenge", "Arrange code blocks with gestures to learn programming", "advanced"),
    ];
    entries
        .into_iter()
        .map(|(id, subject, title, description, difficulty)| GameDescriptor {
            id,
            subject: subject.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            difficulty: difficulty.to_string(),
            gesture_type: Subject::parse(subject)
                .map(|s| s.gesture_type().to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// First catalog entry for a subject
pub fn find_game(games: &[GameDescriptor], subject: Subject) -> Option<&GameDescriptor> {
    games.iter().find(|g| g.subject() == Some(subject))
}

/// Client for `GET {base}/games/`
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch(&self) -> Result<Vec<GameDescriptor>, EngineError> {
        let url = format!("{}/games/", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::Catalog(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EngineError::Catalog(format!("{} returned {}", url, response.status())));
        }
        let games: Vec<GameDescriptor> = response
            .json()
            .await
            .map_err(|e| EngineError::Catalog(format!("undecodable catalog: {}", e)))?;
        info!(games = games.len(), "catalog loaded");
        Ok(games)
    }

    /// Remote catalog, or the built-in one if the backend cannot be reached
    pub async fn fetch_or_builtin(&self) -> Vec<GameDescriptor> {
        match self.fetch().await {
            Ok(games) if !games.is_empty() => games,
            Ok(_) => builtin_catalog(),
            Err(e) => {
                warn!(code = e.code(), "{}; using built-in catalog", e);
                builtin_catalog()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_covers_every_subject() {
        let games = builtin_catalog();
        for subject in Subject::ALL {
            assert!(find_game(&games, subject).is_some(), "{} missing", subject);
        }
        assert_eq!(find_game(&games, Subject::Coding).map(|g| g.id), Some(5));
        assert_eq!(find_game(&games, Subject::Chemistry).map(|g| g.gesture_type.as_str()), Some("pour_tilt"));
    }
}
