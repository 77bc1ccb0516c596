// Allow dead code: API response structs carry every wire field for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// A named reference to a world (origin or current location).
/// Unknown worlds come back as `{"name": "unknown", "url": ""}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    pub name: String,
    pub url: String,
}

impl LocationRef {
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            url: String::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        !self.url.is_empty()
    }
}

/// A single character record as served by `GET /character/{id}`.
/// Immutable once fetched; identity = id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub species: String,
    /// Free-text subtype, often empty (e.g. "Genetic experiment")
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub origin: LocationRef,
    pub location: LocationRef,
    pub image: String,
    pub episode: Vec<String>,
    pub url: String,
    pub created: String,
}

impl Character {
    /// Single-cell status marker for the list view
    pub fn status_glyph(&self) -> &'static str {
        match self.status.to_ascii_lowercase().as_str() {
            "alive" => "●",
            "dead" => "✗",
            _ => "?",
        }
    }

    /// Species with the free-text subtype appended when present
    pub fn species_display(&self) -> String {
        if self.kind.is_empty() {
            self.species.clone()
        } else {
            format!("{} ({})", self.species, self.kind)
        }
    }

    pub fn episode_count(&self) -> usize {
        self.episode.len()
    }
}

/// Pagination metadata returned alongside every listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: i64,
    pub pages: i64,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// The paginated wire shape of `GET /character?page=N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterPage {
    pub info: PageInfo,
    #[serde(default)]
    pub results: Vec<Character>,
}

/// Server-side filter criteria. All fields are independently optional;
/// absence means no constraint. Name and species match substrings,
/// status and gender match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFilter {
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
}

impl CharacterFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.species.is_none()
            && self.gender.is_none()
    }

    /// Short human-readable summary for the status bar, e.g. `status=alive gender=female`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref name) = self.name {
            parts.push(format!("name~{}", name));
        }
        if let Some(ref status) = self.status {
            parts.push(format!("status={}", status));
        }
        if let Some(ref species) = self.species {
            parts.push(format!("species~{}", species));
        }
        if let Some(ref gender) = self.gender {
            parts.push(format!("gender={}", gender));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RICK_JSON: &str = r#"{
        "id": 1,
        "name": "Rick Sanchez",
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
        "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
        "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
        "episode": ["https://rickandmortyapi.com/api/episode/1", "https://rickandmortyapi.com/api/episode/2"],
        "url": "https://rickandmortyapi.com/api/character/1",
        "created": "2017-11-04T18:48:46.250Z"
    }"#;

    #[test]
    fn test_parse_character() {
        let rick: Character = serde_json::from_str(RICK_JSON).expect("character should parse");
        assert_eq!(rick.id, 1);
        assert_eq!(rick.name, "Rick Sanchez");
        assert_eq!(rick.status, "Alive");
        assert_eq!(rick.kind, "");
        assert_eq!(rick.origin.name, "Earth (C-137)");
        assert!(rick.origin.is_known());
        assert_eq!(rick.episode_count(), 2);
        assert_eq!(rick.status_glyph(), "●");
    }

    #[test]
    fn test_parse_page() {
        let json = format!(
            r#"{{
                "info": {{"count": 826, "pages": 42, "next": "https://rickandmortyapi.com/api/character?page=2", "prev": null}},
                "results": [{}]
            }}"#,
            RICK_JSON
        );
        let page: CharacterPage = serde_json::from_str(&json).expect("page should parse");
        assert_eq!(page.info.count, 826);
        assert_eq!(page.info.pages, 42);
        assert!(page.info.next.is_some());
        assert!(page.info.prev.is_none());
        assert_eq!(page.results.len(), 1);
    }

    #[test]
    fn test_parse_page_missing_results() {
        // Some error bodies carry info but no results array
        let json = r#"{"info": {"count": 0, "pages": 0, "next": null, "prev": null}}"#;
        let page: CharacterPage = serde_json::from_str(json).expect("page should parse");
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_species_display() {
        let mut rick: Character = serde_json::from_str(RICK_JSON).unwrap();
        assert_eq!(rick.species_display(), "Human");
        rick.kind = "Clone".to_string();
        assert_eq!(rick.species_display(), "Human (Clone)");
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(CharacterFilter::default().is_empty());
        assert!(!CharacterFilter::by_name("rick").is_empty());

        let filter = CharacterFilter {
            gender: Some("female".to_string()),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_filter_summary() {
        let filter = CharacterFilter {
            name: Some("rick".to_string()),
            status: Some("alive".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.summary(), "name~rick status=alive");
        assert_eq!(CharacterFilter::default().summary(), "");
    }

    #[test]
    fn test_unknown_location() {
        let loc = LocationRef::unknown();
        assert!(!loc.is_known());
        assert_eq!(loc.name, "unknown");
    }
}
