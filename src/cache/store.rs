// Allow dead code: the store keeps the full query surface even where the UI
// only reaches part of it
#![allow(dead_code)]

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, Pool, Sqlite};
use tracing::debug;

use crate::models::{Character, CharacterFilter, LocationRef};

/// Database file name inside the cache directory
const DB_FILE: &str = "characters.db";

/// Connection pool size for the on-disk database
const MAX_CONNECTIONS: u32 = 5;

/// Separator for the flattened episode URL list
const EPISODE_SEPARATOR: &str = ",";

/// A character flattened into one table row. Origin and location are
/// split into name+url columns and the episode list is joined into a
/// single delimited string. `page` records the listing page the row was
/// last written under; an upsert overwrites it, so a character seen on
/// several pages keeps only the most recent tag.
#[derive(Debug, Clone, FromRow)]
struct CharacterRow {
    id: i64,
    name: String,
    status: String,
    species: String,
    kind: String,
    gender: String,
    origin_name: String,
    origin_url: String,
    location_name: String,
    location_url: String,
    image: String,
    episode_list: String,
    url: String,
    created: String,
    page: i64,
}

impl CharacterRow {
    fn from_character(character: &Character, page: u32) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
            status: character.status.clone(),
            species: character.species.clone(),
            kind: character.kind.clone(),
            gender: character.gender.clone(),
            origin_name: character.origin.name.clone(),
            origin_url: character.origin.url.clone(),
            location_name: character.location.name.clone(),
            location_url: character.location.url.clone(),
            image: character.image.clone(),
            episode_list: character.episode.join(EPISODE_SEPARATOR),
            url: character.url.clone(),
            created: character.created.clone(),
            page: page as i64,
        }
    }

    fn into_character(self) -> Character {
        let episode = if self.episode_list.is_empty() {
            Vec::new()
        } else {
            self.episode_list
                .split(EPISODE_SEPARATOR)
                .map(str::to_string)
                .collect()
        };

        Character {
            id: self.id,
            name: self.name,
            status: self.status,
            species: self.species,
            kind: self.kind,
            gender: self.gender,
            origin: LocationRef {
                name: self.origin_name,
                url: self.origin_url,
            },
            location: LocationRef {
                name: self.location_name,
                url: self.location_url,
            },
            image: self.image,
            episode,
            url: self.url,
            created: self.created,
        }
    }
}

/// SQLite-backed character cache.
/// Clone is cheap - the pool is reference-counted.
#[derive(Clone)]
pub struct CharacterStore {
    pool: Pool<Sqlite>,
}

impl CharacterStore {
    /// Open (or create) the cache database under the given directory
    pub async fn open(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;

        let db_path = cache_dir.join(DB_FILE);
        if !db_path.exists() {
            std::fs::File::create(&db_path)
                .with_context(|| format!("Failed to create database file {}", db_path.display()))?;
        }

        let db_url = format!("sqlite://{}", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&db_url)
            .await
            .context("Failed to open cache database")?;

        Self::init_schema(&pool).await?;

        debug!(path = %db_path.display(), "Cache database opened");
        Ok(Self { pool })
    }

    /// Open an in-memory database. A single connection keeps every query
    /// on the same database instance.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS characters (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                species TEXT NOT NULL,
                kind TEXT NOT NULL,
                gender TEXT NOT NULL,
                origin_name TEXT NOT NULL,
                origin_url TEXT NOT NULL,
                location_name TEXT NOT NULL,
                location_url TEXT NOT NULL,
                image TEXT NOT NULL,
                episode_list TEXT NOT NULL,
                url TEXT NOT NULL,
                created TEXT NOT NULL,
                page INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("Failed to create characters table")?;

        Ok(())
    }

    /// All cached rows in listing order (page, then id)
    pub async fn all(&self) -> Result<Vec<Character>> {
        let rows: Vec<CharacterRow> =
            sqlx::query_as("SELECT * FROM characters ORDER BY page, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(CharacterRow::into_character).collect())
    }

    /// Rows tagged with the given listing page, ordered by id
    pub async fn by_page(&self, page: u32) -> Result<Vec<Character>> {
        let rows: Vec<CharacterRow> =
            sqlx::query_as("SELECT * FROM characters WHERE page = ? ORDER BY id")
                .bind(page as i64)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(CharacterRow::into_character).collect())
    }

    pub async fn by_id(&self, id: i64) -> Result<Option<Character>> {
        let row: Option<CharacterRow> = sqlx::query_as("SELECT * FROM characters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CharacterRow::into_character))
    }

    /// Name substring search, case-insensitive for ASCII per SQLite LIKE
    pub async fn search_name(&self, query: &str) -> Result<Vec<Character>> {
        let rows: Vec<CharacterRow> = sqlx::query_as(
            "SELECT * FROM characters WHERE name LIKE '%' || ?1 || '%' ORDER BY page, id",
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CharacterRow::into_character).collect())
    }

    /// Combined optional-criteria filter, mirroring the server-side one:
    /// name and species match substrings, status and gender match exactly.
    pub async fn filter(&self, filter: &CharacterFilter) -> Result<Vec<Character>> {
        let rows: Vec<CharacterRow> = sqlx::query_as(
            "SELECT * FROM characters
             WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%')
               AND (?2 IS NULL OR status = ?2)
               AND (?3 IS NULL OR species LIKE '%' || ?3 || '%')
               AND (?4 IS NULL OR gender = ?4)
             ORDER BY page, id",
        )
        .bind(filter.name.as_deref())
        .bind(filter.status.as_deref())
        .bind(filter.species.as_deref())
        .bind(filter.gender.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CharacterRow::into_character).collect())
    }

    /// Bulk upsert of one listing page. Replace-by-id: a character already
    /// cached under another page moves to this page tag, which shifts its
    /// position in `all()` ordering after mixed browsing.
    pub async fn upsert_page(&self, characters: &[Character], page: u32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for character in characters {
            let prev_page: Option<i64> =
                sqlx::query_scalar("SELECT page FROM characters WHERE id = ?")
                    .bind(character.id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if let Some(prev) = prev_page {
                if prev != page as i64 {
                    debug!(id = character.id, from = prev, to = page, "Page tag moved on upsert");
                }
            }

            let row = CharacterRow::from_character(character, page);
            sqlx::query(
                "INSERT OR REPLACE INTO characters
                 (id, name, status, species, kind, gender,
                  origin_name, origin_url, location_name, location_url,
                  image, episode_list, url, created, page)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(&row.name)
            .bind(&row.status)
            .bind(&row.species)
            .bind(&row.kind)
            .bind(&row.gender)
            .bind(&row.origin_name)
            .bind(&row.origin_url)
            .bind(&row.location_name)
            .bind(&row.location_url)
            .bind(&row.image)
            .bind(&row.episode_list)
            .bind(&row.url)
            .bind(&row.created)
            .bind(row.page)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Unconditional wipe of the cache table
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM characters")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Highest page tag present, None when the cache is empty
    pub async fn max_page(&self) -> Result<Option<u32>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(page) FROM characters")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.map(|p| p as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: i64, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            status: "Alive".to_string(),
            species: "Human".to_string(),
            kind: String::new(),
            gender: "Male".to_string(),
            origin: LocationRef {
                name: "Earth (C-137)".to_string(),
                url: "https://rickandmortyapi.com/api/location/1".to_string(),
            },
            location: LocationRef {
                name: "Citadel of Ricks".to_string(),
                url: "https://rickandmortyapi.com/api/location/3".to_string(),
            },
            image: format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", id),
            episode: vec![
                "https://rickandmortyapi.com/api/episode/1".to_string(),
                "https://rickandmortyapi.com/api/episode/2".to_string(),
            ],
            url: format!("https://rickandmortyapi.com/api/character/{}", id),
            created: "2017-11-04T18:48:46.250Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_fetch_by_page() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        store
            .upsert_page(&[character(2, "Morty Smith"), character(1, "Rick Sanchez")], 1)
            .await
            .unwrap();

        let page = store.by_page(1).await.unwrap();
        assert_eq!(page.len(), 2);
        // Ordered by id regardless of insertion order
        assert_eq!(page[0].name, "Rick Sanchez");
        assert_eq!(page[1].name, "Morty Smith");

        assert!(store.by_page(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        let mut original = character(1, "Rick Sanchez");
        original.kind = "Genetic experiment".to_string();
        store.upsert_page(&[original.clone()], 3).await.unwrap();

        let fetched = store.by_id(1).await.unwrap().unwrap();
        assert_eq!(fetched, original);
        assert_eq!(fetched.episode.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_episode_list_round_trips() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        let mut lonely = character(9, "Mr. Meeseeks");
        lonely.episode.clear();
        store.upsert_page(&[lonely], 1).await.unwrap();

        let fetched = store.by_id(9).await.unwrap().unwrap();
        assert!(fetched.episode.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_moves_page_tag() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        store.upsert_page(&[character(1, "Rick Sanchez")], 1).await.unwrap();
        store.upsert_page(&[character(1, "Rick Sanchez")], 4).await.unwrap();

        // Replace-by-id: only the most recent page tag survives
        assert!(store.by_page(1).await.unwrap().is_empty());
        assert_eq!(store.by_page(4).await.unwrap().len(), 1);
        assert_eq!(store.max_page().await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_all_ordered_by_page_then_id() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        store.upsert_page(&[character(21, "Aqua Morty")], 2).await.unwrap();
        store
            .upsert_page(&[character(2, "Morty Smith"), character(1, "Rick Sanchez")], 1)
            .await
            .unwrap();

        let all = store.all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 21]);
    }

    #[tokio::test]
    async fn test_search_name_substring() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        store
            .upsert_page(
                &[
                    character(1, "Rick Sanchez"),
                    character(2, "Morty Smith"),
                    character(15, "Alien Rick"),
                ],
                1,
            )
            .await
            .unwrap();

        let hits = store.search_name("rick").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Rick Sanchez", "Alien Rick"]);

        assert!(store.search_name("birdperson").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_combined_criteria() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        let mut summer = character(3, "Summer Smith");
        summer.gender = "Female".to_string();
        let mut dead_rick = character(8, "Toxic Rick");
        dead_rick.status = "Dead".to_string();
        store
            .upsert_page(&[character(1, "Rick Sanchez"), summer, dead_rick], 1)
            .await
            .unwrap();

        // No criteria = no constraint
        assert_eq!(store.filter(&CharacterFilter::default()).await.unwrap().len(), 3);

        let alive = CharacterFilter {
            status: Some("Alive".to_string()),
            ..Default::default()
        };
        assert_eq!(store.filter(&alive).await.unwrap().len(), 2);

        let alive_female = CharacterFilter {
            status: Some("Alive".to_string()),
            gender: Some("Female".to_string()),
            ..Default::default()
        };
        let hits = store.filter(&alive_female).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Summer Smith");

        let dead_ricks = CharacterFilter {
            name: Some("rick".to_string()),
            status: Some("Dead".to_string()),
            ..Default::default()
        };
        let hits = store.filter(&dead_ricks).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Toxic Rick");
    }

    #[tokio::test]
    async fn test_clear_wipes_everything() {
        let store = CharacterStore::open_in_memory().await.unwrap();
        store
            .upsert_page(&[character(1, "Rick Sanchez"), character(2, "Morty Smith")], 1)
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(store.max_page().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CharacterStore::open(dir.path()).await.unwrap();
        store.upsert_page(&[character(1, "Rick Sanchez")], 1).await.unwrap();

        assert!(dir.path().join(DB_FILE).exists());
        assert_eq!(store.by_page(1).await.unwrap().len(), 1);
    }
}
