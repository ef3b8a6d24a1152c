//! In-memory catalog of manga reference data.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::types::Manga;
use mangaswap_core::{Error, Result};

/// Validated catalog, iterated in id order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: BTreeMap<String, Manga>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mangas(mangas: impl IntoIterator<Item = Manga>) -> Result<Self> {
        let mut catalog = Self::new();
        for manga in mangas {
            catalog.insert(manga)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of catalog items.
    pub fn from_json(json: &str) -> Result<Self> {
        let mangas: Vec<Manga> = serde_json::from_str(json)?;
        Self::from_mangas(mangas)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        info!("Loaded {} catalog items from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Insert an item. Ids must be unique.
    pub fn insert(&mut self, manga: Manga) -> Result<()> {
        manga.validate()?;
        if self.items.contains_key(&manga.id) {
            return Err(Error::Validation(format!("duplicate manga id {}", manga.id)));
        }
        self.items.insert(manga.id.clone(), manga);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Manga> {
        self.items.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Manga> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items ordered by popularity, most popular first. Ties by id.
    pub fn by_popularity(&self) -> Vec<&Manga> {
        let mut items: Vec<&Manga> = self.items.values().collect();
        items.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        items
    }

    /// Case-insensitive title/author substring search, most popular first.
    pub fn search(&self, query: &str) -> Vec<&Manga> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.by_popularity()
            .into_iter()
            .filter(|m| {
                m.title.to_lowercase().contains(&needle) || m.author.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manga(id: &str, title: &str, author: &str, popularity: u64) -> Manga {
        Manga {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            genres: vec![],
            demographic: "Shonen".into(),
            themes: vec![],
            rating: 7.0,
            popularity,
            year: Some(2000),
            similar_mangas: vec![],
        }
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": "m1", "title": "Berserk", "author": "Kentaro Miura", "genres": ["Action"],
             "demographic": "Seinen", "rating": 9.4, "popularity": 5000, "year": 1989,
             "similarMangas": ["m2"]},
            {"id": "m2", "title": "Vagabond", "author": "Takehiko Inoue", "rating": 9.1}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("m1").unwrap().similar_mangas, vec!["m2"]);
        assert_eq!(catalog.get("m2").unwrap().popularity, 0);
    }

    #[test]
    fn test_rejects_duplicates_and_invalid() {
        let mut catalog = Catalog::new();
        catalog.insert(manga("m1", "One", "A", 1)).unwrap();
        assert!(catalog.insert(manga("m1", "Again", "A", 1)).is_err());

        let mut bad = manga("m2", "Two", "A", 1);
        bad.rating = 12.0;
        assert!(matches!(catalog.insert(bad), Err(Error::Validation(_))));
        assert!(Catalog::from_json("{}").is_err());
    }

    #[test]
    fn test_by_popularity_ties_by_id() {
        let catalog = Catalog::from_mangas(vec![
            manga("b", "B", "x", 10),
            manga("a", "A", "x", 10),
            manga("c", "C", "x", 50),
        ])
        .unwrap();
        let ids: Vec<&str> = catalog.by_popularity().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_search() {
        let catalog = Catalog::from_mangas(vec![
            manga("m1", "One Piece", "Eiichiro Oda", 900),
            manga("m2", "Piece of Cake", "Someone", 10),
            manga("m3", "Naruto", "Masashi Kishimoto", 800),
        ])
        .unwrap();
        let hits: Vec<&str> = catalog.search(" PIECE ").iter().map(|m| m.id.as_str()).collect();
        assert_eq!(hits, vec!["m1", "m2"]);
        assert_eq!(catalog.search("kishimoto")[0].id, "m3");
        assert!(catalog.search("").is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"id": "m1", "title": "T", "author": "A", "rating": 5}]"#)
            .unwrap();
        assert_eq!(Catalog::load(&path).unwrap().len(), 1);
        assert!(Catalog::load(&dir.path().join("missing.json")).is_err());
    }
}
