//! Per-category candidate scoring.
//!
//! Each scorer returns at most `budget` candidates, best first. Items the
//! user has read are never candidates.

use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::signals::similarity;
use crate::types::*;
use mangaswap_core::RecommendConfig;

/// Popularity contributes at most this much to a genre-match score.
const MAX_POPULARITY_BONUS: f64 = 0.2;
const DEMOGRAPHIC_PENALTY: f64 = 0.1;
const AUTHOR_WEIGHT: f64 = 0.8;
const SIMILAR_WEIGHT: f64 = 0.7;
const COLLABORATIVE_WEIGHT: f64 = 0.1;
const TRENDING_WEIGHT: f64 = 0.01;
const TRENDING_CONFIDENCE: f64 = 0.5;

/// Sort best-first (stable) and keep `budget`.
pub(crate) fn rank(mut scores: Vec<RecommendationScore>, budget: usize) -> Vec<RecommendationScore> {
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores.truncate(budget);
    scores
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

/// Catalog and profile state shared by the personalised scorers.
pub(crate) struct ScoringContext<'a> {
    catalog: &'a Catalog,
    profile: &'a UserProfile,
    config: &'a RecommendConfig,
    read: HashSet<&'a str>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(catalog: &'a Catalog, profile: &'a UserProfile, config: &'a RecommendConfig) -> Self {
        Self {
            catalog,
            profile,
            config,
            read: profile.read_ids(),
        }
    }

    fn unread(&self) -> impl Iterator<Item = &'a Manga> + '_ {
        self.catalog
            .iter()
            .filter(move |m| !self.read.contains(m.id.as_str()))
    }

    /// History entries rated at or above the "liked" bar.
    fn liked_history(&self) -> impl Iterator<Item = &'a ReadingEntry> + '_ {
        let bar = self.config.liked_rating;
        self.profile
            .reading_history
            .iter()
            .filter(move |e| e.rating >= bar)
    }

    pub fn genre_match(&self, budget: usize) -> Vec<RecommendationScore> {
        let preferred = lowercase_set(&self.profile.preferences.genres);
        if budget == 0 || preferred.is_empty() {
            return Vec::new();
        }
        let demographics = lowercase_set(&self.profile.preferences.demographics);

        let mut scores = Vec::new();
        for manga in self.unread() {
            if manga.genres.is_empty() {
                continue;
            }
            let matched: Vec<&str> = manga
                .genres
                .iter()
                .filter(|g| preferred.contains(&g.to_lowercase()))
                .map(String::as_str)
                .collect();
            if matched.is_empty() {
                continue;
            }

            let genre_fit = matched.len() as f64 / manga.genres.len() as f64;
            let popularity_bonus = (manga.popularity as f64 / 10_000.0).min(MAX_POPULARITY_BONUS);
            let rating_bonus = manga.rating / 50.0;
            let penalty = if !demographics.is_empty()
                && !demographics.contains(&manga.demographic.to_lowercase())
            {
                DEMOGRAPHIC_PENALTY
            } else {
                0.0
            };

            scores.push(RecommendationScore {
                manga_id: manga.id.clone(),
                score: genre_fit + popularity_bonus + rating_bonus - penalty,
                reasons: vec![format!("Matches your favorite genres: {}", matched.join(", "))],
                confidence: (matched.len() as f64 / preferred.len() as f64).min(1.0),
                category: Category::GenreMatch,
            });
        }
        rank(scores, budget)
    }

    /// `liked` is the target's liked set; `others` every other user's.
    pub fn collaborative(
        &self,
        liked: &HashSet<String>,
        others: &[(String, HashSet<String>)],
        budget: usize,
    ) -> Vec<RecommendationScore> {
        if budget == 0 || liked.is_empty() {
            return Vec::new();
        }

        let mut best: HashMap<&str, RecommendationScore> = HashMap::new();
        for (_, their_likes) in others {
            let sim = similarity(liked, their_likes);
            if sim <= self.config.similarity_threshold {
                continue;
            }
            let mut candidates: Vec<&String> = their_likes
                .iter()
                .filter(|id| !liked.contains(*id) && !self.read.contains(id.as_str()))
                .collect();
            candidates.sort();

            for id in candidates {
                let Some(manga) = self.catalog.get(id) else {
                    continue;
                };
                let score = sim * manga.rating * COLLABORATIVE_WEIGHT;
                let better = best
                    .get(manga.id.as_str())
                    .map_or(true, |existing| score > existing.score);
                if better {
                    best.insert(
                        manga.id.as_str(),
                        RecommendationScore {
                            manga_id: manga.id.clone(),
                            score,
                            reasons: vec!["Readers with similar taste liked this".to_string()],
                            confidence: sim.min(1.0),
                            category: Category::Collaborative,
                        },
                    );
                }
            }
        }

        let mut scores: Vec<RecommendationScore> = best.into_values().collect();
        scores.sort_by(|a, b| a.manga_id.cmp(&b.manga_id));
        rank(scores, budget)
    }

    pub fn author_match(&self, budget: usize) -> Vec<RecommendationScore> {
        if budget == 0 {
            return Vec::new();
        }
        let mut authors = lowercase_set(&self.profile.preferences.authors);
        for entry in self.liked_history() {
            if let Some(manga) = self.catalog.get(&entry.manga_id) {
                authors.insert(manga.author.to_lowercase());
            }
        }
        if authors.is_empty() {
            return Vec::new();
        }

        let scores = self
            .unread()
            .filter(|m| authors.contains(&m.author.to_lowercase()))
            .map(|m| RecommendationScore {
                manga_id: m.id.clone(),
                score: m.rating * AUTHOR_WEIGHT,
                reasons: vec![format!("By {}, an author you enjoy", m.author)],
                confidence: AUTHOR_WEIGHT,
                category: Category::AuthorMatch,
            })
            .collect();
        rank(scores, budget)
    }

    pub fn similar_items(&self, budget: usize) -> Vec<RecommendationScore> {
        if budget == 0 {
            return Vec::new();
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut scores = Vec::new();
        for entry in self.liked_history() {
            let Some(source) = self.catalog.get(&entry.manga_id) else {
                continue;
            };
            for similar_id in &source.similar_mangas {
                if self.read.contains(similar_id.as_str()) || !seen.insert(similar_id.as_str()) {
                    continue;
                }
                let Some(manga) = self.catalog.get(similar_id) else {
                    continue;
                };
                scores.push(RecommendationScore {
                    manga_id: manga.id.clone(),
                    score: manga.rating * SIMILAR_WEIGHT,
                    reasons: vec![format!("Similar to {}, which you liked", source.title)],
                    confidence: SIMILAR_WEIGHT,
                    category: Category::Similar,
                });
            }
        }
        rank(scores, budget)
    }
}

/// Most popular items, skipping `read` and `exclude`.
pub(crate) fn trending(
    catalog: &Catalog,
    read: &HashSet<&str>,
    exclude: &HashSet<String>,
    budget: usize,
) -> Vec<RecommendationScore> {
    catalog
        .by_popularity()
        .into_iter()
        .filter(|m| !read.contains(m.id.as_str()) && !exclude.contains(&m.id))
        .take(budget)
        .map(|m| RecommendationScore {
            manga_id: m.id.clone(),
            score: m.popularity as f64 * TRENDING_WEIGHT,
            reasons: vec!["Trending in the community".to_string()],
            confidence: TRENDING_CONFIDENCE,
            category: Category::Trending,
        })
        .collect()
}
