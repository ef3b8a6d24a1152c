//! Exchange matching: pair a held manga with what other users swap.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::types::*;

const GENRE_OVERLAP_WEIGHT: f64 = 0.4;
const AFFINITY_WEIGHT: f64 = 0.3;
const COMPATIBILITY_WEIGHT: f64 = 0.2;
const RATING_WEIGHT: f64 = 0.1;
/// Used when either user has no rated history.
const NEUTRAL_COMPATIBILITY: f64 = 0.5;

/// Exchange matcher over other users' exchange histories.
pub struct ExchangeMatcher;

impl ExchangeMatcher {
    /// Rank `(partner, manga)` candidates for swapping away `held`.
    ///
    /// `partners` must not include `user`. Candidates scoring below
    /// `threshold` are dropped.
    pub fn find<'p>(
        catalog: &Catalog,
        user: &UserProfile,
        held: &Manga,
        partners: impl IntoIterator<Item = &'p UserProfile>,
        threshold: f64,
        limit: usize,
    ) -> Vec<ExchangeMatch> {
        let preferred: HashSet<String> = user
            .preferences
            .genres
            .iter()
            .map(|g| g.to_lowercase())
            .collect();
        let read = user.read_ids();
        let user_avg = user.average_rating();

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut matches = Vec::new();
        for partner in partners {
            let compatibility = Self::compatibility(user_avg, partner.average_rating());
            for entry in &partner.exchange_history {
                if entry.manga_id == held.id || read.contains(entry.manga_id.as_str()) {
                    continue;
                }
                if !seen.insert((partner.id.as_str(), entry.manga_id.as_str())) {
                    continue;
                }
                let Some(candidate) = catalog.get(&entry.manga_id) else {
                    continue;
                };

                let overlap = Self::genre_overlap(held, candidate);
                let affinity = Self::affinity(&preferred, candidate);
                let score = GENRE_OVERLAP_WEIGHT * overlap
                    + AFFINITY_WEIGHT * affinity
                    + COMPATIBILITY_WEIGHT * compatibility
                    + RATING_WEIGHT * candidate.rating / 10.0;
                if score < threshold {
                    continue;
                }

                let mut reasons = Vec::new();
                if overlap > 0.0 {
                    reasons.push(format!("Shares genres with {}", held.title));
                }
                if affinity > 0.0 {
                    reasons.push("Fits your favorite genres".to_string());
                }
                if compatibility >= 0.8 && user_avg.is_some() {
                    reasons.push(format!("{} rates manga like you do", partner.id));
                }

                matches.push(ExchangeMatch {
                    partner_id: partner.id.clone(),
                    manga_id: candidate.id.clone(),
                    score,
                    reasons,
                });
            }
        }

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        matches
    }

    /// Shared genres over all genres of the two items.
    fn genre_overlap(a: &Manga, b: &Manga) -> f64 {
        let a: HashSet<String> = a.genres.iter().map(|g| g.to_lowercase()).collect();
        let b: HashSet<String> = b.genres.iter().map(|g| g.to_lowercase()).collect();
        let union = a.union(&b).count();
        if union == 0 {
            return 0.0;
        }
        a.intersection(&b).count() as f64 / union as f64
    }

    /// Share of the candidate's genres the user prefers.
    fn affinity(preferred: &HashSet<String>, candidate: &Manga) -> f64 {
        if candidate.genres.is_empty() {
            return 0.0;
        }
        let hits = candidate
            .genres
            .iter()
            .filter(|g| preferred.contains(&g.to_lowercase()))
            .count();
        hits as f64 / candidate.genres.len() as f64
    }

    /// `1 - |avgA - avgB| / 5`, clamped to 0-1.
    fn compatibility(a: Option<f64>, b: Option<f64>) -> f64 {
        match (a, b) {
            (Some(a), Some(b)) => (1.0 - (a - b).abs() / 5.0).clamp(0.0, 1.0),
            _ => NEUTRAL_COMPATIBILITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn manga(id: &str, genres: &[&str], rating: f64) -> Manga {
        Manga {
            id: id.into(),
            title: format!("Title {}", id),
            author: "x".into(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            demographic: String::new(),
            themes: vec![],
            rating,
            popularity: 0,
            year: None,
            similar_mangas: vec![],
        }
    }

    fn partner(id: &str, offers: &[&str]) -> UserProfile {
        let mut profile = UserProfile::new(id);
        for m in offers {
            profile.record_exchange(ExchangeEntry {
                manga_id: m.to_string(),
                partner_id: "someone".into(),
                rating: 7.0,
                successful: true,
            });
        }
        profile
    }

    fn rate(profile: &mut UserProfile, id: &str, rating: f64) {
        profile.record_reading(ReadingEntry {
            manga_id: id.into(),
            rating,
            completed: true,
            date_read: Utc::now(),
        });
    }

    fn catalog() -> Catalog {
        Catalog::from_mangas(vec![
            manga("held", &["Action", "Adventure"], 7.0),
            manga("c", &["Action"], 8.0),
            manga("d", &["Romance"], 5.0),
            manga("e", &["Adventure", "Action"], 9.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_scores_and_threshold() {
        let catalog = catalog();
        let mut user = UserProfile::new("u1");
        user.preferences.genres = vec!["Action".into()];
        let partners = vec![partner("p1", &["c", "d"])];

        let held = catalog.get("held").unwrap();
        let matches = ExchangeMatcher::find(&catalog, &user, held, &partners, 0.3, 10);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.manga_id, "c");
        assert_eq!(m.partner_id, "p1");
        // 0.4 * 0.5 + 0.3 * 1 + 0.2 * 0.5 + 0.1 * 0.8
        assert!((m.score - 0.68).abs() < 1e-9);
        assert_eq!(m.reasons.len(), 2);
    }

    #[test]
    fn test_skips_held_read_and_duplicates() {
        let catalog = catalog();
        let mut user = UserProfile::new("u1");
        user.preferences.genres = vec!["Action".into()];
        rate(&mut user, "c", 8.0);
        let partners = vec![partner("p1", &["held", "c", "e", "e", "ghost"])];

        let held = catalog.get("held").unwrap();
        let matches = ExchangeMatcher::find(&catalog, &user, held, &partners, 0.3, 10);
        let ids: Vec<&str> = matches.iter().map(|m| m.manga_id.as_str()).collect();
        assert_eq!(ids, vec!["e"]);
    }

    #[test]
    fn test_compatibility_orders_partners() {
        let catalog = catalog();
        let mut user = UserProfile::new("u1");
        rate(&mut user, "d", 8.0);

        let mut alike = partner("alike", &["e"]);
        rate(&mut alike, "c", 8.0);
        let mut harsh = partner("harsh", &["e"]);
        rate(&mut harsh, "c", 1.0);

        let held = catalog.get("held").unwrap();
        let matches =
            ExchangeMatcher::find(&catalog, &user, held, &[harsh, alike], 0.0, 10);
        assert_eq!(matches[0].partner_id, "alike");
        assert_eq!(matches[1].partner_id, "harsh");
        // overlap 1.0, no affinity; compat 1.0 vs 0.0
        assert!((matches[0].score - (0.4 + 0.2 + 0.09)).abs() < 1e-9);
        assert!((matches[1].score - (0.4 + 0.09)).abs() < 1e-9);
        assert!(matches[0].reasons.iter().any(|r| r.contains("rates manga like you")));
    }

    #[test]
    fn test_limit() {
        let catalog = catalog();
        let user = UserProfile::new("u1");
        let partners = vec![partner("p1", &["c", "e"]), partner("p2", &["c", "e"])];
        let held = catalog.get("held").unwrap();
        assert_eq!(
            ExchangeMatcher::find(&catalog, &user, held, &partners, 0.0, 3).len(),
            3
        );
    }
}
