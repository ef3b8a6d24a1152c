//! Recommendation engine: weighted ensemble of category scorers.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::exchange::ExchangeMatcher;
use crate::scoring::{trending, ScoringContext};
use crate::signals::CollaborativeSignals;
use crate::types::*;
use mangaswap_core::{CategoryBudgets, Error, RecommendConfig, Result};

/// Ranks catalog items for users and tracks the profiles and likes it
/// ranks with.
pub struct RecommendationEngine {
    catalog: RwLock<Catalog>,
    profiles: RwLock<HashMap<String, UserProfile>>,
    signals: CollaborativeSignals,
    config: RecommendConfig,
}

impl RecommendationEngine {
    pub fn new(catalog: Catalog, config: RecommendConfig) -> Self {
        info!("RecommendationEngine initialized: {} catalog items", catalog.len());
        Self {
            catalog: RwLock::new(catalog),
            profiles: RwLock::new(HashMap::new()),
            signals: CollaborativeSignals::new(),
            config,
        }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Swap in new reference data.
    pub fn replace_catalog(&self, catalog: Catalog) {
        info!("Catalog replaced: {} items", catalog.len());
        *self.catalog.write() = catalog;
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.read().len()
    }

    /// Run `f` against the catalog.
    pub fn with_catalog<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        let catalog = self.catalog.read();
        f(&*catalog)
    }

    // ---------------------------------------------------------------
    // Profiles and interactions
    // ---------------------------------------------------------------

    /// Insert or replace a profile.
    pub fn upsert_profile(&self, profile: UserProfile) -> Result<()> {
        profile.validate()?;
        self.profiles.write().insert(profile.id.clone(), profile);
        Ok(())
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.read().get(user_id).cloned()
    }

    /// Apply `f` to a stored profile. The change is kept only if the
    /// result still validates.
    pub fn update_profile(&self, user_id: &str, f: impl FnOnce(&mut UserProfile)) -> Result<()> {
        let mut profiles = self.profiles.write();
        let current = profiles
            .get(user_id)
            .ok_or_else(|| Error::NotFound(format!("profile {}", user_id)))?;
        let mut updated = current.clone();
        f(&mut updated);
        updated.validate()?;
        if updated.id != user_id {
            return Err(Error::Validation(format!(
                "profile id changed from {} to {}",
                user_id, updated.id
            )));
        }
        profiles.insert(user_id.to_string(), updated);
        Ok(())
    }

    /// Record a user event. Likes feed collaborative filtering; views are
    /// stored on the profile.
    pub fn record_interaction(
        &self,
        user_id: &str,
        manga_id: &str,
        interaction: Interaction,
    ) -> Result<()> {
        debug!("Interaction {:?}: user={}, manga={}", interaction, user_id, manga_id);
        match interaction {
            Interaction::Like => {
                self.signals.like(user_id, manga_id);
                Ok(())
            }
            Interaction::Unlike => {
                self.signals.unlike(user_id, manga_id);
                Ok(())
            }
            Interaction::View => self.update_profile(user_id, |p| p.record_view(manga_id)),
        }
    }

    pub fn record_search(&self, user_id: &str, query: &str) -> Result<()> {
        self.update_profile(user_id, |p| p.record_search(query))
    }

    pub fn liked(&self, user_id: &str) -> HashSet<String> {
        self.signals.liked(user_id)
    }

    // ---------------------------------------------------------------
    // Recommendations
    // ---------------------------------------------------------------

    /// Recommendations for a stored profile; unknown users get trending.
    pub fn recommend_for_user(&self, user_id: &str, limit: usize) -> Vec<RecommendationScore> {
        let profile = self.profile(user_id);
        if profile.is_none() {
            debug!("No profile for {}, falling back to trending", user_id);
        }
        self.recommend(profile.as_ref(), limit)
    }

    /// Rank up to `limit` unread items for `profile`.
    ///
    /// Without a profile, or with one carrying no preferences, history or
    /// likes, the whole limit goes to trending.
    pub fn recommend(&self, profile: Option<&UserProfile>, limit: usize) -> Vec<RecommendationScore> {
        if limit == 0 {
            return Vec::new();
        }
        let catalog = self.catalog.read();

        let liked = profile
            .map(|p| self.signals.liked(&p.id))
            .unwrap_or_default();
        let profile = match profile {
            Some(p) if !(p.is_cold() && liked.is_empty()) => p,
            Some(p) => {
                let read = p.read_ids();
                return trending(&catalog, &read, &HashSet::new(), limit);
            }
            None => return trending(&catalog, &HashSet::new(), &HashSet::new(), limit),
        };

        let budgets = &self.config.budgets;
        let ctx = ScoringContext::new(&catalog, profile, &self.config);
        let others = self.signals.others(&profile.id);

        let mut candidates = Vec::new();
        candidates.extend(ctx.genre_match(CategoryBudgets::slots(budgets.genre_match, limit)));
        candidates.extend(ctx.collaborative(
            &liked,
            &others,
            CategoryBudgets::slots(budgets.collaborative, limit),
        ));
        candidates.extend(ctx.author_match(CategoryBudgets::slots(budgets.author_match, limit)));
        candidates.extend(ctx.similar_items(CategoryBudgets::slots(budgets.similar, limit)));

        let surfaced: HashSet<String> = candidates.iter().map(|c| c.manga_id.clone()).collect();
        candidates.extend(trending(
            &catalog,
            &profile.read_ids(),
            &surfaced,
            CategoryBudgets::slots(budgets.trending, limit),
        ));

        let total = candidates.len();
        let merged = Self::merge(candidates, limit);
        debug!(
            "Recommendations for {}: {} candidates -> {}",
            profile.id,
            total,
            merged.len()
        );
        merged
    }

    /// Stable sort by score, keep the first occurrence of each id, truncate.
    fn merge(mut candidates: Vec<RecommendationScore>, limit: usize) -> Vec<RecommendationScore> {
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.manga_id.clone()));
        candidates.truncate(limit);
        candidates
    }

    /// Partners whose exchange histories hold something worth swapping
    /// `held_manga_id` for. Empty when the user or the item is unknown.
    pub fn find_exchange_matches(
        &self,
        user_id: &str,
        held_manga_id: &str,
        limit: usize,
    ) -> Vec<ExchangeMatch> {
        let profiles = self.profiles.read();
        let Some(user) = profiles.get(user_id) else {
            debug!("No profile for {}, no exchange matches", user_id);
            return Vec::new();
        };
        let catalog = self.catalog.read();
        let Some(held) = catalog.get(held_manga_id) else {
            debug!("Held manga {} not in catalog", held_manga_id);
            return Vec::new();
        };

        let mut partners: Vec<&UserProfile> =
            profiles.values().filter(|p| p.id != user_id).collect();
        partners.sort_by(|a, b| a.id.cmp(&b.id));

        ExchangeMatcher::find(
            &catalog,
            user,
            held,
            partners,
            self.config.exchange_threshold,
            limit,
        )
    }
}
