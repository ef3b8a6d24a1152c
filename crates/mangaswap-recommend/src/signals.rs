//! Collaborative signal store: who liked what.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

/// `user_id -> liked manga ids`. Mutated only by like/unlike events.
#[derive(Default)]
pub struct CollaborativeSignals {
    likes: RwLock<HashMap<String, HashSet<String>>>,
}

impl CollaborativeSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn like(&self, user_id: &str, manga_id: &str) {
        self.likes
            .write()
            .entry(user_id.to_string())
            .or_default()
            .insert(manga_id.to_string());
    }

    pub fn unlike(&self, user_id: &str, manga_id: &str) {
        let mut likes = self.likes.write();
        if let Some(set) = likes.get_mut(user_id) {
            set.remove(manga_id);
            if set.is_empty() {
                likes.remove(user_id);
            }
        }
    }

    pub fn liked(&self, user_id: &str) -> HashSet<String> {
        self.likes.read().get(user_id).cloned().unwrap_or_default()
    }

    /// Every other user's liked set, ordered by user id.
    pub fn others(&self, user_id: &str) -> Vec<(String, HashSet<String>)> {
        let likes = self.likes.read();
        let mut others: Vec<(String, HashSet<String>)> = likes
            .iter()
            .filter(|(id, _)| id.as_str() != user_id)
            .map(|(id, set)| (id.clone(), set.clone()))
            .collect();
        others.sort_by(|a, b| a.0.cmp(&b.0));
        others
    }
}

/// `|A ∩ B| / sqrt(|A| * |B|)`; 0 when either set is empty.
pub fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    shared / ((a.len() * b.len()) as f64).sqrt()
}
