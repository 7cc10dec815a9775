use super::pool::pool;
use super::usage::{Scope, UsageStore};
use crate::material::Material;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::debug;

/// Returned for labels outside the known material set
pub const UNRECOGNIZED_MATERIAL: &str = "Material not recognized for specific recommendations.";

/// Hands out recommendations without repeating until a material's pool is exhausted
#[derive(Debug, Clone)]
pub struct RecommendationRotator {
    usage: Arc<UsageStore>,
}

impl RecommendationRotator {
    pub fn new(usage: Arc<UsageStore>) -> Self {
        Self { usage }
    }

    pub fn usage(&self) -> &Arc<UsageStore> {
        &self.usage
    }

    /// Next recommendation for a raw model label within `scope`.
    ///
    /// Unknown labels get [`UNRECOGNIZED_MATERIAL`].
    pub fn next(&self, label: &str, scope: &Scope) -> String {
        match Material::from_label(label) {
            Some(material) => self.next_for(material, scope).to_string(),
            None => {
                debug!("No recommendations for label {:?}", label);
                UNRECOGNIZED_MATERIAL.to_string()
            }
        }
    }

    pub fn next_for(&self, material: Material, scope: &Scope) -> &'static str {
        let candidates_pool = pool(material);

        self.usage.with_dispensed(scope, material, |dispensed| {
            let mut candidates: Vec<&'static str> = candidates_pool
                .iter()
                .copied()
                .filter(|r| !dispensed.contains(r))
                .collect();

            if candidates.is_empty() {
                debug!("Recommendation cycle exhausted for {} in {}", material, scope);
                dispensed.clear();
                candidates = candidates_pool.to_vec();
            }

            let choice = candidates
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(candidates_pool[0]);
            dispensed.insert(choice);
            choice
        })
    }

    /// Drop the rotation state of an expired session
    pub fn forget(&self, scope: &Scope) {
        self.usage.forget(scope);
    }
}

impl Default for RecommendationRotator {
    fn default() -> Self {
        Self::new(Arc::new(UsageStore::new()))
    }
}
