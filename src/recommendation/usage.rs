use crate::material::Material;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Key under which recommendation rotation state is tracked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Shared by every caller without a session (the live feed)
    Global,
    /// Private to one session
    Session(String),
}

impl Scope {
    pub fn session(id: impl Into<String>) -> Self {
        Scope::Session(id.into())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Session(id) => write!(f, "session:{}", id),
        }
    }
}

/// Recommendations already dispensed in the current cycle, per (scope, material)
#[derive(Debug, Default)]
pub struct UsageStore {
    dispensed: Mutex<HashMap<(Scope, Material), HashSet<&'static str>>>,
}

impl UsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the dispensed set of one key
    pub(crate) fn with_dispensed<R>(
        &self,
        scope: &Scope,
        material: Material,
        f: impl FnOnce(&mut HashSet<&'static str>) -> R,
    ) -> R {
        let mut dispensed = self.dispensed.lock();
        let set = dispensed.entry((scope.clone(), material)).or_default();
        f(set)
    }

    /// Number of recommendations dispensed in the current cycle
    pub fn dispensed(&self, scope: &Scope, material: Material) -> usize {
        self.dispensed
            .lock()
            .get(&(scope.clone(), material))
            .map_or(0, HashSet::len)
    }

    /// Drop all rotation state of a scope
    pub fn forget(&self, scope: &Scope) {
        self.dispensed.lock().retain(|(s, _), _| s != scope);
    }

    /// Number of scopes with any rotation state
    pub fn scope_count(&self) -> usize {
        let dispensed = self.dispensed.lock();
        let scopes: HashSet<&Scope> = dispensed.keys().map(|(s, _)| s).collect();
        scopes.len()
    }
}
