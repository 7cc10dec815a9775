// Integration tests for recommendation rotation
//
// Every scope must cycle through all ten recommendations of a material
// before repeating, independently of any other scope.

use recycle_classifier::recommendation::{
    pool, RecommendationRotator, Scope, UsageStore, POOL_SIZE, UNRECOGNIZED_MATERIAL,
};
use recycle_classifier::Material;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_full_cycle_without_repeats_for_every_material() {
    let rotator = RecommendationRotator::default();

    for material in Material::ALL {
        let scope = Scope::session("cycle");
        let first_cycle: Vec<String> = (0..POOL_SIZE)
            .map(|_| rotator.next(material.as_str(), &scope))
            .collect();

        let distinct: HashSet<&String> = first_cycle.iter().collect();
        assert_eq!(distinct.len(), POOL_SIZE, "repeat within {} cycle", material);
        for rec in &first_cycle {
            assert!(pool(material).contains(&rec.as_str()));
        }

        // The 11th pick starts a new cycle, so it must repeat an earlier one
        let eleventh = rotator.next(material.as_str(), &scope);
        assert!(first_cycle.contains(&eleventh));
    }
}

#[test]
fn test_model_class_names_are_accepted() {
    let rotator = RecommendationRotator::default();
    let rec = rotator.next("Vidrio", &Scope::Global);

    assert!(pool(Material::Glass).contains(&rec.as_str()));
}

#[test]
fn test_unrecognized_material() {
    let rotator = RecommendationRotator::default();
    assert_eq!(rotator.next("Wood", &Scope::Global), UNRECOGNIZED_MATERIAL);
    assert_eq!(rotator.next("", &Scope::session("s")), UNRECOGNIZED_MATERIAL);
}

#[test]
fn test_scopes_rotate_independently() {
    let rotator = RecommendationRotator::default();
    let global = Scope::Global;
    let session = Scope::session("abc");

    for _ in 0..7 {
        rotator.next_for(Material::Cardboard, &global);
    }

    // The session has its own untouched cycle
    let session_cycle: HashSet<&str> = (0..POOL_SIZE)
        .map(|_| rotator.next_for(Material::Cardboard, &session))
        .collect();
    assert_eq!(session_cycle.len(), POOL_SIZE);
    assert_eq!(rotator.usage().dispensed(&global, Material::Cardboard), 7);
}

#[test]
fn test_concurrent_scopes_do_not_interfere() {
    let usage = Arc::new(UsageStore::new());
    let rotator = RecommendationRotator::new(Arc::clone(&usage));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rotator = rotator.clone();
            thread::spawn(move || {
                let scope = Scope::session(format!("session-{}", i));
                (0..POOL_SIZE)
                    .map(|_| rotator.next_for(Material::Paper, &scope))
                    .collect::<HashSet<_>>()
            })
        })
        .collect();

    for handle in handles {
        let picks = handle.join().expect("rotation thread panicked");
        assert_eq!(picks.len(), POOL_SIZE);
    }
    assert_eq!(usage.scope_count(), 4);
}

#[test]
fn test_separate_usage_stores_share_nothing() {
    let a = RecommendationRotator::default();
    let b = RecommendationRotator::default();

    a.next_for(Material::Glass, &Scope::Global);

    assert_eq!(a.usage().dispensed(&Scope::Global, Material::Glass), 1);
    assert_eq!(b.usage().dispensed(&Scope::Global, Material::Glass), 0);
}
