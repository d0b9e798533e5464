//! Common fixtures shared across the hierarchy integration tests.
//!
//! A small animal class graph: `Dog` extends `Animal` and `Pet`, and
//! `Puppy` extends `Dog`, all declared in one fixture document.

use std::sync::Arc;

use lattice::testing::{fixture_uri, FixedDocuments, StaticDocument};
use lattice::{
    DocumentResolver, HierarchyProvider, HierarchyService, ProviderRegistry, SessionStore,
    StoreConfig,
};
use lattice_index::{IndexProvider, TypeIndex};
use serde_json::{json, Value};

/// Index document describing the zoo graph.
pub const ZOO_INDEX: &str = r#"{
    "types": [
        {
            "name": "Animal", "kind": 5,
            "uri": "file:///fixtures/animals.rs",
            "range": {"start": {"line": 0, "character": 0}, "end": {"line": 3, "character": 1}},
            "selectionRange": {"start": {"line": 0, "character": 7}, "end": {"line": 0, "character": 13}}
        },
        {
            "name": "Pet", "kind": 11,
            "uri": "file:///fixtures/animals.rs",
            "range": {"start": {"line": 5, "character": 0}, "end": {"line": 8, "character": 1}},
            "selectionRange": {"start": {"line": 5, "character": 6}, "end": {"line": 5, "character": 9}}
        },
        {
            "name": "Dog", "kind": 5,
            "uri": "file:///fixtures/animals.rs",
            "range": {"start": {"line": 10, "character": 0}, "end": {"line": 15, "character": 1}},
            "selectionRange": {"start": {"line": 10, "character": 7}, "end": {"line": 10, "character": 10}}
        },
        {
            "name": "Puppy", "kind": 5,
            "uri": "file:///fixtures/animals.rs",
            "range": {"start": {"line": 17, "character": 0}, "end": {"line": 20, "character": 1}},
            "selectionRange": {"start": {"line": 17, "character": 7}, "end": {"line": 17, "character": 12}}
        }
    ],
    "extends": [
        ["Dog", "Animal"],
        ["Dog", "Pet"],
        ["Puppy", "Dog"]
    ]
}"#;

/// Source text matching the declaration ranges in [`ZOO_INDEX`].
pub const ZOO_SOURCE: &str = "\
struct Animal {
    name: String,
    legs: u8,
}

trait Pet {
    fn owner(&self) -> &str;
    fn greet(&self);
}

struct Dog {
    animal: Animal,
    breed: String,
    owner: String,
    good: bool,
}

struct Puppy {
    dog: Dog,
    months: u8,
}
";

/// Builds an [`IndexProvider`] over the zoo graph.
pub fn zoo_provider() -> Arc<IndexProvider> {
    let index = TypeIndex::from_json(ZOO_INDEX).expect("zoo index is valid");
    Arc::new(IndexProvider::new(Arc::new(index)))
}

/// Wires the provider into a full service with the given store capacity.
pub fn zoo_service(provider: &Arc<IndexProvider>, capacity: usize) -> HierarchyService {
    let mut documents = FixedDocuments::new();
    documents.add(StaticDocument::new(
        fixture_uri("animals.rs"),
        "rust",
        ZOO_SOURCE,
    ));
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::clone(provider) as Arc<dyn HierarchyProvider>);
    HierarchyService::new(
        providers,
        Arc::new(documents) as Arc<dyn DocumentResolver>,
        Arc::new(SessionStore::with_config(StoreConfig { capacity })),
    )
}

/// A location request pointing at the `Dog` declaration name.
pub fn dog_cursor() -> Value {
    json!({
        "uri": "file:///fixtures/animals.rs",
        "position": { "line": 10, "character": 8 }
    })
}
