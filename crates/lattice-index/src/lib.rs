//! Static type-graph provider for lattice hierarchy sessions.
//!
//! Loads a JSON index of type declarations and `extends` edges into a
//! graph, then serves it through the [`lattice::HierarchyProvider`]
//! contract as the `static-index` provider: prepare resolves the type
//! under the cursor, supertypes and subtypes walk the edges. The index is
//! immutable once loaded; answering never does IO.
//!
//! # Example
//!
//! ```
//! use lattice_index::TypeIndex;
//!
//! # fn main() -> anyhow::Result<()> {
//! let index = TypeIndex::from_json(r#"{
//!     "types": [
//!         {
//!             "name": "Animal", "kind": 5,
//!             "uri": "file:///zoo/animals.rs",
//!             "range": {"start": {"line": 0, "character": 0}, "end": {"line": 3, "character": 1}},
//!             "selectionRange": {"start": {"line": 0, "character": 7}, "end": {"line": 0, "character": 13}}
//!         },
//!         {
//!             "name": "Dog", "kind": 5,
//!             "uri": "file:///zoo/animals.rs",
//!             "range": {"start": {"line": 5, "character": 0}, "end": {"line": 8, "character": 1}},
//!             "selectionRange": {"start": {"line": 5, "character": 7}, "end": {"line": 5, "character": 10}}
//!         }
//!     ],
//!     "extends": [["Dog", "Animal"]]
//! }"#)?;
//!
//! assert_eq!(index.len(), 2);
//! let parents = index.supertypes_of("Dog").expect("Dog is indexed");
//! assert_eq!(parents[0].name, "Animal");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod graph;
pub mod provider;
pub mod record;

pub use graph::{IndexError, TypeIndex};
pub use provider::IndexProvider;
pub use record::{IndexData, TypeRecord};
