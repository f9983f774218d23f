//! Equivalence policy for recursive comparison
//!
//! An [`EquivalenceRegistry`] holds every rule that influences how two nodes
//! are compared: ignored paths and types, custom equalities per type or per
//! field, types compared with their native equality, and global flags such
//! as strict type checking or collection order insensitivity.
//!
//! Registries are built once with a [`RegistryBuilder`], validated eagerly
//! (malformed regexes and conflicting rules are rejected by
//! [`RegistryBuilder::build`]) and are immutable afterwards, so a single
//! registry can be shared across threads and comparisons.
//!
//! # Example
//!
//! ```ignore
//! use rcmp_registry::EquivalenceRegistry;
//!
//! let registry = EquivalenceRegistry::builder()
//!     .ignoring_fields(["id", "home.address"])
//!     .ignoring_collection_order()
//!     .with_strict_type_checking()
//!     .build()?;
//! ```
//!
//! Policies can also be loaded from YAML with [`ComparisonSettings`].

mod builder;
mod error;
mod registry;
mod settings;
mod strategy;

pub use builder::RegistryBuilder;
pub use error::{ConfigError, ConfigResult};
pub use registry::{EquivalenceRegistry, RegistryFlags};
pub use settings::ComparisonSettings;
pub use strategy::{EqualityStrategy, Equivalence};
