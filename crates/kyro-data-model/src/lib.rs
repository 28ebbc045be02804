//! Type reflection crate
//!
//! Runtime type descriptors, a `CLASS_TYPE`-discriminated JSON codec and a
//! deep-copy engine for the Kyro data pipeline. Registration happens during
//! a single-threaded startup phase; afterwards the registry is read-only
//! except for its override table.

// crate-specific lint exceptions:
#![allow(clippy::missing_errors_doc)]
#![warn(missing_docs)]

mod error;
pub use error::*;

mod reflection;
pub use reflection::*;

mod member_descriptor;
pub use member_descriptor::*;

mod type_descriptor;
pub use type_descriptor::*;

mod registry;
pub use registry::*;

mod overrides;
pub use overrides::*;

mod resource;
pub use resource::*;

mod value;
pub use value::*;

mod primitives;
pub use primitives::*;

mod math_types;
pub use math_types::*;

mod copy;
pub use copy::*;

/// Serializing and deserializing reflected values as JSON trees
pub mod json_utils;

#[doc(hidden)]
pub use lazy_static::lazy_static;
#[doc(hidden)]
pub use serde_json;
#[doc(hidden)]
pub use tracing;
