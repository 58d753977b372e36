//! # calcfield-core
//!
//! Core data structures for the calcfield formula engine.
//!
//! This crate provides the fundamental types shared by the other calcfield crates:
//! - [`Field`] - A form field definition (input or calculated)
//! - [`FormatSpec`] - Display configuration for calculated values
//! - [`RawValue`] and [`ValueMap`] - Field values as supplied by the host form
//!
//! ## Example
//!
//! ```rust
//! use calcfield_core::{Field, FieldType, ValueMap};
//!
//! let fields = vec![
//!     Field::input("quantidade", FieldType::Number),
//!     Field::input("preco_unitario", FieldType::Currency),
//!     Field::calculated("total", "{quantidade} * {preco_unitario}"),
//! ];
//!
//! let mut values = ValueMap::new();
//! values.set("quantidade", 3.0);
//! values.set("preco_unitario", "12,50");
//!
//! assert_eq!(values.get_number("preco_unitario"), 12.5);
//! assert_eq!(values.get_number("missing"), 0.0);
//! assert!(fields[2].is_calculated());
//! ```

pub mod error;
pub mod field;
pub mod format_spec;
pub mod value;

// Re-exports for convenience
pub use error::{Error, Result};
pub use field::{check_field_names, Field, FieldKind, FieldType};
pub use format_spec::{FormatSpec, FormatType};
pub use value::{RawValue, ValueMap};
