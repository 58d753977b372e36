//! Prelude module for convenient imports
//!
//! ```rust
//! use calcfield::prelude::*;
//! ```

pub use crate::engine::{CalculationEngine, CalculationStats, EngineOptions};
pub use crate::error::{Error, Result};

pub use calcfield_core::{Field, FieldType, FormatSpec, FormatType, RawValue, ValueMap};
pub use calcfield_format::format_value;
pub use calcfield_formula::{evaluate, validate_formula, FormulaError, FormulaValidation};
