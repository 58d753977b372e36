//! Shorthand functions that the parser turns into operators or conditionals
//!
//! `MOD(a, b)` becomes `a % b` and `IF(c, t, f)` becomes `c ? t : f`. `SIGN`,
//! `DEGREES` and `RADIANS` are kept as function nodes and evaluated here.

use std::f64::consts::PI;

/// Shorthand functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SugarFunction {
    Mod,
    Sign,
    If,
    Degrees,
    Radians,
}

impl SugarFunction {
    /// Parse a function name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "MOD" => Some(SugarFunction::Mod),
            "SIGN" => Some(SugarFunction::Sign),
            "IF" => Some(SugarFunction::If),
            "DEGREES" => Some(SugarFunction::Degrees),
            "RADIANS" => Some(SugarFunction::Radians),
            _ => None,
        }
    }

    /// Canonical (uppercase) name
    pub fn name(&self) -> &'static str {
        match self {
            SugarFunction::Mod => "MOD",
            SugarFunction::Sign => "SIGN",
            SugarFunction::If => "IF",
            SugarFunction::Degrees => "DEGREES",
            SugarFunction::Radians => "RADIANS",
        }
    }

    /// Required argument count
    pub fn arity(&self) -> usize {
        match self {
            SugarFunction::Mod => 2,
            SugarFunction::If => 3,
            SugarFunction::Sign | SugarFunction::Degrees | SugarFunction::Radians => 1,
        }
    }

    /// Evaluate a function kept as a call node
    ///
    /// Returns `None` for `MOD` and `IF`, which never reach the evaluator as calls.
    pub fn apply(&self, x: f64) -> Option<f64> {
        match self {
            SugarFunction::Sign => Some(if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }),
            SugarFunction::Degrees => Some(x * 180.0 / PI),
            SugarFunction::Radians => Some(x * PI / 180.0),
            SugarFunction::Mod | SugarFunction::If => None,
        }
    }
}
