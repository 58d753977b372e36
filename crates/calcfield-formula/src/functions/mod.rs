//! Built-in numeric functions
//!
//! The library holds the functions a formula may call directly. The sugar
//! functions (`MOD`, `SIGN`, `IF`, `DEGREES`, `RADIANS`) are recognised by the
//! parser and are not part of the library table.

pub mod math;
pub mod sugar;

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[f64]) -> f64;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Is volatile (new value on every evaluation)
    pub volatile: bool,
}

impl FunctionDef {
    /// Check an argument count against this function's arity
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable arity, used in error messages
    pub fn arity_description(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }

    /// Constants may be written without parentheses (`PI`, `E`)
    pub fn is_constant(&self) -> bool {
        self.max_args == Some(0) && !self.volatile
    }
}

/// Function registry
pub struct FunctionLibrary {
    functions: HashMap<&'static str, FunctionDef>,
}

static LIBRARY: Lazy<FunctionLibrary> = Lazy::new(FunctionLibrary::new);

/// Look up a library function by name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static FunctionDef> {
    LIBRARY.get(name)
}

/// Whether `name` is a library or sugar function (case-insensitive)
pub fn is_function_name(name: &str) -> bool {
    lookup(name).is_some() || sugar::SugarFunction::from_name(name).is_some()
}

impl FunctionLibrary {
    /// Create a registry with all built-in functions
    pub fn new() -> Self {
        let mut library = Self {
            functions: HashMap::with_capacity(24),
        };
        library.register_math_functions();
        library
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_ascii_uppercase().as_str())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Iterate over all registered function names
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    fn register_math_functions(&mut self) {
        let unary: [(&'static str, FunctionImpl); 15] = [
            ("ABS", math::fn_abs),
            ("SQRT", math::fn_sqrt),
            ("EXP", math::fn_exp),
            ("LOG", math::fn_log),
            ("LOG10", math::fn_log10),
            ("SIN", math::fn_sin),
            ("COS", math::fn_cos),
            ("TAN", math::fn_tan),
            ("ASIN", math::fn_asin),
            ("ACOS", math::fn_acos),
            ("ATAN", math::fn_atan),
            ("ROUND", math::fn_round),
            ("CEIL", math::fn_ceil),
            ("FLOOR", math::fn_floor),
            ("TRUNC", math::fn_trunc),
        ];
        for (name, implementation) in unary {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: Some(1),
                implementation,
                volatile: false,
            });
        }

        // POW
        self.register(FunctionDef {
            name: "POW",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_pow,
            volatile: false,
        });

        // ATAN2
        self.register(FunctionDef {
            name: "ATAN2",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_atan2,
            volatile: false,
        });

        // MIN
        self.register(FunctionDef {
            name: "MIN",
            min_args: 0,
            max_args: None,
            implementation: math::fn_min,
            volatile: false,
        });

        // MAX
        self.register(FunctionDef {
            name: "MAX",
            min_args: 0,
            max_args: None,
            implementation: math::fn_max,
            volatile: false,
        });

        // PI
        self.register(FunctionDef {
            name: "PI",
            min_args: 0,
            max_args: Some(0),
            implementation: math::fn_pi,
            volatile: false,
        });

        // E
        self.register(FunctionDef {
            name: "E",
            min_args: 0,
            max_args: Some(0),
            implementation: math::fn_e,
            volatile: false,
        });

        // RANDOM (volatile)
        self.register(FunctionDef {
            name: "RANDOM",
            min_args: 0,
            max_args: Some(0),
            implementation: math::fn_random,
            volatile: true,
        });
    }
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("sqrt").map(|d| d.name), Some("SQRT"));
        assert_eq!(lookup("Round").map(|d| d.name), Some("ROUND"));
        assert!(lookup("SUM").is_none());
        assert!(lookup("MOD").is_none());
    }

    #[test]
    fn test_library_contents() {
        let expected = [
            "ABS", "SQRT", "POW", "EXP", "LOG", "LOG10", "SIN", "COS", "TAN", "ASIN", "ACOS",
            "ATAN", "ATAN2", "ROUND", "CEIL", "FLOOR", "TRUNC", "MIN", "MAX", "PI", "E", "RANDOM",
        ];
        let library = FunctionLibrary::new();
        let mut names: Vec<&str> = library.names().collect();
        names.sort_unstable();
        let mut expected = expected.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_arity() {
        let pow = lookup("POW").unwrap();
        assert!(pow.accepts(2));
        assert!(!pow.accepts(1));
        assert_eq!(pow.arity_description(), "2");

        let max = lookup("MAX").unwrap();
        assert!(max.accepts(0));
        assert!(max.accepts(7));

        assert!(lookup("PI").unwrap().is_constant());
        assert!(!lookup("RANDOM").unwrap().is_constant());
    }

    #[test]
    fn test_function_names_include_sugar() {
        assert!(is_function_name("if"));
        assert!(is_function_name("Degrees"));
        assert!(is_function_name("abs"));
        assert!(!is_function_name("quantidade"));
    }
}
