//! calcfield CLI - evaluate calculated form fields from a JSON form definition

use anyhow::{bail, Context, Result};
use calcfield::prelude::*;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calcfield")]
#[command(author, version, about = "Evaluate calculated form fields")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every calculated field of a form and print the results
    Eval {
        /// Form definition (JSON with `fields` and `values`)
        form: PathBuf,

        /// Override an input value before calculating (repeatable)
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Locale used to format results
        #[arg(short, long, default_value = "pt-BR")]
        locale: String,

        /// Print raw values as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Check a formula against the fields of a form
    Validate {
        /// Form definition
        form: PathBuf,

        /// Formula to check, e.g. "{price} * {quantity}"
        formula: String,
    },

    /// Print the calculation order of a form's calculated fields
    Order {
        /// Form definition
        form: PathBuf,
    },
}

/// Form definition file
#[derive(Debug, Deserialize)]
struct Form {
    fields: Vec<Field>,
    #[serde(default)]
    values: ValueMap,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Eval {
            form,
            set,
            locale,
            json,
        } => eval(&form, &set, &locale, json)?,
        Commands::Validate { form, formula } => validate(&form, &formula)?,
        Commands::Order { form } => order(&form)?,
    };
    print!("{}", output);
    Ok(())
}

fn load_form(path: &Path) -> Result<Form> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse form '{}'", path.display()))
}

/// Parse `name=value`; numbers and booleans are recognized, anything else is text
fn parse_assignment(assignment: &str) -> Result<(String, RawValue)> {
    let Some((name, value)) = assignment.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{}'", assignment);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing field name in '{}'", assignment);
    }

    let value = value.trim();
    let raw = if value.is_empty() {
        RawValue::Empty
    } else if let Ok(n) = value.parse::<f64>() {
        RawValue::Number(n)
    } else if let Ok(b) = value.parse::<bool>() {
        RawValue::Boolean(b)
    } else {
        RawValue::text(value)
    };
    Ok((name.to_string(), raw))
}

fn eval(path: &Path, assignments: &[String], locale: &str, json: bool) -> Result<String> {
    let form = load_form(path)?;

    let options = EngineOptions {
        locale: locale.to_string(),
        ..Default::default()
    };
    let mut engine = CalculationEngine::with_options(form.fields, form.values, options)
        .context("Failed to initialize calculation engine")?;

    for assignment in assignments {
        let (name, value) = parse_assignment(assignment)?;
        engine.update_value(&name, value);
    }

    for (name, error) in engine.field_errors() {
        eprintln!("Warning: {}: {}", name, error);
    }

    if json {
        let mut out = serde_json::to_string_pretty(engine.values())?;
        out.push('\n');
        return Ok(out);
    }

    let names: Vec<String> = engine.fields().iter().map(|f| f.name.clone()).collect();
    let mut out = String::new();
    for name in names {
        let text = if engine.field(&name).is_some_and(Field::is_calculated) {
            engine.format_field(&name)?
        } else {
            engine.values().get(&name).map(ToString::to_string).unwrap_or_default()
        };
        out.push_str(&format!("{} = {}\n", name, text));
    }

    let stats = engine.stats();
    eprintln!(
        "Calculated {} fields ({} errors)",
        stats.formula_count, stats.errors
    );
    Ok(out)
}

fn validate(path: &Path, formula: &str) -> Result<String> {
    let form = load_form(path)?;
    let result = validate_formula(formula, &form.fields);

    if !result.is_valid {
        for error in &result.errors {
            eprintln!("Error: {}", error);
        }
        bail!("Formula is invalid");
    }

    Ok(format!("Valid. Dependencies: {}\n", result.dependencies.join(", ")))
}

fn order(path: &Path) -> Result<String> {
    let form = load_form(path)?;
    let engine = CalculationEngine::new(form.fields, form.values)
        .context("Failed to compute calculation order")?;

    let mut out = String::new();
    for (i, name) in engine.calculation_order().iter().enumerate() {
        let deps = engine.dependencies_of(name);
        out.push_str(&format!("{}. {} <- [{}]\n", i + 1, name, deps.join(", ")));
    }
    Ok(out)
}
