//! # calcfield-format
//!
//! Renders calculated values for display according to a field's
//! [`FormatSpec`] and a [`Locale`].
//!
//! ```rust
//! use calcfield_core::FormatSpec;
//! use calcfield_format::{format_value, format_value_with_locale, EN_US};
//!
//! let spec = FormatSpec::percentage().decimals(2);
//! assert_eq!(format_value(1234.5, &spec), "123450.00%");
//!
//! let spec = FormatSpec::currency();
//! assert_eq!(format_value_with_locale(1234.5, &spec, &EN_US), "$1,234.50");
//! ```

mod locale;

pub use locale::{get_locale, CurrencyPosition, Locale, DE_DE, EN_GB, EN_US, ES_ES, FR_FR, PT_BR};

use calcfield_core::{FormatSpec, FormatType};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Placeholder replaced by the number in custom templates
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Fraction digits shown for percentages when none are configured
pub const DEFAULT_PERCENT_DECIMALS: u32 = 2;

/// Maximum fraction digits shown for plain numbers when none are configured
pub const DEFAULT_NUMBER_MAX_DECIMALS: u32 = 3;

/// Format a value in the default locale (pt-BR)
pub fn format_value(value: f64, spec: &FormatSpec) -> String {
    format_value_with_locale(value, spec, &PT_BR)
}

/// Format a value
///
/// `decimal_places` rounding (half away from zero) is applied first, then
/// the value is rendered per `format_type`, then prefix and suffix are added.
/// Non-finite values render as `0`. Never fails.
pub fn format_value_with_locale(value: f64, spec: &FormatSpec, locale: &Locale) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let places = spec.decimal_places;
    let rounded = places.map_or(value, |p| round_to(value, p));

    let body = match spec.format_type {
        FormatType::Number => match places {
            Some(p) => localize(&to_fixed(rounded, p), locale),
            None => localize(
                &trim_fraction(&to_fixed(value, DEFAULT_NUMBER_MAX_DECIMALS)),
                locale,
            ),
        },
        FormatType::Currency => {
            format_currency(rounded, places.unwrap_or(locale.currency_decimals), locale)
        }
        FormatType::Percentage => {
            let p = places.unwrap_or(DEFAULT_PERCENT_DECIMALS);
            format!("{}%", to_fixed(rounded * 100.0, p))
        }
        FormatType::Custom => {
            let number = match places {
                Some(p) => to_fixed(rounded, p),
                None => plain(value),
            };
            match spec.custom_format.as_deref() {
                Some(template) if template.contains(VALUE_PLACEHOLDER) => {
                    template.replace(VALUE_PLACEHOLDER, &number)
                }
                _ => number,
            }
        }
    };

    let mut out = String::with_capacity(body.len() + 8);
    if let Some(prefix) = &spec.prefix {
        out.push_str(prefix);
    }
    out.push_str(&body);
    if let Some(suffix) = &spec.suffix {
        out.push_str(suffix);
    }
    out
}

/// Grouped number with exactly `places` fraction digits
pub fn format_number(value: f64, places: u32, locale: &Locale) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    localize(&to_fixed(value, places), locale)
}

fn format_currency(value: f64, places: u32, locale: &Locale) -> String {
    let digits = localize(&to_fixed(value, places), locale);
    let (sign, amount) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits.as_str()),
    };

    let mut out = String::from(sign);
    match locale.currency_position {
        CurrencyPosition::Before => {
            out.push_str(locale.currency_symbol);
            out.extend(locale.currency_spacing);
            out.push_str(amount);
        }
        CurrencyPosition::After => {
            out.push_str(amount);
            out.extend(locale.currency_spacing);
            out.push_str(locale.currency_symbol);
        }
    }
    out
}

/// Round half away from zero to `places` fraction digits
pub fn round_to(value: f64, places: u32) -> f64 {
    to_fixed(value, places).parse().unwrap_or(value)
}

/// Fixed-point text with `.` as decimal separator and no grouping
fn to_fixed(value: f64, places: u32) -> String {
    let places = places.min(20);
    match Decimal::from_str(&plain(value)) {
        Ok(d) => {
            let mut rounded = d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
            if rounded.is_zero() {
                rounded.set_sign_positive(true);
            }
            format!("{:.*}", places as usize, rounded)
        }
        // Out of Decimal range; f64 formatting is exact enough at that magnitude
        Err(_) => {
            let s = format!("{:.*}", places as usize, value);
            match s.strip_prefix('-') {
                Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
                _ => s,
            }
        }
    }
}

/// Shortest round-trip text of a value
fn plain(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn trim_fraction(fixed: &str) -> String {
    if !fixed.contains('.') {
        return fixed.to_string();
    }
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Swap in the locale's separators and group thousands
fn localize(fixed: &str, locale: &Locale) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::from(sign);
    out.push_str(&group_thousands(int_part, locale.thousands_separator));
    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator);
        out.push_str(frac);
    }
    out
}

fn group_thousands(int_part: &str, sep: char) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        let pos_from_end = len - i;
        out.push(ch);
        if pos_from_end > 1 && pos_from_end % 3 == 1 {
            out.push(sep);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_percentage() {
        let spec = FormatSpec::percentage().decimals(2);
        assert_eq!(format_value(1234.5, &spec), "123450.00%");
        // Rounding applies before scaling
        assert_eq!(format_value(0.125, &FormatSpec::percentage().decimals(1)), "10.0%");
        assert_eq!(format_value(0.07, &FormatSpec::percentage()), "7.00%");
    }

    #[test]
    fn test_number_grouping() {
        let spec = FormatSpec::number().decimals(2);
        assert_eq!(format_value(1234567.891, &spec), "1.234.567,89");
        assert_eq!(format_value_with_locale(1234567.891, &spec, &EN_US), "1,234,567.89");
        assert_eq!(format_value(-1234.5, &spec), "-1.234,50");
        assert_eq!(format_value(12.0, &FormatSpec::number().decimals(0)), "12");
    }

    #[test]
    fn test_number_default_decimals() {
        let spec = FormatSpec::number();
        assert_eq!(format_value(1234.5, &spec), "1.234,5");
        assert_eq!(format_value(2.0, &spec), "2");
        assert_eq!(format_value(1.23456, &spec), "1,235");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(1.005, 2), 1.01);
        assert_eq!(round_to(1234.5, 2), 1234.5);
        assert_eq!(to_fixed(-0.001, 2), "0.00");
    }

    #[test]
    fn test_currency() {
        let spec = FormatSpec::currency();
        assert_eq!(format_value(1234.5, &spec), "R$\u{a0}1.234,50");
        assert_eq!(format_value(-3.0, &spec), "-R$\u{a0}3,00");
        assert_eq!(format_value_with_locale(1234.5, &spec, &EN_US), "$1,234.50");
        assert_eq!(format_value_with_locale(1234.5, &spec, &DE_DE), "1.234,50\u{a0}€");
        assert_eq!(
            format_value_with_locale(1234.5, &spec.clone().decimals(0), &EN_US),
            "$1,235"
        );
    }

    #[test]
    fn test_custom_template() {
        let spec = FormatSpec::custom("{value} kg").decimals(1);
        assert_eq!(format_value(12.345, &spec), "12.3 kg");

        let spec = FormatSpec::custom("total: {value} / {value}");
        assert_eq!(format_value(2.5, &spec), "total: 2.5 / 2.5");

        // No placeholder falls back to the plain number
        let spec = FormatSpec::custom("kg");
        assert_eq!(format_value(4.0, &spec), "4");
    }

    #[test]
    fn test_prefix_suffix() {
        let spec = FormatSpec::number().decimals(1).prefix("≈ ").suffix(" m²");
        assert_eq!(format_value(10.0, &spec), "≈ 10,0 m²");

        let spec = FormatSpec::percentage().decimals(2).prefix("(").suffix(")");
        assert_eq!(format_value(0.5, &spec), "(50.00%)");
    }

    #[test]
    fn test_non_finite_values() {
        let spec = FormatSpec::number().decimals(2);
        assert_eq!(format_value(f64::NAN, &spec), "0,00");
        assert_eq!(format_value(f64::INFINITY, &spec), "0,00");
    }

    #[test]
    fn test_huge_values_fall_back() {
        let spec = FormatSpec::number().decimals(0);
        assert!(format_number(1e30, 0, &EN_US).starts_with("1,000,000,000,000,000"));
        assert!(!format_value(1e30, &spec).is_empty());
    }
}
