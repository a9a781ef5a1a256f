//! Conversions from Airtable cell values to Webflow field values, one per
//! Webflow field type. Callers handle empty values before dispatching here.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;

use crate::errors::{AppError, Result};
use crate::model::FieldValidations;
use crate::utils::value_to_text;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));
static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn parse_text(raw: &Value, validations: &FieldValidations) -> Result<Value> {
    let text = value_to_text(raw);

    if validations.single_line == Some(true) && text.contains('\n') {
        return Err(AppError::field("Value must be a single line of text"));
    }
    let length = text.chars().count();
    if let Some(max) = validations.max_length {
        if length > max {
            return Err(AppError::field(format!(
                "Value is {} characters long, exceeding the maximum of {}",
                length, max
            )));
        }
    }
    if let Some(min) = validations.min_length {
        if length < min {
            return Err(AppError::field(format!(
                "Value is {} characters long, below the minimum of {}",
                length, min
            )));
        }
    }
    Ok(Value::String(text))
}

pub fn parse_number(raw: &Value, validations: &FieldValidations) -> Result<Value> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        // Lookups and rollups arrive as single-element arrays.
        Value::Array(items) if items.len() == 1 => return parse_number(&items[0], validations),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| AppError::field(format!("Value \"{}\" is not a valid number", value_to_text(raw))))?;

    if validations.allow_negative == Some(false) && number < 0.0 {
        return Err(AppError::field(format!("Value {} is negative, which this field does not allow", number)));
    }

    if validations.format.as_deref() == Some("integer") {
        if number.abs() > MAX_SAFE_INTEGER {
            return Err(AppError::field(format!("Value {} is out of range for an integer field", number)));
        }
        if number.fract() != 0.0 {
            return Err(AppError::field(format!("Value {} must be a whole number", number)));
        }
        return Ok(json!(number as i64));
    }

    let rounded = match validations.precision {
        Some(precision) => {
            let exponent = i32::try_from(precision)
                .map_err(|_| AppError::field(format!("Precision {} is out of range", precision)))?;
            let factor = 10f64.powi(exponent);
            (number * factor).round() / factor
        }
        None => number,
    };
    if rounded.fract() == 0.0 && rounded.abs() <= MAX_SAFE_INTEGER {
        return Ok(json!(rounded as i64));
    }
    Ok(json!(rounded))
}

pub fn parse_switch(raw: &Value) -> Value {
    let flag = match raw {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" | "" => false,
            _ => true,
        },
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    };
    Value::Bool(flag)
}

/// Emits the option's Webflow id when the field's validations carry one.
pub fn parse_option(raw: &Value, validations: &FieldValidations) -> Result<Value> {
    let name = value_to_text(raw).trim().to_string();
    let Some(options) = validations.options.as_ref().filter(|o| !o.is_empty()) else {
        return Ok(Value::String(name));
    };

    match options.iter().find(|choice| choice.name == name) {
        Some(choice) => Ok(Value::String(choice.id.clone().unwrap_or_else(|| choice.name.clone()))),
        None => {
            let allowed: Vec<String> = options.iter().map(|c| format!("\"{}\"", c.name)).collect();
            Err(AppError::field(format!(
                "Value \"{}\" is not one of the allowed options: {}",
                name,
                allowed.join(", ")
            )))
        }
    }
}

fn attachment(entry: &Value) -> Option<Value> {
    match entry {
        Value::String(url) if !url.trim().is_empty() => Some(json!({ "url": url.trim(), "alt": Value::Null })),
        Value::Object(map) => {
            let url = map.get("url").and_then(Value::as_str)?;
            let alt = map.get("filename").cloned().unwrap_or(Value::Null);
            let mut out = Map::new();
            out.insert("url".into(), Value::String(url.to_string()));
            out.insert("alt".into(), alt);
            Some(Value::Object(out))
        }
        _ => None,
    }
}

fn attachments(raw: &Value) -> Result<Vec<Value>> {
    let found: Vec<Value> = match raw {
        Value::Array(entries) => entries.iter().filter_map(attachment).collect(),
        other => attachment(other).into_iter().collect(),
    };
    if found.is_empty() {
        return Err(AppError::field("No attachment with a URL was found"));
    }
    Ok(found)
}

/// Image and File fields take the first attachment.
pub fn parse_attachment(raw: &Value) -> Result<Value> {
    Ok(attachments(raw)?.swap_remove(0))
}

pub fn parse_attachments(raw: &Value) -> Result<Value> {
    Ok(Value::Array(attachments(raw)?))
}

pub fn parse_datetime(raw: &Value) -> Result<Value> {
    let text = value_to_text(raw).trim().to_string();
    let parsed = DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            let date = NaiveDate::parse_from_str(&text, "%Y-%m-%d").ok()?;
            Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
        })
        .ok_or_else(|| AppError::field(format!("Value \"{}\" is not a valid date", text)))?;
    Ok(Value::String(parsed.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

pub fn parse_email(raw: &Value) -> Result<Value> {
    let text = value_to_text(raw).trim().to_string();
    if !EMAIL.is_match(&text) {
        return Err(AppError::field(format!("Value \"{}\" is not a valid email address", text)));
    }
    Ok(Value::String(text))
}

pub fn parse_color(raw: &Value) -> Result<Value> {
    let text = value_to_text(raw).trim().to_string();
    if !COLOR.is_match(&text) {
        return Err(AppError::field(format!("Value \"{}\" is not a hex color", text)));
    }
    let hex = text.trim_start_matches('#');
    Ok(Value::String(format!("#{}", hex.to_lowercase())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionChoice;

    fn text_limits(max: Option<usize>, min: Option<usize>, single_line: bool) -> FieldValidations {
        FieldValidations {
            max_length: max,
            min_length: min,
            single_line: Some(single_line),
            ..FieldValidations::default()
        }
    }

    #[test]
    fn test_parse_text_limits() {
        let v = text_limits(Some(5), Some(2), true);
        assert_eq!(parse_text(&json!("abc"), &v).unwrap(), json!("abc"));
        assert_eq!(
            parse_text(&json!("abcdef"), &v).unwrap_err().to_string(),
            "Value is 6 characters long, exceeding the maximum of 5"
        );
        assert!(parse_text(&json!("a"), &v).is_err());
        assert!(parse_text(&json!("a\nb"), &v).is_err());
        assert_eq!(parse_text(&json!(42), &FieldValidations::default()).unwrap(), json!("42"));
    }

    #[test]
    fn test_parse_number_rules() {
        let none = FieldValidations::default();
        assert_eq!(parse_number(&json!("12.5"), &none).unwrap(), json!(12.5));
        assert_eq!(parse_number(&json!(7), &none).unwrap(), json!(7));
        assert_eq!(parse_number(&json!([3]), &none).unwrap(), json!(3));
        assert!(parse_number(&json!("twelve"), &none).is_err());
        assert!(parse_number(&json!("NaN"), &none).is_err());

        let precise = FieldValidations { precision: Some(2), ..FieldValidations::default() };
        assert_eq!(parse_number(&json!(3.14159), &precise).unwrap(), json!(3.14));

        let positive_int = FieldValidations {
            allow_negative: Some(false),
            format: Some("integer".into()),
            ..FieldValidations::default()
        };
        assert!(parse_number(&json!(-1), &positive_int).is_err());
        assert!(parse_number(&json!(1.5), &positive_int).is_err());
        assert_eq!(parse_number(&json!(4.0), &positive_int).unwrap(), json!(4));
        assert_eq!(
            parse_number(&json!(1e20), &positive_int).unwrap_err().to_string(),
            "Value 100000000000000000000 is out of range for an integer field"
        );

        let huge_precision = FieldValidations { precision: Some(u32::MAX), ..FieldValidations::default() };
        assert_eq!(
            parse_number(&json!(1.5), &huge_precision).unwrap_err().to_string(),
            "Precision 4294967295 is out of range"
        );
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch(&json!(true)), json!(true));
        assert_eq!(parse_switch(&json!("FALSE")), json!(false));
        assert_eq!(parse_switch(&json!(0)), json!(false));
        assert_eq!(parse_switch(&json!(1)), json!(true));
        assert_eq!(parse_switch(&json!("yes please")), json!(true));
    }

    #[test]
    fn test_parse_option_maps_names_to_ids() {
        let v = FieldValidations {
            options: Some(vec![
                OptionChoice { id: Some("opt-a".into()), name: "Alpha".into() },
                OptionChoice { id: None, name: "Beta".into() },
            ]),
            ..FieldValidations::default()
        };
        assert_eq!(parse_option(&json!("Alpha"), &v).unwrap(), json!("opt-a"));
        assert_eq!(parse_option(&json!("Beta"), &v).unwrap(), json!("Beta"));
        assert_eq!(
            parse_option(&json!("Gamma"), &v).unwrap_err().to_string(),
            "Value \"Gamma\" is not one of the allowed options: \"Alpha\", \"Beta\""
        );
    }

    #[test]
    fn test_parse_attachments() {
        let raw = json!([
            {"id": "att1", "url": "https://dl.airtable.com/a.png", "filename": "a.png"},
            {"id": "att2", "url": "https://dl.airtable.com/b.png", "filename": "b.png"}
        ]);
        assert_eq!(
            parse_attachment(&raw).unwrap(),
            json!({"url": "https://dl.airtable.com/a.png", "alt": "a.png"})
        );
        assert_eq!(parse_attachments(&raw).unwrap().as_array().map(Vec::len), Some(2));
        assert_eq!(
            parse_attachment(&json!("https://cdn.example.com/x.jpg")).unwrap(),
            json!({"url": "https://cdn.example.com/x.jpg", "alt": null})
        );
        assert!(parse_attachment(&json!([{"id": "att3"}])).is_err());
    }

    #[test]
    fn test_parse_datetime_email_color() {
        assert_eq!(parse_datetime(&json!("2024-03-05")).unwrap(), json!("2024-03-05T00:00:00.000Z"));
        assert_eq!(
            parse_datetime(&json!("2024-03-05T10:30:00+02:00")).unwrap(),
            json!("2024-03-05T08:30:00.000Z")
        );
        assert!(parse_datetime(&json!("next tuesday")).is_err());

        assert_eq!(parse_email(&json!(" ada@example.com ")).unwrap(), json!("ada@example.com"));
        assert!(parse_email(&json!("ada at example")).is_err());

        assert_eq!(parse_color(&json!("FFAA00")).unwrap(), json!("#ffaa00"));
        assert!(parse_color(&json!("orange")).is_err());
    }
}
