//! Request validation from the column rules of an entity.

use crate::error::AppError;
use crate::model::{ColumnInfo, EntityDef, Format, ValueKind};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. Every required payload column must be present and non-null.
    pub fn validate(entity: &EntityDef, body: &HashMap<String, Value>) -> Result<(), AppError> {
        for col in entity.columns.iter().filter(|c| entity.is_payload_column(c.name)) {
            let val = body.get(col.name);
            if col.rule.required && val.map_or(true, Value::is_null) {
                return Err(AppError::Validation(format!("{} is required", col.name)));
            }
            if let Some(v) = val {
                validate_field(col, v)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for PUT/PATCH). Required columns may not be cleared.
    pub fn validate_partial(entity: &EntityDef, body: &HashMap<String, Value>) -> Result<(), AppError> {
        for (name, v) in body {
            let Some(col) = entity.column(name) else { continue };
            if !entity.is_payload_column(name) {
                continue;
            }
            if col.rule.required && v.is_null() {
                return Err(AppError::Validation(format!("{} cannot be null", col.name)));
            }
            validate_field(col, v)?;
        }
        Ok(())
    }
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS[.f]` timestamp.
pub fn parse_timestamp(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
}

pub fn is_valid_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").ok())
        .as_ref()
        .map_or(false, |re| re.is_match(s))
}

fn validate_field(col: &ColumnInfo, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    let name = col.name;
    let type_ok = match col.kind {
        ValueKind::Text | ValueKind::Enum => v.is_string(),
        ValueKind::Integer => v.is_i64(),
        ValueKind::Float => v.is_number(),
        ValueKind::Bool => v.is_boolean(),
        ValueKind::Timestamp => v.as_str().map(parse_timestamp).unwrap_or(false),
        ValueKind::Json => true,
    };
    if !type_ok {
        let expected = match col.kind {
            ValueKind::Text | ValueKind::Enum => "a string",
            ValueKind::Integer => "an integer",
            ValueKind::Float => "a number",
            ValueKind::Bool => "a boolean",
            ValueKind::Timestamp => "an ISO 8601 timestamp",
            ValueKind::Json => "JSON",
        };
        return Err(AppError::Validation(format!("{} must be {}", name, expected)));
    }
    // Integer columns are Postgres `integer`.
    if col.kind == ValueKind::Integer && v.as_i64().and_then(|n| i32::try_from(n).ok()).is_none() {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {}",
            name,
            i32::MIN,
            i32::MAX
        )));
    }
    let rule = &col.rule;
    if let Some(format) = rule.format {
        validate_format(name, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max {
                return Err(AppError::Validation(format!("{} must be at most {} characters", name, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min {
                return Err(AppError::Validation(format!("{} must be at least {} characters", name, min)));
            }
        }
        if let Some(allowed) = rule.allowed {
            if !allowed.contains(&s) {
                return Err(AppError::Validation(format!("{} must be one of: {}", name, allowed.join(", "))));
            }
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", name, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", name, max)));
            }
        }
    }
    Ok(())
}

fn validate_format(name: &str, v: &Value, format: Format) -> Result<(), AppError> {
    match format {
        Format::Email => {
            if !v.as_str().map(is_valid_email).unwrap_or(false) {
                return Err(AppError::Validation(format!("{} must be a valid email", name)));
            }
        }
        Format::Coordinates => {
            let lat = v.get("lat").and_then(Value::as_f64);
            let lng = v.get("lng").and_then(Value::as_f64);
            match (lat, lng) {
                (Some(lat), Some(lng)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) => {}
                _ => {
                    return Err(AppError::Validation(format!(
                        "{} must be an object with lat in [-90, 90] and lng in [-180, 180]",
                        name
                    )))
                }
            }
        }
        Format::StringList => {
            let ok = v.as_array().map(|items| items.iter().all(Value::is_string)).unwrap_or(false);
            if !ok {
                return Err(AppError::Validation(format!("{} must be a list of strings", name)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::primary_model;
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        v.as_object().unwrap().clone().into_iter().collect()
    }

    #[test]
    fn create_requires_required_columns() {
        let model = primary_model();
        let occ = model.entity_by_path("environmental-occurrences").unwrap();
        let err = RequestValidator::validate(occ, &body(json!({"title": "Queimada"}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("is required")));

        let ok = body(json!({
            "title": "Queimada",
            "occurrence_type": "fire",
            "severity": "high",
            "location": "Zona Rural",
            "description": "Foco de incendio"
        }));
        assert!(RequestValidator::validate(occ, &ok).is_ok());
    }

    #[test]
    fn enum_values_are_checked() {
        let model = primary_model();
        let alerts = model.entity_by_path("alerts").unwrap();
        let err = RequestValidator::validate_partial(alerts, &body(json!({"severity": "extreme"}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.starts_with("severity must be one of")));
    }

    #[test]
    fn integer_columns_reject_values_outside_32_bits() {
        let model = primary_model();
        let alerts = model.entity_by_path("alerts").unwrap();
        let err = RequestValidator::validate_partial(alerts, &body(json!({"related_occurrence_id": 3_000_000_000i64})))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.starts_with("related_occurrence_id must be between")));
        assert!(RequestValidator::validate_partial(alerts, &body(json!({"user_id": -3_000_000_000i64}))).is_err());
        assert!(RequestValidator::validate_partial(alerts, &body(json!({"related_occurrence_id": i32::MAX}))).is_ok());
    }

    #[test]
    fn ranges_and_types_are_checked() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        assert!(RequestValidator::validate_partial(soil, &body(json!({"ph_level": 15.0}))).is_err());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"ph_level": "acid"}))).is_err());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"ph_level": 6.5}))).is_ok());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"analysis_date": "yesterday"}))).is_err());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"analysis_date": "2024-05-01T10:00:00Z"}))).is_ok());
    }

    #[test]
    fn coordinates_and_lists() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        assert!(RequestValidator::validate_partial(soil, &body(json!({"coordinates": {"lat": -8.7, "lng": -63.9}}))).is_ok());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"coordinates": {"lat": 91, "lng": 0}}))).is_err());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"images": ["a.jpg", 3]}))).is_err());
    }

    #[test]
    fn required_column_cannot_be_cleared() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        assert!(RequestValidator::validate_partial(soil, &body(json!({"title": null}))).is_err());
        assert!(RequestValidator::validate_partial(soil, &body(json!({"notes": null}))).is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("admin@ecosolo.com"));
        assert!(!is_valid_email("admin@ecosolo"));
        assert!(!is_valid_email("not an email"));
    }
}
