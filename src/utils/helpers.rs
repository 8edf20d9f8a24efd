// utils/helpers.rs
use crate::utils::error::{ApiError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// Lire une date calendaire depuis "2024-05-01", "2024-05-01T08:30:00" ou RFC 3339
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Sérialisation serde des dates tolérante au format renvoyé par l'API
pub mod flexible_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw)))
    }
}

/// Variante optionnelle de `flexible_date`
pub mod flexible_date_opt {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_calendar_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw))),
        }
    }
}

/// Fusion superficielle: chaque clé du patch remplace celle de la base
pub fn merge_json(base: Value, patch: Value) -> Result<Value> {
    let mut base = match base {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::Parse(format!(
                "cannot merge into a non-object value: {}",
                other
            )))
        }
    };
    match patch {
        Value::Object(map) => {
            for (key, value) in map {
                base.insert(key, value);
            }
        }
        Value::Null => {}
        other => {
            return Err(ApiError::Parse(format!(
                "cannot merge a non-object patch: {}",
                other
            )))
        }
    }
    Ok(Value::Object(base))
}

/// Transformer une structure sérialisable en paramètres de requête triés
pub fn to_query_pairs<P: Serialize + ?Sized>(params: &P) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(params)?;
    let map: Map<String, Value> = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ApiError::Parse(format!(
                "query parameters must be an object: {}",
                other
            )))
        }
    };

    let mut pairs: Vec<(String, String)> = map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect();
    pairs.sort();
    Ok(pairs)
}

/// Tronquer une chaîne pour les logs
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}…", truncated)
    }
}
