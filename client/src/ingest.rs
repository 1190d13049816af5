use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use floodwatch_shared::{Category, Coordinate, GeoEntity, MapError, Payload, Severity};

/// The location shapes the backend has been seen to send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocationPayload {
    /// `[lat, lng]`
    Pair([f64; 2]),
    /// GeoJSON point, `coordinates` in `[lng, lat]` order.
    GeoJson { coordinates: [f64; 2] },
    LatLng { lat: f64, lng: f64 },
    LatitudeLongitude { latitude: f64, longitude: f64 },
}

impl LocationPayload {
    /// Validated coordinate for this payload.
    pub fn coordinate(&self) -> Result<Coordinate, MapError> {
        match *self {
            LocationPayload::Pair(pair) => Coordinate::try_from(pair),
            LocationPayload::GeoJson {
                coordinates: [lng, lat],
            } => Coordinate::new(lat, lng),
            LocationPayload::LatLng { lat, lng } => Coordinate::new(lat, lng),
            LocationPayload::LatitudeLongitude {
                latitude,
                longitude,
            } => Coordinate::new(latitude, longitude),
        }
    }
}

/// One entity as it arrives from the backend, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntity {
    #[serde(default, alias = "_id")]
    pub id: Option<Value>,
    #[serde(default, alias = "coordinates")]
    pub location: Option<LocationPayload>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude", alias = "lon")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "risk_level")]
    pub severity: Option<String>,
    #[serde(default, alias = "created_at")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub rest: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Position of the record in the input.
    pub index: usize,
    pub error: MapError,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub entities: Vec<GeoEntity>,
    pub rejected: Vec<Rejection>,
}

/// Parse a backend list response: a bare array, or an object wrapping one
/// (`{"shelters": [...], "total": 3}`).
pub fn parse_snapshot(json: &str, default_category: Category) -> Result<IngestReport, MapError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| MapError::Payload(e.to_string()))?;
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut fields) => {
            let key = fields
                .iter()
                .filter(|(_, v)| v.is_array())
                .map(|(k, _)| k.clone())
                .find(|k| {
                    k.parse::<Category>().is_ok_and(|c| c == default_category)
                        || matches!(k.as_str(), "data" | "items" | "results")
                })
                .or_else(|| single_array_field(&fields))
                .ok_or_else(|| MapError::Payload("no entity list in object".to_string()))?;
            match fields.remove(&key) {
                Some(Value::Array(records)) => records,
                _ => return Err(MapError::Payload(format!("field {key} is not a list"))),
            }
        }
        other => {
            return Err(MapError::Payload(format!(
                "expected a list of entities, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut raw = Vec::with_capacity(records.len());
    let mut malformed = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<RawEntity>(record) {
            Ok(entity) => raw.push((index, entity)),
            Err(e) => malformed.push(Rejection {
                index,
                error: MapError::Payload(e.to_string()),
            }),
        }
    }

    let mut report = ingest_indexed(raw, default_category);
    report.rejected.extend(malformed);
    report.rejected.sort_by_key(|r| r.index);
    Ok(report)
}

/// Validate raw records into entities. Records without an id or with an
/// invalid location are rejected; later duplicates of an id are dropped.
pub fn ingest(raw: Vec<RawEntity>, default_category: Category) -> IngestReport {
    ingest_indexed(raw.into_iter().enumerate().collect(), default_category)
}

fn ingest_indexed(raw: Vec<(usize, RawEntity)>, default_category: Category) -> IngestReport {
    let mut report = IngestReport::default();
    let mut seen = HashSet::new();

    for (index, record) in raw {
        match into_entity(record, default_category) {
            Ok(entity) => {
                if !seen.insert(entity.id.clone()) {
                    warn!(id = %entity.id, "duplicate entity id dropped");
                    continue;
                }
                report.entities.push(entity);
            }
            Err(error) => {
                warn!(index, %error, "entity rejected");
                report.rejected.push(Rejection { index, error });
            }
        }
    }
    report
}

fn into_entity(raw: RawEntity, default_category: Category) -> Result<GeoEntity, MapError> {
    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(MapError::InvalidInput("entity has no id".to_string())),
    };

    let coordinate = match (&raw.location, raw.lat, raw.lng) {
        (Some(location), _, _) => location.coordinate()?,
        (None, Some(lat), Some(lng)) => Coordinate::new(lat, lng)?,
        _ => {
            return Err(MapError::InvalidInput(format!(
                "entity {id} has no location"
            )));
        }
    };

    let category = raw
        .category
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or(default_category);

    let mut entity = GeoEntity::new(id, coordinate, category);
    entity.severity = raw.severity.as_deref().and_then(|s| s.parse::<Severity>().ok());
    entity.reported_at = raw.timestamp.as_deref().and_then(parse_timestamp);
    entity.payload = raw.rest;
    Ok(entity)
}

/// RFC 3339, or a naive ISO timestamp taken as UTC (what Python's
/// `datetime.utcnow().isoformat()` produces).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn single_array_field(fields: &serde_json::Map<String, Value>) -> Option<String> {
    let mut arrays = fields.iter().filter(|(_, v)| v.is_array());
    match (arrays.next(), arrays.next()) {
        (Some((key, _)), None) => Some(key.clone()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_wrapped_shelter_list() {
        let json = r#"{
            "shelters": [
                {"_id": "s1", "name": "Central", "location": {"type": "Point", "coordinates": [77.2090, 28.6139]}, "status": "READY", "capacity": 500},
                {"_id": "s2", "name": "North", "location": [28.6315, 77.2167]}
            ],
            "total": 2
        }"#;
        let report = parse_snapshot(json, Category::Shelter).unwrap();
        assert!(report.rejected.is_empty());
        assert_eq!(report.entities.len(), 2);

        let s1 = &report.entities[0];
        assert_eq!(s1.id, "s1");
        assert_eq!(s1.category, Category::Shelter);
        assert_eq!(s1.coordinate, Coordinate::new(28.6139, 77.2090).unwrap());
        assert_eq!(s1.payload.get("name"), Some(&Value::from("Central")));
        assert!(s1.is_available_shelter());
        assert_eq!(report.entities[1].coordinate.lat, 28.6315);
    }

    #[test]
    fn parses_bare_alert_array_with_severity_and_time() {
        let json = r#"[
            {"id": 7, "latitude": 28.70, "longitude": 77.10, "risk_level": "HIGH", "timestamp": "2024-07-01T10:30:00.123456"},
            {"id": "a2", "location": {"lat": 28.52, "lng": 77.15}, "severity": "critical", "created_at": "2024-07-01T11:00:00Z"}
        ]"#;
        let report = parse_snapshot(json, Category::Alert).unwrap();
        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.entities[0].id, "7");
        assert_eq!(report.entities[0].severity, Some(Severity::High));
        assert_eq!(
            report.entities[1].reported_at,
            Some(Utc.with_ymd_and_hms(2024, 7, 1, 11, 0, 0).unwrap())
        );
        assert!(report.entities[0].reported_at.is_some());
    }

    #[test]
    fn rejects_bad_records_but_keeps_the_rest() {
        let json = r#"[
            {"id": "ok", "location": [10.0, 10.0]},
            {"location": [10.0, 10.0]},
            {"id": "far", "location": [95.0, 10.0]},
            {"id": "nowhere"},
            {"id": "ok", "location": [20.0, 20.0]},
            "not an object"
        ]"#;
        let report = parse_snapshot(json, Category::SosRequest).unwrap();
        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.entities[0].coordinate.lat, 10.0);

        let indices: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 5]);
        assert!(matches!(report.rejected[0].error, MapError::InvalidInput(_)));
        assert_eq!(
            report.rejected[1].error,
            MapError::InvalidCoordinate { lat: 95.0, lng: 10.0 }
        );
        assert!(matches!(report.rejected[3].error, MapError::Payload(_)));
    }

    #[test]
    fn record_category_overrides_default() {
        let json = r#"[{"id": "x", "location": [1.0, 1.0], "category": "sensor"}]"#;
        let report = parse_snapshot(json, Category::Alert).unwrap();
        assert_eq!(report.entities[0].category, Category::Sensor);
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(
            parse_snapshot("{not json", Category::Alert),
            Err(MapError::Payload(_))
        ));
        assert!(matches!(
            parse_snapshot("42", Category::Alert),
            Err(MapError::Payload(_))
        ));
        assert!(matches!(
            parse_snapshot(r#"{"a": [], "b": []}"#, Category::Alert),
            Err(MapError::Payload(_))
        ));
    }

    #[test]
    fn wrapped_list_prefers_matching_collection_name() {
        let json = r#"{"alerts": [], "sos_requests": [{"id": "r1", "location": [1.0, 2.0]}]}"#;
        let report = parse_snapshot(json, Category::SosRequest).unwrap();
        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.entities[0].category, Category::SosRequest);
    }
}
