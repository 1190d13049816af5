use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

pub type EntityId = String;

/// Opaque per-entity fields the core never interprets (names, contacts, messages...).
pub type Payload = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Alert,
    SosRequest,
    Shelter,
    Sensor,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Alert,
        Category::SosRequest,
        Category::Shelter,
        Category::Sensor,
    ];

    /// Whether selecting an entity of this category asks for a route to safety.
    pub fn is_incident(self) -> bool {
        matches!(self, Category::Alert | Category::SosRequest)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "alert" | "alerts" => Ok(Category::Alert),
            "sos" | "sos_request" | "sos_requests" => Ok(Category::SosRequest),
            "shelter" | "shelters" => Ok(Category::Shelter),
            "sensor" | "sensors" => Ok(Category::Sensor),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MODERATE" | "MEDIUM" => Ok(Severity::Moderate),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" | "SEVERE" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShelterStatus {
    Ready,
    Occupied,
    Full,
    Maintenance,
}

impl FromStr for ShelterStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "READY" | "AVAILABLE" | "OPEN" => Ok(ShelterStatus::Ready),
            "OCCUPIED" => Ok(ShelterStatus::Occupied),
            "FULL" => Ok(ShelterStatus::Full),
            "MAINTENANCE" | "CLOSED" => Ok(ShelterStatus::Maintenance),
            other => Err(format!("unknown shelter status: {other}")),
        }
    }
}

/// An alert, SOS request, shelter or sensor with a validated position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub id: EntityId,
    pub coordinate: Coordinate,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: Payload,
}

impl GeoEntity {
    pub fn new(id: impl Into<EntityId>, coordinate: Coordinate, category: Category) -> Self {
        Self {
            id: id.into(),
            coordinate,
            category,
            severity: None,
            reported_at: None,
            payload: Payload::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_reported_at(mut self, at: DateTime<Utc>) -> Self {
        self.reported_at = Some(at);
        self
    }

    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Shelter status from the payload, if present and recognised.
    pub fn shelter_status(&self) -> Option<ShelterStatus> {
        self.payload
            .get("status")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    /// `(current_occupancy, capacity)` when both are present in the payload.
    pub fn occupancy(&self) -> Option<(u64, u64)> {
        let occupied = self.payload.get("current_occupancy")?.as_u64()?;
        let capacity = self.payload.get("capacity")?.as_u64()?;
        Some((occupied, capacity))
    }

    /// Whether a shelter can take people in. Missing status counts as open.
    pub fn is_available_shelter(&self) -> bool {
        if self.category != Category::Shelter {
            return false;
        }
        let open = !matches!(
            self.shelter_status(),
            Some(ShelterStatus::Full | ShelterStatus::Maintenance)
        );
        let has_room = self
            .occupancy()
            .is_none_or(|(occupied, capacity)| occupied < capacity);
        open && has_room
    }
}

/// Stable CRC32 key over a set of entity ids, independent of their order.
pub fn group_key<'a>(ids: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut sorted: Vec<&str> = ids.into_iter().collect();
    sorted.sort_unstable();
    let mut hasher = crc32fast::Hasher::new();
    for id in sorted {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}
