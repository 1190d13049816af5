use std::str::FromStr;

use floodwatch_shared::{Category, GeoEntity};
use tracing::warn;

use crate::config::{ClusterConfig, RouteConfig, ViewportConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Citizen,
    Admin,
    Generic,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "citizen" | "user" => Ok(Role::Citizen),
            "admin" | "operator" => Ok(Role::Admin),
            "generic" | "public" => Ok(Role::Generic),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// What one kind of map view shows and how its camera behaves.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewProfile {
    pub role: Role,
    pub categories: Vec<Category>,
    /// Entities beyond this many are not drawn.
    pub max_entities: Option<usize>,
    /// Recenter on the most severe alert whenever new data arrives.
    pub follow_alerts: bool,
    pub viewport: ViewportConfig,
    pub cluster: ClusterConfig,
    pub route: RouteConfig,
}

impl ViewProfile {
    pub fn citizen() -> Self {
        Self {
            role: Role::Citizen,
            categories: vec![Category::Alert, Category::Shelter],
            max_entities: Some(500),
            follow_alerts: true,
            viewport: ViewportConfig::default(),
            cluster: ClusterConfig::default(),
            route: RouteConfig::default(),
        }
    }

    /// Operators pan a lot; hand the camera back sooner.
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            categories: Category::ALL.to_vec(),
            max_entities: Some(5_000),
            follow_alerts: false,
            viewport: ViewportConfig {
                quiet_delay_ms: 500.0,
                zoom_settle_ms: 2_000.0,
                ..ViewportConfig::default()
            },
            cluster: ClusterConfig::default(),
            route: RouteConfig::default(),
        }
    }

    pub fn generic() -> Self {
        Self {
            role: Role::Generic,
            categories: Category::ALL.to_vec(),
            max_entities: None,
            follow_alerts: false,
            viewport: ViewportConfig::default(),
            cluster: ClusterConfig::default(),
            route: RouteConfig::default(),
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Citizen => Self::citizen(),
            Role::Admin => Self::admin(),
            Role::Generic => Self::generic(),
        }
    }

    /// The role preset with `FLOODWATCH_*` overrides applied on top.
    pub fn from_env(role: Role) -> Self {
        let mut profile = Self::for_role(role);
        profile.viewport = profile.viewport.clone().with_env_overrides();
        profile.cluster = ClusterConfig::from_env();
        profile.route = RouteConfig::from_env();
        profile
    }

    pub fn shows(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Keep the entities this profile shows, in input order, up to the cap.
    pub fn filter(&self, entities: Vec<GeoEntity>) -> Vec<GeoEntity> {
        let mut shown: Vec<GeoEntity> = entities
            .into_iter()
            .filter(|e| self.shows(e.category))
            .collect();
        if let Some(cap) = self.max_entities
            && shown.len() > cap
        {
            warn!(
                role = ?self.role,
                total = shown.len(),
                cap,
                "entity cap reached, dropping the rest"
            );
            shown.truncate(cap);
        }
        shown
    }
}

impl Default for ViewProfile {
    fn default() -> Self {
        Self::generic()
    }
}
