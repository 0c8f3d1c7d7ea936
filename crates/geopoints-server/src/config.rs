//! Service configuration.
//!
//! [`ServiceConfig`] collects everything that varies between deployments: the point
//! schema, row limits, the failure policy of each endpoint, CORS origins and the upload
//! size cap. It is built with `with_*` methods on top of [`Default`].

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use geopoints_core::PointSchema;

/// Default row limit for `GET /api/points`.
pub const DEFAULT_POINTS_ROW_LIMIT: usize = 500_000;

/// Default data file, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "../AIS/maritime_graph/data/ships.arrow";

/// Development origins allowed by default.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

/// What an endpoint does when loading or projecting fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the error and answer 200 with an empty point set.
    Soft,
    /// Answer with an error status and a fixed message.
    Loud,
}

impl FailurePolicy {
    /// Returns the string representation of this policy.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FailurePolicy::Soft => "soft",
            FailurePolicy::Loud => "loud",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soft" => Ok(FailurePolicy::Soft),
            "loud" => Ok(FailurePolicy::Loud),
            other => Err(format!("unknown failure policy '{other}' (expected soft or loud)")),
        }
    }
}

/// Configuration for the point service and its HTTP surface.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the server listens on
    pub bind: SocketAddr,
    /// Target point schema
    pub schema: PointSchema,
    /// Row limit for `GET /api/points`; `None` keeps every row
    pub points_row_limit: Option<usize>,
    /// Row limit for uploads; `None` keeps every row
    pub upload_row_limit: Option<usize>,
    /// Failure policy for `GET /api/points`
    pub points_policy: FailurePolicy,
    /// Failure policy for uploads
    pub upload_policy: FailurePolicy,
    /// Allowed CORS origins; `"*"` allows any origin
    pub cors_origins: Vec<String>,
    /// Maximum upload body size in bytes; `None` leaves uploads unbounded
    pub max_upload_bytes: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            schema: PointSchema::Vessel,
            points_row_limit: Some(DEFAULT_POINTS_ROW_LIMIT),
            upload_row_limit: None,
            points_policy: FailurePolicy::Soft,
            upload_policy: FailurePolicy::Loud,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
            max_upload_bytes: None,
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen address
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Set the point schema
    #[must_use]
    pub fn with_schema(mut self, schema: PointSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the row limit for `GET /api/points`
    #[must_use]
    pub fn with_points_row_limit(mut self, limit: Option<usize>) -> Self {
        self.points_row_limit = limit;
        self
    }

    /// Set the row limit for uploads
    #[must_use]
    pub fn with_upload_row_limit(mut self, limit: Option<usize>) -> Self {
        self.upload_row_limit = limit;
        self
    }

    /// Set the failure policy for `GET /api/points`
    #[must_use]
    pub fn with_points_policy(mut self, policy: FailurePolicy) -> Self {
        self.points_policy = policy;
        self
    }

    /// Set the failure policy for uploads
    #[must_use]
    pub fn with_upload_policy(mut self, policy: FailurePolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    /// Set the allowed CORS origins
    #[must_use]
    pub fn with_cors_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Set the upload size cap
    #[must_use]
    pub fn with_max_upload_bytes(mut self, max: Option<usize>) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Returns `true` if any origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_vessel_service() {
        let config = ServiceConfig::default();
        assert_eq!(config.schema, PointSchema::Vessel);
        assert_eq!(config.points_row_limit, Some(500_000));
        assert_eq!(config.upload_row_limit, None);
        assert_eq!(config.points_policy, FailurePolicy::Soft);
        assert_eq!(config.upload_policy, FailurePolicy::Loud);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_builder_methods() {
        let config = ServiceConfig::new()
            .with_schema(PointSchema::City)
            .with_points_row_limit(Some(200_000))
            .with_points_policy(FailurePolicy::Loud)
            .with_cors_origins(["*"])
            .with_max_upload_bytes(Some(1024));
        assert_eq!(config.schema, PointSchema::City);
        assert_eq!(config.points_row_limit, Some(200_000));
        assert_eq!(config.points_policy, FailurePolicy::Loud);
        assert!(config.allows_any_origin());
        assert_eq!(config.max_upload_bytes, Some(1024));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("SOFT".parse::<FailurePolicy>(), Ok(FailurePolicy::Soft));
        assert_eq!("loud".parse::<FailurePolicy>(), Ok(FailurePolicy::Loud));
        assert!("quiet".parse::<FailurePolicy>().is_err());
    }
}
