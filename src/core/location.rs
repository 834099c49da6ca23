//! Current-position lookup for location-based insights.
//!
//! Location is best effort. Whatever goes wrong (no provider, permission
//! denied, timeout) the answer is "location unknown", never an error.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
}

impl Coordinates {
    /// Builds coordinates if both values are in range
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude))
            .then_some(Self {
                latitude,
                longitude,
            })
    }
}

/// How a position should be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for the most accurate fix available
    pub high_accuracy: bool,
    /// Give up after this long
    pub timeout: Duration,
    /// Oldest cached fix that may be reused; zero means always fresh
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Why no position could be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The user or the platform refused access
    Denied(String),
    /// The position could not be determined
    Unavailable(String),
}

/// Something that can report where the farm is.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Returns the current position honouring `options` where possible
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, LocationError>;
}

/// Result of a location lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationFix {
    /// The position is known
    Known(Coordinates),
    /// The position is unknown, with a user-facing explanation
    Unknown(String),
}

impl LocationFix {
    /// Coordinates if known
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Known(coordinates) => Some(*coordinates),
            Self::Unknown(_) => None,
        }
    }
}

/// Asks `provider` for the current position, bounded by `options.timeout`.
pub async fn locate(provider: &dyn LocationProvider, options: &PositionOptions) -> LocationFix {
    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(Ok(coordinates)) => {
            debug!(
                "Position acquired: {:.4}, {:.4}",
                coordinates.latitude, coordinates.longitude
            );
            LocationFix::Known(coordinates)
        }
        Ok(Err(LocationError::Denied(reason) | LocationError::Unavailable(reason))) => {
            warn!("Could not determine location: {reason}");
            LocationFix::Unknown(reason)
        }
        Err(_) => {
            warn!("Location lookup timed out after {:?}", options.timeout);
            LocationFix::Unknown(format!(
                "no position within {} seconds",
                options.timeout.as_secs()
            ))
        }
    }
}

/// Reports the fixed farm coordinates from the configuration, or a denial
/// when none are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredLocation {
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocation {
    /// Provider for `coordinates` (`None` means location is not available)
    #[must_use]
    pub const fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for ConfiguredLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        self.coordinates.ok_or_else(|| {
            LocationError::Denied("no farm location is configured".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverAnswers;

    #[async_trait]
    impl LocationProvider for NeverAnswers {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[test]
    fn test_coordinates_range_check() {
        assert!(Coordinates::new(-15.8, -47.9).is_some());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, 181.0).is_none());
    }

    #[tokio::test]
    async fn test_configured_location_known() {
        let farm = Coordinates {
            latitude: -21.2,
            longitude: -47.8,
        };
        let fix = locate(&ConfiguredLocation::new(Some(farm)), &PositionOptions::default()).await;
        assert_eq!(fix, LocationFix::Known(farm));
        assert_eq!(fix.coordinates(), Some(farm));
    }

    #[tokio::test]
    async fn test_missing_location_is_unknown_not_error() {
        let fix = locate(&ConfiguredLocation::default(), &PositionOptions::default()).await;
        assert!(matches!(fix, LocationFix::Unknown(_)));
        assert!(fix.coordinates().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_times_out() {
        let fix = locate(&NeverAnswers, &PositionOptions::default()).await;
        assert_eq!(
            fix,
            LocationFix::Unknown("no position within 10 seconds".to_string())
        );
    }
}
