//! Device position capability.
//!
//! A terminal has no built-in positioning, so the position either comes from
//! configuration / flags ([`FixedPosition`]) or the capability is reported as
//! missing ([`Unsupported`]).

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{Config, error::LocationError, model::Coordinates};

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Whether a position can be requested at all.
    fn is_supported(&self) -> bool;

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl Geolocator for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable("no positioning capability".to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let Coordinates { latitude, longitude } = self.0;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::Unavailable(format!(
                "coordinates out of range: {latitude}, {longitude}"
            )));
        }
        Ok(self.0)
    }
}

/// Pick a geolocator: an explicit position wins over the configured home.
pub fn geolocator_from_config(
    config: &Config,
    explicit: Option<Coordinates>,
) -> Arc<dyn Geolocator> {
    match explicit.or(config.home) {
        Some(coords) => Arc::new(FixedPosition(coords)),
        None => Arc::new(Unsupported),
    }
}
