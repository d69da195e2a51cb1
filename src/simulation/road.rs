//! Circular road topology and its speed-limit overlay

use serde::{Deserialize, Serialize};

use super::error::{SimError, SimResult};
use super::types::{
    DEFAULT_BRAKING_PROBABILITY, DEFAULT_LANES, DEFAULT_LOOKAHEAD, DEFAULT_ROAD_LENGTH,
    DEFAULT_TRUCK_CAP_SPEED, MAX_LANES, MAX_ROAD_CELLS, MAX_ROAD_LENGTH,
};

/// Static parameters of a road
#[derive(Debug, Clone, PartialEq)]
pub struct RoadConfig {
    /// Number of cells in each lane
    pub length: usize,
    pub lanes: usize,
    /// Chance of a spontaneous slowdown per vehicle per tick
    pub braking_probability: f64,
    /// Cells a vehicle scans ahead for hazards
    pub lookahead: usize,
    pub truck_cap_enabled: bool,
    pub truck_cap_speed: usize,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_ROAD_LENGTH,
            lanes: DEFAULT_LANES,
            braking_probability: DEFAULT_BRAKING_PROBABILITY,
            lookahead: DEFAULT_LOOKAHEAD,
            truck_cap_enabled: false,
            truck_cap_speed: DEFAULT_TRUCK_CAP_SPEED,
        }
    }
}

impl RoadConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.length == 0 {
            return Err(SimError::invalid("road length must be positive"));
        }
        if self.lanes == 0 {
            return Err(SimError::invalid("lane count must be positive"));
        }
        if self.length > MAX_ROAD_LENGTH {
            return Err(SimError::invalid(format!(
                "road length {} exceeds the limit of {}",
                self.length, MAX_ROAD_LENGTH
            )));
        }
        if self.lanes > MAX_LANES {
            return Err(SimError::invalid(format!(
                "lane count {} exceeds the limit of {}",
                self.lanes, MAX_LANES
            )));
        }
        match self.length.checked_mul(self.lanes) {
            Some(cells) if cells <= MAX_ROAD_CELLS => {}
            _ => {
                return Err(SimError::invalid(format!(
                    "road of {} cells x {} lanes exceeds the limit of {} cells",
                    self.length, self.lanes, MAX_ROAD_CELLS
                )))
            }
        }
        if !(0.0..=1.0).contains(&self.braking_probability) {
            return Err(SimError::invalid(format!(
                "braking probability must lie in [0, 1] (got {})",
                self.braking_probability
            )));
        }
        validate_lookahead(self.lookahead)
    }
}

fn validate_lookahead(lookahead: usize) -> SimResult<()> {
    if lookahead == 0 {
        return Err(SimError::invalid("lookahead must be positive"));
    }
    Ok(())
}

/// A half-open interval `[from, to)` of positions with a speed cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLimitZone {
    #[serde(rename = "od")]
    pub from: usize,
    #[serde(rename = "do")]
    pub to: usize,
    #[serde(rename = "max_hitrost")]
    pub max_speed: usize,
}

impl SpeedLimitZone {
    pub fn new(from: usize, to: usize, max_speed: usize) -> Self {
        Self {
            from,
            to,
            max_speed,
        }
    }
}

/// Road topology plus the dense per-position speed cap array
#[derive(Debug, Clone)]
pub struct RoadModel {
    config: RoadConfig,
    /// `limits[pos]` is the cap at `pos`, `None` where no zone applies
    limits: Vec<Option<usize>>,
}

impl RoadModel {
    pub fn new(config: RoadConfig) -> SimResult<Self> {
        config.validate()?;
        let limits = vec![None; config.length];
        Ok(Self { config, limits })
    }

    /// Replaces the whole configuration and drops every zone
    pub fn configure(&mut self, config: RoadConfig) -> SimResult<()> {
        *self = Self::new(config)?;
        Ok(())
    }

    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    pub fn length(&self) -> usize {
        self.config.length
    }

    pub fn lanes(&self) -> usize {
        self.config.lanes
    }

    pub fn lookahead(&self) -> usize {
        self.config.lookahead
    }

    pub fn braking_probability(&self) -> f64 {
        self.config.braking_probability
    }

    /// Position `offset` cells ahead of `position`, wrapping around the ring
    pub fn ahead(&self, position: usize, offset: usize) -> usize {
        (position + offset) % self.config.length
    }

    /// Position `offset` cells behind `position`, wrapping around the ring
    pub fn behind(&self, position: usize, offset: usize) -> usize {
        let length = self.config.length;
        (position + length - offset % length) % length
    }

    pub fn check_lane(&self, lane: usize) -> SimResult<()> {
        if lane >= self.config.lanes {
            return Err(SimError::invalid(format!(
                "lane {} does not exist on a road with {} lanes",
                lane, self.config.lanes
            )));
        }
        Ok(())
    }

    /// Rebuilds the cap array from `zones`, later zones overriding earlier ones
    ///
    /// All zones are validated before the array is touched.
    pub fn set_limits(&mut self, zones: &[SpeedLimitZone]) -> SimResult<()> {
        for zone in zones {
            if zone.from > zone.to {
                return Err(SimError::invalid(format!(
                    "speed limit zone [{}, {}) is inverted",
                    zone.from, zone.to
                )));
            }
        }

        let length = self.config.length;
        let mut limits = vec![None; length];
        for zone in zones {
            let end = zone.to.min(length);
            for cap in limits.iter_mut().take(end).skip(zone.from) {
                *cap = Some(zone.max_speed);
            }
        }
        self.limits = limits;
        Ok(())
    }

    pub fn zone_cap_at(&self, position: usize) -> Option<usize> {
        self.limits.get(position).copied().flatten()
    }

    pub fn limits(&self) -> &[Option<usize>] {
        &self.limits
    }

    pub fn set_lookahead(&mut self, lookahead: usize) -> SimResult<()> {
        validate_lookahead(lookahead)?;
        self.config.lookahead = lookahead;
        Ok(())
    }

    pub fn set_truck_cap(&mut self, enabled: bool, max_speed: usize) {
        self.config.truck_cap_enabled = enabled;
        self.config.truck_cap_speed = max_speed;
    }

    /// The truck cap if it is currently switched on
    pub fn truck_cap(&self) -> Option<usize> {
        self.config
            .truck_cap_enabled
            .then_some(self.config.truck_cap_speed)
    }
}
