//! Immutable, serializable views of the engine state
//!
//! Field names follow the wire contract consumed by the presentation layer.

use serde::{Deserialize, Serialize};

use super::types::{VehicleClass, VehicleId};

/// An obstacle cell as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleView {
    #[serde(rename = "poz")]
    pub position: usize,
    #[serde(rename = "pas")]
    pub lane: usize,
}

/// A vehicle as seen from outside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleView {
    pub id: VehicleId,
    #[serde(rename = "poz")]
    pub position: usize,
    #[serde(rename = "pas")]
    pub lane: usize,
    #[serde(rename = "hitrost")]
    pub speed: usize,
    #[serde(rename = "max_hitrost")]
    pub max_speed: usize,
    #[serde(rename = "dolzina")]
    pub length: usize,
    #[serde(rename = "tip")]
    pub class: VehicleClass,
    pub color: String,
}

/// Aggregate flow figures for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FlowStats {
    pub vehicles: usize,
    pub mean_speed: f64,
    pub stopped: usize,
    /// Share of lane cells covered by vehicles
    pub density: f64,
}

/// Full state of the simulation at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "dolzina_ceste")]
    pub length: usize,
    #[serde(rename = "st_pasov")]
    pub lanes: usize,
    #[serde(rename = "p_zaviranje")]
    pub braking_probability: f64,
    pub lookahead: usize,
    pub truck_cap_enabled: bool,
    pub truck_cap_speed: usize,
    /// Dense cap per position, `null` where no zone applies
    #[serde(rename = "omejitve")]
    pub limits: Vec<Option<usize>>,
    #[serde(rename = "ovire")]
    pub obstacles: Vec<ObstacleView>,
    #[serde(rename = "avti")]
    pub vehicles: Vec<VehicleView>,
    pub stats: FlowStats,
}

impl Snapshot {
    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleView> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    /// Logs a short summary of the snapshot at info level
    pub fn log_summary(&self) {
        log::info!("=== Traffic Simulation Summary ===");
        log::info!("Tick: {}", self.tick);
        log::info!(
            "Road: {} cells x {} lanes, lookahead {}",
            self.length,
            self.lanes,
            self.lookahead
        );
        log::info!("Obstacle cells: {}", self.obstacles.len());
        log::info!("Vehicles: {}", self.stats.vehicles);
        log::info!("Mean speed: {:.2}", self.stats.mean_speed);
        log::info!("Stopped vehicles: {}", self.stats.stopped);
        log::info!("Density: {:.3}", self.stats.density);
    }
}

impl FlowStats {
    pub fn from_vehicles(vehicles: &[VehicleView], cells: usize) -> Self {
        if vehicles.is_empty() {
            return Self::default();
        }
        let total_speed: usize = vehicles.iter().map(|v| v.speed).sum();
        let covered: usize = vehicles.iter().map(|v| v.length).sum();
        Self {
            vehicles: vehicles.len(),
            mean_speed: total_speed as f64 / vehicles.len() as f64,
            stopped: vehicles.iter().filter(|v| v.speed == 0).count(),
            density: if cells > 0 {
                covered as f64 / cells as f64
            } else {
                0.0
            },
        }
    }
}
