//! Cellular-automaton traffic simulation
//!
//! This module contains the simulation core: a circular multi-lane road with
//! speed-limit zones and obstacles, and the engine that moves vehicles along
//! it. It has no knowledge of the service layer or any transport.

mod engine;
mod error;
mod obstacles;
mod road;
mod snapshot;
mod types;
mod vehicle;

pub use engine::{InitConfig, ObstacleRun, Population, PopulationMode, TrafficEngine};
pub use error::{SimError, SimResult};
pub use obstacles::{run_cells, ObstacleSet};
pub use road::{RoadConfig, RoadModel, SpeedLimitZone};
pub use snapshot::{FlowStats, ObstacleView, Snapshot, VehicleView};
pub use types::{
    Cell, VehicleClass, VehicleId, CAR_LENGTH, DEFAULT_BRAKING_PROBABILITY, DEFAULT_DENSITY,
    DEFAULT_LANES, DEFAULT_LOOKAHEAD, DEFAULT_MAX_SPEED, DEFAULT_ROAD_LENGTH,
    DEFAULT_TRUCK_CAP_SPEED, MAX_LANES, MAX_ROAD_CELLS, MAX_ROAD_LENGTH, RANDOM_TRUCK_SHARE,
    TRUCK_LENGTH, VEHICLE_PALETTE,
};
pub use vehicle::{Vehicle, VehicleSpec};
