//! Core types for the traffic simulation
//!
//! Plain value types shared by the road, obstacle and engine modules.

use serde::{Deserialize, Serialize};

/// A unique identifier for a vehicle, stable for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub usize);

/// A single `(position, lane)` cell of the road
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub lane: usize,
    pub position: usize,
}

impl Cell {
    pub fn new(position: usize, lane: usize) -> Self {
        Self { lane, position }
    }
}

/// Class of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VehicleClass {
    /// Regular passenger car
    #[default]
    #[serde(rename = "avto", alias = "car")]
    Car,
    /// Truck, longer and optionally speed-capped
    #[serde(rename = "tovornjak", alias = "truck")]
    Truck,
}

impl VehicleClass {
    /// Number of cells a vehicle of this class occupies by default
    pub fn default_length(self) -> usize {
        match self {
            VehicleClass::Car => CAR_LENGTH,
            VehicleClass::Truck => TRUCK_LENGTH,
        }
    }
}

/// Length of a car in cells
pub const CAR_LENGTH: usize = 1;

/// Length of a truck in cells
pub const TRUCK_LENGTH: usize = 3;

/// Speed trucks are limited to when the truck cap is switched on
pub const DEFAULT_TRUCK_CAP_SPEED: usize = 4;

/// Road length used when a configuration omits it
pub const DEFAULT_ROAD_LENGTH: usize = 200;

/// Lane count used when a configuration omits it
pub const DEFAULT_LANES: usize = 2;

/// Longest road a configuration may ask for
pub const MAX_ROAD_LENGTH: usize = 100_000;

/// Most lanes a configuration may ask for
pub const MAX_LANES: usize = 64;

/// Upper bound on `length * lanes`, the size of the occupancy grid
pub const MAX_ROAD_CELLS: usize = 1_000_000;

/// Braking probability used when a configuration omits it
pub const DEFAULT_BRAKING_PROBABILITY: f64 = 0.2;

/// Cells scanned ahead when a configuration omits it
pub const DEFAULT_LOOKAHEAD: usize = 15;

/// Random population density used when a configuration omits it
pub const DEFAULT_DENSITY: f64 = 0.1;

/// Intrinsic top speed of vehicles that do not specify one
pub const DEFAULT_MAX_SPEED: usize = 5;

/// Share of trucks among randomly placed vehicles in mixed population mode
pub const RANDOM_TRUCK_SHARE: f64 = 0.2;

/// Colors handed out to vehicles that arrive without one
pub const VEHICLE_PALETTE: [&str; 6] = [
    "#e76f51", "#457b9d", "#2a9d8f", "#f4a261", "#7c1d05", "#003350",
];
