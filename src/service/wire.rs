//! JSON request and response bodies
//!
//! Field names are the wire contract of the web client and are kept
//! verbatim through serde renames.

use serde::{Deserialize, Serialize};

use crate::simulation::{
    InitConfig, ObstacleRun, Population, PopulationMode, RoadConfig, SimError, Snapshot,
    SpeedLimitZone, VehicleClass, VehicleSpec, DEFAULT_BRAKING_PROBABILITY, DEFAULT_DENSITY,
    DEFAULT_LANES, DEFAULT_LOOKAHEAD, DEFAULT_MAX_SPEED, DEFAULT_ROAD_LENGTH,
    DEFAULT_TRUCK_CAP_SPEED,
};

/// One request, discriminated by its `op` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Init(InitRequest),
    Step(StepRequest),
    State,
    SetLimits(SetLimitsRequest),
    #[serde(rename = "add_vozilo", alias = "add_vehicle")]
    AddVehicle(AddVehicleRequest),
    AddObstacle(ObstacleRequest),
    RemoveObstacle(ObstacleRequest),
    SetLookahead(SetLookaheadRequest),
    SetTruckCap(SetTruckCapRequest),
    /// Stops an in-flight step; answered without a state
    Cancel,
}

/// An obstacle run; `len` defaults to a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleRequest {
    #[serde(rename = "poz", default)]
    pub position: usize,
    #[serde(rename = "pas", default)]
    pub lane: usize,
    #[serde(rename = "len", default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

impl From<ObstacleRequest> for ObstacleRun {
    fn from(request: ObstacleRequest) -> Self {
        ObstacleRun {
            position: request.position,
            lane: request.lane,
            length: request.length.unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitRequest {
    #[serde(rename = "dolzina_ceste")]
    pub length: usize,
    #[serde(rename = "st_pasov")]
    pub lanes: usize,
    #[serde(rename = "p_zaviranje")]
    pub braking_probability: f64,
    pub lookahead: usize,
    #[serde(rename = "omejitve")]
    pub zones: Vec<SpeedLimitZone>,
    #[serde(rename = "ovire")]
    pub obstacles: Vec<ObstacleRequest>,
    /// Populate with cars only
    pub random: bool,
    /// Populate with a mix of cars and trucks
    #[serde(rename = "random_vozila")]
    pub random_vehicles: bool,
    #[serde(rename = "gostota")]
    pub density: Option<f64>,
    #[serde(rename = "max_hitrost_interval")]
    pub max_speed_interval: Option<[usize; 2]>,
    pub truck_cap_enabled: bool,
}

impl Default for InitRequest {
    fn default() -> Self {
        Self {
            length: DEFAULT_ROAD_LENGTH,
            lanes: DEFAULT_LANES,
            braking_probability: DEFAULT_BRAKING_PROBABILITY,
            lookahead: DEFAULT_LOOKAHEAD,
            zones: Vec::new(),
            obstacles: Vec::new(),
            random: false,
            random_vehicles: false,
            density: None,
            max_speed_interval: None,
            truck_cap_enabled: false,
        }
    }
}

impl From<InitRequest> for InitConfig {
    fn from(request: InitRequest) -> Self {
        let mode = if request.random_vehicles {
            Some(PopulationMode::Mixed)
        } else if request.random {
            Some(PopulationMode::Cars)
        } else {
            None
        };
        let population = mode.map(|mode| Population {
            mode,
            density: request.density.unwrap_or(DEFAULT_DENSITY),
            max_speed_interval: request
                .max_speed_interval
                .map(|[min, max]| (min, max))
                .unwrap_or((DEFAULT_MAX_SPEED, DEFAULT_MAX_SPEED)),
        });

        InitConfig {
            road: RoadConfig {
                length: request.length,
                lanes: request.lanes,
                braking_probability: request.braking_probability,
                lookahead: request.lookahead,
                truck_cap_enabled: request.truck_cap_enabled,
                truck_cap_speed: DEFAULT_TRUCK_CAP_SPEED,
            },
            zones: request.zones,
            obstacles: request.obstacles.into_iter().map(ObstacleRun::from).collect(),
            population,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    #[serde(default = "default_steps")]
    pub n: usize,
}

fn default_steps() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SetLimitsRequest {
    #[serde(rename = "omejitve", default)]
    pub zones: Vec<SpeedLimitZone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddVehicleRequest {
    #[serde(rename = "poz", default)]
    pub position: usize,
    #[serde(rename = "pas", default)]
    pub lane: usize,
    #[serde(rename = "max_hitrost", default = "default_max_speed")]
    pub max_speed: usize,
    #[serde(rename = "tip", default)]
    pub class: VehicleClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "dolzina", default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

fn default_max_speed() -> usize {
    DEFAULT_MAX_SPEED
}

impl From<AddVehicleRequest> for VehicleSpec {
    fn from(request: AddVehicleRequest) -> Self {
        VehicleSpec {
            position: request.position,
            lane: request.lane,
            max_speed: request.max_speed,
            class: request.class,
            length: request.length,
            color: request.color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLookaheadRequest {
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
}

fn default_lookahead() -> usize {
    DEFAULT_LOOKAHEAD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTruckCapRequest {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_truck_cap")]
    pub max_speed: usize,
}

fn default_truck_cap() -> usize {
    DEFAULT_TRUCK_CAP_SPEED
}

/// One response line: either a snapshot or an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(snapshot: Snapshot) -> Self {
        Self {
            ok: true,
            state: Some(snapshot),
            kind: None,
            error: None,
        }
    }

    /// Success with no state attached
    pub fn acknowledged() -> Self {
        Self {
            ok: true,
            state: None,
            kind: None,
            error: None,
        }
    }

    pub fn failure(error: &SimError) -> Self {
        Self {
            ok: false,
            state: None,
            kind: Some(error.kind().to_string()),
            error: Some(error.to_string()),
        }
    }
}

impl From<Result<Snapshot, SimError>> for Response {
    fn from(result: Result<Snapshot, SimError>) -> Self {
        match result {
            Ok(snapshot) => Response::success(snapshot),
            Err(error) => Response::failure(&error),
        }
    }
}
