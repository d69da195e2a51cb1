//! The traffic engine: owns the road, its obstacles and vehicles, and advances
//! them one tick at a time.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::{SimError, SimResult};
use super::obstacles::{run_cells, ObstacleSet};
use super::road::{RoadConfig, RoadModel, SpeedLimitZone};
use super::snapshot::{FlowStats, ObstacleView, Snapshot, VehicleView};
use super::types::{
    Cell, VehicleClass, VehicleId, DEFAULT_DENSITY, DEFAULT_MAX_SPEED, RANDOM_TRUCK_SHARE,
    VEHICLE_PALETTE,
};
use super::vehicle::{Vehicle, VehicleSpec};

/// A run of obstacle cells starting at `position`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleRun {
    pub position: usize,
    pub lane: usize,
    pub length: usize,
}

impl ObstacleRun {
    pub fn unit(position: usize, lane: usize) -> Self {
        Self {
            position,
            lane,
            length: 1,
        }
    }
}

/// Which vehicles random population places
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationMode {
    /// Cars only
    Cars,
    /// Cars mixed with a share of trucks
    Mixed,
}

/// Parameters for random population on init
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub mode: PopulationMode,
    /// Chance that a free cell receives a vehicle
    pub density: f64,
    /// Inclusive range the vehicles' top speed is drawn from
    pub max_speed_interval: (usize, usize),
}

impl Default for Population {
    fn default() -> Self {
        Self {
            mode: PopulationMode::Cars,
            density: DEFAULT_DENSITY,
            max_speed_interval: (DEFAULT_MAX_SPEED, DEFAULT_MAX_SPEED),
        }
    }
}

impl Population {
    fn validate(&self) -> SimResult<()> {
        if !(0.0..=1.0).contains(&self.density) {
            return Err(SimError::invalid(format!(
                "density must lie in [0, 1] (got {})",
                self.density
            )));
        }
        let (min, max) = self.max_speed_interval;
        if min > max {
            return Err(SimError::invalid(format!(
                "max speed interval [{}, {}] is inverted",
                min, max
            )));
        }
        Ok(())
    }
}

/// Everything needed to build a fresh engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitConfig {
    pub road: RoadConfig,
    pub zones: Vec<SpeedLimitZone>,
    pub obstacles: Vec<ObstacleRun>,
    pub population: Option<Population>,
}

/// Content of one cell at tick start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occupant {
    Free,
    Obstacle,
    /// Index into the engine's vehicle list
    Vehicle(usize),
}

/// Dense lane-major occupancy grid
struct Occupancy {
    length: usize,
    cells: Vec<Occupant>,
}

impl Occupancy {
    fn build(road: &RoadModel, obstacles: &ObstacleSet, vehicles: &[Vehicle]) -> Self {
        let length = road.length();
        let mut occupancy = Self {
            length,
            cells: vec![Occupant::Free; length * road.lanes()],
        };
        for cell in obstacles.iter() {
            occupancy.set(cell.position, cell.lane, Occupant::Obstacle);
        }
        for (index, vehicle) in vehicles.iter().enumerate() {
            for position in vehicle.positions(road) {
                occupancy.set(position, vehicle.lane, Occupant::Vehicle(index));
            }
        }
        occupancy
    }

    fn at(&self, position: usize, lane: usize) -> Occupant {
        self.cells[lane * self.length + position]
    }

    fn set(&mut self, position: usize, lane: usize, occupant: Occupant) {
        self.cells[lane * self.length + position] = occupant;
    }
}

/// The cellular-automaton traffic engine
pub struct TrafficEngine {
    road: RoadModel,
    obstacles: ObstacleSet,
    /// Vehicles in insertion order
    vehicles: Vec<Vehicle>,
    next_id: usize,
    tick: u64,
    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl TrafficEngine {
    /// Create an empty engine on a road with the given configuration
    pub fn new(config: RoadConfig, rng: Option<StdRng>) -> SimResult<Self> {
        Ok(Self {
            road: RoadModel::new(config)?,
            obstacles: ObstacleSet::new(),
            vehicles: Vec::new(),
            next_id: 0,
            tick: 0,
            rng,
        })
    }

    /// Build a fresh engine from a full init configuration
    ///
    /// Every parameter is validated before anything is populated, so an error
    /// never yields a half-built engine.
    pub fn init(config: InitConfig, rng: Option<StdRng>) -> SimResult<Self> {
        if let Some(population) = &config.population {
            population.validate()?;
        }
        let mut engine = Self::new(config.road, rng)?;
        engine.road.set_limits(&config.zones)?;
        for run in &config.obstacles {
            engine.road.check_lane(run.lane)?;
        }

        for run in &config.obstacles {
            let cells = run_cells(run.position, run.lane, run.length, engine.road.length());
            engine.obstacles.add(&cells);
        }

        if let Some(population) = &config.population {
            engine.populate(population);
        }

        debug!(
            "Engine initialized: {} cells x {} lanes, {} obstacle cells, {} vehicles",
            engine.road.length(),
            engine.road.lanes(),
            engine.obstacles.len(),
            engine.vehicles.len()
        );
        Ok(engine)
    }

    fn random_bool(&mut self, probability: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(probability),
            None => rand::rng().random_bool(probability),
        }
    }

    fn random_speed(&mut self, range: RangeInclusive<usize>) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn palette_color(id: VehicleId) -> String {
        VEHICLE_PALETTE[id.0 % VEHICLE_PALETTE.len()].to_string()
    }

    fn push_vehicle(
        &mut self,
        position: usize,
        lane: usize,
        max_speed: usize,
        length: usize,
        class: VehicleClass,
        color: Option<String>,
    ) -> VehicleId {
        let id = self.next_vehicle_id();
        let color = color.unwrap_or_else(|| Self::palette_color(id));
        self.vehicles.push(Vehicle::new(
            id, position, lane, max_speed, length, class, color,
        ));
        id
    }

    /// Places vehicles on free cells, each with probability `density`
    fn populate(&mut self, population: &Population) {
        let mut occupancy = Occupancy::build(&self.road, &self.obstacles, &self.vehicles);
        let (min_speed, max_speed) = population.max_speed_interval;
        let road_length = self.road.length();
        let mut placed = 0;

        for lane in 0..self.road.lanes() {
            for position in 0..road_length {
                if !self.random_bool(population.density) {
                    continue;
                }
                let class = match population.mode {
                    PopulationMode::Cars => VehicleClass::Car,
                    PopulationMode::Mixed if self.random_bool(RANDOM_TRUCK_SHARE) => {
                        VehicleClass::Truck
                    }
                    PopulationMode::Mixed => VehicleClass::Car,
                };
                let length = class.default_length();
                if length >= road_length {
                    continue;
                }
                let free = (0..length).all(|i| {
                    occupancy.at(self.road.behind(position, i), lane) == Occupant::Free
                });
                if !free {
                    continue;
                }

                let speed = self.random_speed(min_speed..=max_speed);
                let index = self.vehicles.len();
                self.push_vehicle(position, lane, speed, length, class, None);
                for i in 0..length {
                    occupancy.set(self.road.behind(position, i), lane, Occupant::Vehicle(index));
                }
                placed += 1;
            }
        }
        debug!("Random population placed {} vehicles", placed);
    }

    /// Free cells between the vehicle's front and the nearest hazard ahead
    ///
    /// Hazards are obstacles and other vehicles' cells. When nothing blocks
    /// within the lookahead the vehicle may use the whole lookahead.
    fn gap_ahead(&self, occupancy: &Occupancy, index: usize) -> usize {
        let vehicle = &self.vehicles[index];
        let lookahead = self.road.lookahead();
        for distance in 1..=lookahead.min(self.road.length()) {
            let position = self.road.ahead(vehicle.position, distance);
            match occupancy.at(position, vehicle.lane) {
                Occupant::Free => {}
                Occupant::Vehicle(other) if other == index => {}
                Occupant::Obstacle | Occupant::Vehicle(_) => return distance - 1,
            }
        }
        lookahead
    }

    /// Advances the simulation by one tick
    ///
    /// Every vehicle decides off the occupancy at tick start; new speeds and
    /// positions are committed together afterwards.
    fn tick_once(&mut self) {
        let occupancy = Occupancy::build(&self.road, &self.obstacles, &self.vehicles);
        let braking = self.road.braking_probability();

        let mut updates = Vec::with_capacity(self.vehicles.len());
        for index in 0..self.vehicles.len() {
            let gap = self.gap_ahead(&occupancy, index);
            let cap = self.vehicles[index].effective_cap(&self.road);
            let brake = self.random_bool(braking);
            let vehicle = &self.vehicles[index];
            let speed = vehicle.next_speed(gap, cap, brake);
            updates.push((speed, self.road.ahead(vehicle.position, speed)));
        }

        for (vehicle, (speed, position)) in self.vehicles.iter_mut().zip(updates) {
            vehicle.speed = speed;
            vehicle.position = position;
        }
        self.tick += 1;
        trace!("Tick {} complete", self.tick);
    }

    /// Applies `n` ticks
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.tick_once();
        }
    }

    /// Applies up to `n` ticks, stopping early once `cancel` is raised
    ///
    /// The flag is checked between ticks only. Returns the ticks completed.
    pub fn advance_cancellable(&mut self, n: usize, cancel: &AtomicBool) -> usize {
        for done in 0..n {
            if cancel.load(Ordering::Relaxed) {
                debug!("Advance cancelled after {} of {} ticks", done, n);
                return done;
            }
            self.tick_once();
        }
        n
    }

    /// Places a vehicle at rest; every cell it covers must be free
    pub fn add_vehicle(&mut self, spec: VehicleSpec) -> SimResult<VehicleId> {
        self.road.check_lane(spec.lane)?;
        let road_length = self.road.length();
        let length = spec.length.unwrap_or_else(|| spec.class.default_length());
        if length == 0 || length >= road_length {
            return Err(SimError::invalid(format!(
                "vehicle length must lie in [1, {}) (got {})",
                road_length, length
            )));
        }

        let position = spec.position % road_length;
        let occupancy = Occupancy::build(&self.road, &self.obstacles, &self.vehicles);
        for i in 0..length {
            let cell = self.road.behind(position, i);
            if occupancy.at(cell, spec.lane) != Occupant::Free {
                return Err(SimError::OccupiedCell {
                    position: cell,
                    lane: spec.lane,
                });
            }
        }

        let id = self.push_vehicle(
            position,
            spec.lane,
            spec.max_speed,
            length,
            spec.class,
            spec.color,
        );
        debug!("Added {:?} {:?} at position {}, lane {}", spec.class, id, position, spec.lane);
        Ok(id)
    }

    /// Adds a run of obstacle cells; fails without change if a vehicle is in the way
    pub fn add_obstacle(&mut self, run: ObstacleRun) -> SimResult<usize> {
        self.road.check_lane(run.lane)?;
        let cells = run_cells(run.position, run.lane, run.length, self.road.length());
        let occupancy = Occupancy::build(&self.road, &self.obstacles, &self.vehicles);
        if let Some(cell) = cells
            .iter()
            .find(|cell| matches!(occupancy.at(cell.position, cell.lane), Occupant::Vehicle(_)))
        {
            return Err(SimError::OccupiedCell {
                position: cell.position,
                lane: cell.lane,
            });
        }
        Ok(self.obstacles.add(&cells))
    }

    /// Removes whatever cells of the run are present
    pub fn remove_obstacle(&mut self, run: ObstacleRun) -> SimResult<usize> {
        self.road.check_lane(run.lane)?;
        let cells = run_cells(run.position, run.lane, run.length, self.road.length());
        Ok(self.obstacles.remove(&cells))
    }

    /// Replaces all speed limit zones
    pub fn set_limits(&mut self, zones: &[SpeedLimitZone]) -> SimResult<()> {
        self.road.set_limits(zones)?;
        self.clamp_speeds();
        Ok(())
    }

    pub fn set_lookahead(&mut self, lookahead: usize) -> SimResult<()> {
        self.road.set_lookahead(lookahead)
    }

    pub fn set_truck_cap(&mut self, enabled: bool, max_speed: usize) {
        self.road.set_truck_cap(enabled, max_speed);
        self.clamp_speeds();
    }

    /// Brings every speed back under the vehicle's current effective cap
    fn clamp_speeds(&mut self) {
        for vehicle in &mut self.vehicles {
            vehicle.speed = vehicle.speed.min(vehicle.effective_cap(&self.road));
        }
    }

    pub fn road(&self) -> &RoadModel {
        &self.road
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether any vehicle covers the given cell
    pub fn vehicle_at(&self, position: usize, lane: usize) -> Option<VehicleId> {
        self.vehicles
            .iter()
            .find(|vehicle| {
                vehicle.lane == lane && vehicle.positions(&self.road).any(|p| p == position)
            })
            .map(|vehicle| vehicle.id)
    }

    pub fn snapshot(&self) -> Snapshot {
        let config = self.road.config();
        let vehicles: Vec<VehicleView> = self
            .vehicles
            .iter()
            .map(|vehicle| VehicleView {
                id: vehicle.id,
                position: vehicle.position,
                lane: vehicle.lane,
                speed: vehicle.speed,
                max_speed: vehicle.max_speed,
                length: vehicle.length,
                class: vehicle.class,
                color: vehicle.color.clone(),
            })
            .collect();
        let stats = FlowStats::from_vehicles(&vehicles, config.length * config.lanes);

        Snapshot {
            tick: self.tick,
            length: config.length,
            lanes: config.lanes,
            braking_probability: config.braking_probability,
            lookahead: config.lookahead,
            truck_cap_enabled: config.truck_cap_enabled,
            truck_cap_speed: config.truck_cap_speed,
            limits: self.road.limits().to_vec(),
            obstacles: self
                .obstacles
                .iter()
                .map(|cell: &Cell| ObstacleView {
                    position: cell.position,
                    lane: cell.lane,
                })
                .collect(),
            vehicles,
            stats,
        }
    }
}
