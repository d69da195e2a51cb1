//! Request/response layer over a single shared traffic engine
//!
//! The service owns the one live engine behind a reader/writer lock. Every
//! mutating operation holds the write lock for its whole duration, so callers
//! never observe a partially applied change; `state` only takes the read lock
//! and `cancel` takes no lock at all.

mod transport;
mod wire;

pub use transport::{serve_lines, serve_tcp};
pub use wire::{
    AddVehicleRequest, InitRequest, ObstacleRequest, Request, Response, SetLimitsRequest,
    SetLookaheadRequest, SetTruckCapRequest, StepRequest,
};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::simulation::{
    InitConfig, ObstacleRun, SimError, SimResult, Snapshot, SpeedLimitZone, TrafficEngine,
    VehicleSpec,
};

/// Upper bound on ticks a single step request may ask for
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Process-level settings for the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Seed for every engine built by `init`; thread RNG when `None`
    pub seed: Option<u64>,
    pub max_steps: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// The simulation service
#[derive(Default)]
pub struct SimulationService {
    engine: RwLock<Option<TrafficEngine>>,
    settings: ServiceSettings,
    /// Raised to stop an in-flight step between ticks
    cancel: AtomicBool,
}

impl SimulationService {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            engine: RwLock::new(None),
            settings,
            cancel: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<TrafficEngine>> {
        self.engine.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TrafficEngine>> {
        self.engine.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `op` on the engine under the write lock and snapshots the result
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut TrafficEngine) -> SimResult<T>,
    ) -> SimResult<(T, Snapshot)> {
        let mut guard = self.write();
        let engine = guard.as_mut().ok_or(SimError::NotInitialized)?;
        let value = op(engine)?;
        Ok((value, engine.snapshot()))
    }

    /// Replaces the engine with a freshly built one
    ///
    /// The new engine is fully built before the lock is taken, so a failed
    /// init leaves the previous engine in place.
    pub fn init(&self, config: InitConfig) -> SimResult<Snapshot> {
        let rng = self.settings.seed.map(StdRng::seed_from_u64);
        let engine = TrafficEngine::init(config, rng)?;
        let snapshot = engine.snapshot();
        *self.write() = Some(engine);
        info!(
            "Simulation initialized: {} cells x {} lanes, {} vehicles, {} obstacle cells",
            snapshot.length,
            snapshot.lanes,
            snapshot.vehicles.len(),
            snapshot.obstacles.len()
        );
        Ok(snapshot)
    }

    /// Advances the engine by `n` ticks; zero is treated as one
    pub fn step(&self, n: usize) -> SimResult<Snapshot> {
        let n = n.max(1);
        if n > self.settings.max_steps {
            return Err(SimError::invalid(format!(
                "step count {} exceeds the limit of {}",
                n, self.settings.max_steps
            )));
        }
        let (done, snapshot) = self.mutate(|engine| {
            self.cancel.store(false, Ordering::Relaxed);
            Ok(engine.advance_cancellable(n, &self.cancel))
        })?;
        debug!("Stepped {} of {} ticks, now at tick {}", done, n, snapshot.tick);
        Ok(snapshot)
    }

    /// Interrupts an in-flight `step` after its current tick
    ///
    /// Never waits on the engine lock. A step that has not yet started is
    /// unaffected, since every step clears the flag when it begins.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        debug!("Cancellation requested");
    }

    pub fn state(&self) -> SimResult<Snapshot> {
        self.read()
            .as_ref()
            .map(TrafficEngine::snapshot)
            .ok_or(SimError::NotInitialized)
    }

    pub fn set_limits(&self, zones: &[SpeedLimitZone]) -> SimResult<Snapshot> {
        let ((), snapshot) = self.mutate(|engine| engine.set_limits(zones))?;
        debug!("Applied {} speed limit zones", zones.len());
        Ok(snapshot)
    }

    pub fn add_vehicle(&self, spec: VehicleSpec) -> SimResult<Snapshot> {
        let (_, snapshot) = self.mutate(|engine| engine.add_vehicle(spec))?;
        Ok(snapshot)
    }

    pub fn add_obstacle(&self, run: ObstacleRun) -> SimResult<Snapshot> {
        let (added, snapshot) = self.mutate(|engine| engine.add_obstacle(run))?;
        debug!("Added {} obstacle cells", added);
        Ok(snapshot)
    }

    pub fn remove_obstacle(&self, run: ObstacleRun) -> SimResult<Snapshot> {
        let (removed, snapshot) = self.mutate(|engine| engine.remove_obstacle(run))?;
        debug!("Removed {} obstacle cells", removed);
        Ok(snapshot)
    }

    pub fn set_lookahead(&self, lookahead: usize) -> SimResult<Snapshot> {
        let ((), snapshot) = self.mutate(|engine| engine.set_lookahead(lookahead))?;
        Ok(snapshot)
    }

    pub fn set_truck_cap(&self, enabled: bool, max_speed: usize) -> SimResult<Snapshot> {
        let ((), snapshot) = self.mutate(|engine| {
            engine.set_truck_cap(enabled, max_speed);
            Ok(())
        })?;
        Ok(snapshot)
    }

    /// Dispatches a decoded request
    pub fn handle(&self, request: Request) -> Response {
        let result = match request {
            Request::Cancel => {
                self.cancel();
                return Response::acknowledged();
            }
            Request::Init(body) => self.init(body.into()),
            Request::Step(body) => self.step(body.n),
            Request::State => self.state(),
            Request::SetLimits(body) => self.set_limits(&body.zones),
            Request::AddVehicle(body) => self.add_vehicle(body.into()),
            Request::AddObstacle(body) => self.add_obstacle(body.into()),
            Request::RemoveObstacle(body) => self.remove_obstacle(body.into()),
            Request::SetLookahead(body) => self.set_lookahead(body.lookahead),
            Request::SetTruckCap(body) => self.set_truck_cap(body.enabled, body.max_speed),
        };
        if let Err(error) = &result {
            debug!("Request rejected: {}", error);
        }
        result.into()
    }

    /// Decodes and dispatches one JSON request
    ///
    /// Malformed bodies are reported as invalid configuration.
    pub fn handle_json(&self, body: &str) -> Response {
        match serde_json::from_str::<Request>(body) {
            Ok(request) => self.handle(request),
            Err(error) => Response::failure(&SimError::InvalidConfig(format!(
                "malformed request: {}",
                error
            ))),
        }
    }
}
