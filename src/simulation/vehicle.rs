//! Vehicle records and the per-tick speed rule
//!
//! The speed rule is the Nagel–Schreckenberg update: accelerate, respect the
//! gap, then brake at random.

use super::road::RoadModel;
use super::types::{VehicleClass, VehicleId};

/// A vehicle on the road
///
/// `position` is the front cell; the vehicle also covers the `length - 1`
/// cells behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: usize,
    pub lane: usize,
    pub speed: usize,
    /// Intrinsic top speed
    pub max_speed: usize,
    pub length: usize,
    pub class: VehicleClass,
    /// Cosmetic color, passed through untouched
    pub color: String,
}

/// What a caller supplies to place a vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSpec {
    pub position: usize,
    pub lane: usize,
    pub max_speed: usize,
    pub class: VehicleClass,
    /// Cells occupied; the class default when `None`
    pub length: Option<usize>,
    pub color: Option<String>,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        position: usize,
        lane: usize,
        max_speed: usize,
        length: usize,
        class: VehicleClass,
        color: String,
    ) -> Self {
        Self {
            id,
            position,
            lane,
            speed: 0,
            max_speed,
            length,
            class,
            color,
        }
    }

    /// Positions covered by the vehicle, front first
    pub fn positions<'a>(&self, road: &'a RoadModel) -> impl Iterator<Item = usize> + 'a {
        let front = self.position;
        (0..self.length).map(move |i| road.behind(front, i))
    }

    /// Speed cap for the current position: own top speed, zone cap and truck cap
    pub fn effective_cap(&self, road: &RoadModel) -> usize {
        let mut cap = self.max_speed;
        if let Some(zone_cap) = road.zone_cap_at(self.position) {
            cap = cap.min(zone_cap);
        }
        if self.class == VehicleClass::Truck {
            if let Some(truck_cap) = road.truck_cap() {
                cap = cap.min(truck_cap);
            }
        }
        cap
    }

    /// Speed for the next tick given the free `gap` ahead
    ///
    /// `brake` decides whether the random slowdown fires this tick. The result
    /// never exceeds `gap` before braking, so braking can only lower it further.
    pub fn next_speed(&self, gap: usize, cap: usize, brake: bool) -> usize {
        let mut speed = self.speed;
        if gap > speed && speed < cap {
            speed += 1;
        }
        speed = speed.min(cap).min(gap);
        if brake && speed > 0 {
            speed -= 1;
        }
        speed
    }
}
