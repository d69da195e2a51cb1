//! Cellular Traffic Library
//!
//! A discrete-time cellular-automaton traffic simulator on a circular road,
//! with a request/response service layer that exposes one shared engine.

pub mod service;
pub mod simulation;
