//! Turn clock, AI, and orchestration for the Annals simulation.
//!
//! This crate owns the turn cycle: city yields, nation yields, city growth
//! and production, research and diplomacy, AI decisions, victory, sync, and
//! autosave, in that order.
//!
//! # Modules
//!
//! - [`clock`] -- Turn counter and calendar year.
//! - [`config`] -- Configuration loading from `annals-config.yaml` into
//!   strongly-typed structs.
//! - [`rules`] -- Technology, policy, and production catalogs.
//! - [`ai`] -- [`AiController`] trait and [`BasicAiController`].
//! - [`engine`] -- [`SimulationEngine`] and the turn phases.
//! - [`operator`] -- Pause, resume, speed, and stop controls.
//! - [`runner`] -- The async turn loop.
//!
//! [`AiController`]: ai::AiController
//! [`BasicAiController`]: ai::BasicAiController
//! [`SimulationEngine`]: engine::SimulationEngine

pub mod ai;
pub mod clock;
pub mod config;
pub mod engine;
pub mod operator;
pub mod rules;
pub mod runner;
