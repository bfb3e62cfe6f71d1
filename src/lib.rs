//! Traffic Junction Simulation Library
//!
//! A discrete-time micro-simulation of a signalised N-arm road junction that
//! reports queueing, waiting and throughput metrics.

pub mod simulation;
