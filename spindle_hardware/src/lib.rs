//! Hardware bindings for the centrifuge controller.
//!
//! The default build ships only the simulation (`sim` module), which is what
//! the CLI and the test suite run against. The `hardware` feature adds the
//! rppal-backed Raspberry Pi driver for the real PWM/GPIO wiring.

pub mod error;
pub mod sim;

pub use sim::{
    ConsoleBuzzer, ConsolePanel, EdgeLine, RotorSim, RotorSimCfg, SharedLevel, SimLed,
    SimulatedEsc,
};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod pi;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use pi::{PiEdge, PiEsc, PiLed, PiLevel};
