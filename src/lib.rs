//! Solar window controller: per-window solar gain and shading decisions from
//! layered global/group/window configuration and live sensor readings.

pub mod api;
pub mod calculator;
pub mod config;
pub mod controller;
pub mod domain;
pub mod resolver;
pub mod shading;
pub mod solar;
pub mod state;
pub mod telemetry;

pub use calculator::WindowCalculator;
pub use resolver::{ConfigResolver, ConfigSource, SystemConfig};
pub use state::{InMemoryStateReader, StateReader};
