pub mod calibration;
pub mod error;
pub mod neuron;
pub mod params;
pub mod recordables;
pub mod spike_history;
pub mod status;
pub mod types;

mod dynamics;
mod ring_buffer;
mod solver;
mod util;
