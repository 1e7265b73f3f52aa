use glif::{params::SimulationParams, status::StatusUpdate};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioParams {
    pub simulation: SimulationParams,
    pub neuron: StatusUpdate,
    pub stimulus: StimulusParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StimulusParams {
    pub current: f64,
    pub t_stop: u64,
    pub min_delay: u64,
    pub seed: u64,
    /// Expected number of input spikes per channel and step.
    pub spike_rates: Vec<f64>,
    pub weights: Vec<f64>,
}

pub fn get_scenario_params() -> ScenarioParams {
    let params_yaml_str = r#"
simulation:
  resolution: 0.1
  max_delay_steps: 20
neuron:
  g: 9.43
  E_L: -78.85
  V_th: -51.68
  C_m: 58.72
  t_ref: 3.75
  V_reset: -78.85
  th_spike_add: 0.37
  th_spike_decay: 0.009
  voltage_reset_fraction: 0.2
  voltage_reset_add: 18.51
  th_voltage_index: 0.005
  th_voltage_decay: 0.09
  asc_init: [0.0, 0.0]
  asc_decay: [0.003, 0.1]
  asc_amps: [-9.18, -198.94]
  asc_r: [1.0, 1.0]
  tau_syn: [0.2, 2.0]
  E_rev: [0.0, -85.0]
  spike_dependent_threshold: true
  after_spike_currents: true
  adapting_threshold: true
stimulus:
  current: 150.0
  t_stop: 100000
  min_delay: 10
  seed: 0
  spike_rates: [0.2, 0.05]
  weights: [8.0, 4.0]
"#;

    serde_yaml::from_str(params_yaml_str).unwrap()
}
