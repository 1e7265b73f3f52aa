use serde::{Deserialize, Serialize};

use crate::{
    error::GlifResult,
    params::{GlifModel, GlifParams},
};

/// Partial configuration write. Potentials are absolute; fields left out keep
/// their committed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusUpdate {
    #[serde(rename = "V_m", skip_serializing_if = "Option::is_none")]
    pub v_m: Option<f64>,
    #[serde(rename = "V_th", skip_serializing_if = "Option::is_none")]
    pub v_th: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g: Option<f64>,
    #[serde(rename = "E_L", skip_serializing_if = "Option::is_none")]
    pub e_l: Option<f64>,
    #[serde(rename = "C_m", skip_serializing_if = "Option::is_none")]
    pub c_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_ref: Option<f64>,
    #[serde(rename = "V_reset", skip_serializing_if = "Option::is_none")]
    pub v_reset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub th_spike_add: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub th_spike_decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_reset_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_reset_add: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub th_voltage_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub th_voltage_decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc_init: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc_decay: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc_amps: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc_r: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tau_syn: Option<Vec<f64>>,
    #[serde(rename = "E_rev", skip_serializing_if = "Option::is_none")]
    pub e_rev: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spike_dependent_threshold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_spike_currents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapting_threshold: Option<bool>,
    #[serde(rename = "ASCurrents", skip_serializing_if = "Option::is_none")]
    pub asc_currents: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_spike: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_voltage: Option<f64>,
}

/// Full configuration and state readout. Potentials are absolute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub model: GlifModel,
    #[serde(rename = "V_m")]
    pub v_m: f64,
    #[serde(rename = "V_th")]
    pub v_th: f64,
    pub g: f64,
    #[serde(rename = "E_L")]
    pub e_l: f64,
    #[serde(rename = "C_m")]
    pub c_m: f64,
    pub t_ref: f64,
    #[serde(rename = "V_reset")]
    pub v_reset: f64,
    pub th_spike_add: f64,
    pub th_spike_decay: f64,
    pub voltage_reset_fraction: f64,
    pub voltage_reset_add: f64,
    pub th_voltage_index: f64,
    pub th_voltage_decay: f64,
    pub asc_init: Vec<f64>,
    pub asc_decay: Vec<f64>,
    pub asc_amps: Vec<f64>,
    pub asc_r: Vec<f64>,
    pub tau_syn: Vec<f64>,
    #[serde(rename = "E_rev")]
    pub e_rev: Vec<f64>,
    pub spike_dependent_threshold: bool,
    pub after_spike_currents: bool,
    pub adapting_threshold: bool,
    #[serde(rename = "ASCurrents")]
    pub asc_currents: Vec<f64>,
    #[serde(rename = "ASCurrents_sum")]
    pub asc_sum: f64,
    pub threshold: f64,
    pub threshold_spike: f64,
    pub threshold_voltage: f64,
    pub refractory_steps: usize,
    pub refractory_counts: usize,
    pub recordables: Vec<String>,
}

impl StatusUpdate {
    pub fn from_json(json: &str) -> GlifResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> GlifResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn changes_num_channels(&self, num_channels: usize) -> bool {
        self.tau_syn
            .as_ref()
            .map_or(false, |tau_syn| tau_syn.len() != num_channels)
    }

    /// Overlays the parameter fields onto `params`. Returns the change of `E_L`;
    /// potentials that are not set explicitly keep their absolute value.
    pub fn apply_to_params(&self, params: &mut GlifParams) -> f64 {
        let e_l_old = params.e_l;
        overlay(&mut params.e_l, self.e_l);
        let delta_e_l = params.e_l - e_l_old;

        params.v_reset = match self.v_reset {
            Some(v_reset) => v_reset - params.e_l,
            None => params.v_reset - delta_e_l,
        };

        params.th_inf = match self.v_th {
            Some(v_th) => v_th - params.e_l,
            None => params.th_inf - delta_e_l,
        };

        overlay(&mut params.g, self.g);
        overlay(&mut params.c_m, self.c_m);
        overlay(&mut params.t_ref, self.t_ref);
        overlay(&mut params.th_spike_add, self.th_spike_add);
        overlay(&mut params.th_spike_decay, self.th_spike_decay);
        overlay(&mut params.voltage_reset_fraction, self.voltage_reset_fraction);
        overlay(&mut params.voltage_reset_add, self.voltage_reset_add);
        overlay(&mut params.th_voltage_index, self.th_voltage_index);
        overlay(&mut params.th_voltage_decay, self.th_voltage_decay);
        overlay_vec(&mut params.asc_init, &self.asc_init);
        overlay_vec(&mut params.asc_decay, &self.asc_decay);
        overlay_vec(&mut params.asc_amps, &self.asc_amps);
        overlay_vec(&mut params.asc_r, &self.asc_r);
        overlay_vec(&mut params.tau_syn, &self.tau_syn);
        overlay_vec(&mut params.e_rev, &self.e_rev);
        overlay(&mut params.has_theta_spike, self.spike_dependent_threshold);
        overlay(&mut params.has_asc, self.after_spike_currents);
        overlay(&mut params.has_theta_voltage, self.adapting_threshold);

        delta_e_l
    }
}

fn overlay<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn overlay_vec(target: &mut Vec<f64>, value: &Option<Vec<f64>>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}
