use serde::{Deserialize, Serialize};
use simple_error::SimpleError;

/// Model parameters. Potentials `th_inf` and `v_reset` are stored relative to `e_l`,
/// `e_rev` is absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlifParams {
    pub g: f64,
    pub e_l: f64,
    pub th_inf: f64,
    pub c_m: f64,
    pub t_ref: f64,
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
    pub e_rev: Vec<f64>,
    pub has_theta_spike: bool,
    pub has_asc: bool,
    pub has_theta_voltage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlifModel {
    Lif = 1,
    LifR = 2,
    LifAsc = 3,
    LifRAsc = 4,
    LifRAscA = 5,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub resolution: f64,
    pub max_delay_steps: usize,
}

impl GlifModel {
    pub fn from_flags(
        has_theta_spike: bool,
        has_asc: bool,
        has_theta_voltage: bool,
    ) -> Option<GlifModel> {
        match (has_theta_spike, has_asc, has_theta_voltage) {
            (false, false, false) => Some(GlifModel::Lif),
            (true, false, false) => Some(GlifModel::LifR),
            (false, true, false) => Some(GlifModel::LifAsc),
            (true, true, false) => Some(GlifModel::LifRAsc),
            (true, true, true) => Some(GlifModel::LifRAscA),
            _ => None,
        }
    }

    pub fn flags(self) -> (bool, bool, bool) {
        match self {
            GlifModel::Lif => (false, false, false),
            GlifModel::LifR => (true, false, false),
            GlifModel::LifAsc => (false, true, false),
            GlifModel::LifRAsc => (true, true, false),
            GlifModel::LifRAscA => (true, true, true),
        }
    }
}

impl GlifParams {
    pub fn num_channels(&self) -> usize {
        self.tau_syn.len()
    }

    pub fn model(&self) -> Option<GlifModel> {
        GlifModel::from_flags(self.has_theta_spike, self.has_asc, self.has_theta_voltage)
    }

    pub fn set_model(&mut self, model: GlifModel) {
        (self.has_theta_spike, self.has_asc, self.has_theta_voltage) = model.flags();
    }

    /// Whether a spike reset can leave the membrane at or above the post-reset threshold,
    /// in which case the neuron fires after every refractory period.
    pub fn resets_above_threshold(&self) -> bool {
        self.has_theta_spike
            && self.voltage_reset_fraction * self.th_inf + self.voltage_reset_add
                >= self.th_inf + self.th_spike_add
    }
}

impl Default for GlifParams {
    fn default() -> Self {
        let e_l = -78.85;
        Self {
            g: 9.43,
            e_l,
            th_inf: -51.68 - e_l,
            c_m: 58.72,
            t_ref: 3.75,
            v_reset: 0.0,
            th_spike_add: 0.37,
            th_spike_decay: 0.009,
            voltage_reset_fraction: 0.20,
            voltage_reset_add: 18.51,
            th_voltage_index: 0.005,
            th_voltage_decay: 0.09,
            asc_init: vec![0.0, 0.0],
            asc_decay: vec![0.003, 0.1],
            asc_amps: vec![-9.18, -198.94],
            asc_r: vec![1.0, 1.0],
            tau_syn: vec![0.2],
            e_rev: vec![0.0],
            has_theta_spike: false,
            has_asc: false,
            has_theta_voltage: false,
        }
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            max_delay_steps: 100,
        }
    }
}

pub fn validate_simulation_params(params: &SimulationParams) -> Result<(), SimpleError> {
    if !(params.resolution > 0.0) {
        return Err(SimpleError::new("resolution must be strictly positive"));
    }

    if params.max_delay_steps == 0 {
        return Err(SimpleError::new(
            "max_delay_steps must be strictly positive",
        ));
    }

    Ok(())
}

pub fn validate_glif_params(params: &GlifParams) -> Result<(), SimpleError> {
    if params.model().is_none() {
        return Err(SimpleError::new(format!(
            "unsupported mechanism combination (spike_dependent_threshold: {}, after_spike_currents: {}, adapting_threshold: {})",
            params.has_theta_spike, params.has_asc, params.has_theta_voltage
        )));
    }

    if !(params.v_reset < params.th_inf) {
        return Err(SimpleError::new("V_reset must be less than V_th"));
    }

    if !(params.c_m > 0.0) {
        return Err(SimpleError::new("C_m must be strictly positive"));
    }

    if !(params.g > 0.0) {
        return Err(SimpleError::new("g must be strictly positive"));
    }

    if !(params.t_ref > 0.0) {
        return Err(SimpleError::new("t_ref must be strictly positive"));
    }

    if !(params.th_spike_decay > 0.0) {
        return Err(SimpleError::new("th_spike_decay must be strictly positive"));
    }

    if !(0.0..=1.0).contains(&params.voltage_reset_fraction) {
        return Err(SimpleError::new("voltage_reset_fraction must be in [0, 1]"));
    }

    if !(params.th_voltage_decay > 0.0) {
        return Err(SimpleError::new(
            "th_voltage_decay must be strictly positive",
        ));
    }

    validate_asc_params(params)?;
    validate_synapse_params(params)?;

    if params.has_theta_voltage && params.th_voltage_decay == params.g / params.c_m {
        return Err(SimpleError::new("th_voltage_decay must differ from g / C_m"));
    }

    Ok(())
}

fn validate_asc_params(params: &GlifParams) -> Result<(), SimpleError> {
    let asc_len = params.asc_init.len();

    if params.asc_decay.len() != asc_len
        || params.asc_amps.len() != asc_len
        || params.asc_r.len() != asc_len
    {
        return Err(SimpleError::new(
            "asc_init, asc_decay, asc_amps and asc_r must have the same size",
        ));
    }

    if params.asc_decay.iter().any(|&k| !(k > 0.0)) {
        return Err(SimpleError::new("asc_decay must be strictly positive"));
    }

    if params.asc_r.iter().any(|&r| !(0.0..=1.0).contains(&r)) {
        return Err(SimpleError::new("asc_r must be in [0, 1]"));
    }

    if params.has_asc && asc_len != params.num_channels() {
        return Err(SimpleError::new(format!(
            "after spike current parameters must have one entry per channel ({} != {})",
            asc_len,
            params.num_channels()
        )));
    }

    Ok(())
}

fn validate_synapse_params(params: &GlifParams) -> Result<(), SimpleError> {
    if params.e_rev.len() != params.tau_syn.len() {
        return Err(SimpleError::new("E_rev and tau_syn must have the same size"));
    }

    if params.tau_syn.iter().any(|&tau| !(tau > 0.0)) {
        return Err(SimpleError::new("tau_syn must be strictly positive"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::util::test_util;

    fn assert_invalid(params: &GlifParams, expected_msg: &str) {
        let result = validate_glif_params(params);

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().as_str(), expected_msg);
    }

    #[test]
    fn valid_params() {
        assert!(validate_glif_params(&GlifParams::default()).is_ok());
        assert!(validate_glif_params(&test_util::template_params(GlifModel::LifRAscA)).is_ok());
    }

    #[test]
    fn model_flag_round_trip() {
        for model in [
            GlifModel::Lif,
            GlifModel::LifR,
            GlifModel::LifAsc,
            GlifModel::LifRAsc,
            GlifModel::LifRAscA,
        ] {
            let (s, a, v) = model.flags();
            assert_eq!(GlifModel::from_flags(s, a, v), Some(model));
        }
    }

    #[test]
    fn unsupported_flag_combinations() {
        for (s, a, v) in [
            (false, false, true),
            (true, false, true),
            (false, true, true),
        ] {
            let mut params = GlifParams::default();
            params.has_theta_spike = s;
            params.has_asc = a;
            params.has_theta_voltage = v;
            assert!(params.model().is_none());
            assert!(validate_glif_params(&params).is_err());
        }
    }

    #[test]
    fn reset_not_below_threshold() {
        let mut params = GlifParams::default();
        params.v_reset = params.th_inf;
        assert_invalid(&params, "V_reset must be less than V_th");
    }

    #[test]
    fn zero_capacitance() {
        let mut params = GlifParams::default();
        params.c_m = 0.0;
        assert_invalid(&params, "C_m must be strictly positive");
    }

    #[test]
    fn negative_conductance() {
        let mut params = GlifParams::default();
        params.g = -1.0;
        assert_invalid(&params, "g must be strictly positive");
    }

    #[test]
    fn zero_refractory_time() {
        let mut params = GlifParams::default();
        params.t_ref = 0.0;
        assert_invalid(&params, "t_ref must be strictly positive");
    }

    #[test]
    fn zero_th_spike_decay() {
        let mut params = GlifParams::default();
        params.th_spike_decay = 0.0;
        assert_invalid(&params, "th_spike_decay must be strictly positive");
    }

    #[test]
    fn voltage_reset_fraction_out_of_range() {
        let mut params = GlifParams::default();
        params.voltage_reset_fraction = 1.1;
        assert_invalid(&params, "voltage_reset_fraction must be in [0, 1]");
    }

    #[test]
    fn asc_size_mismatch() {
        let mut params = GlifParams::default();
        params.asc_amps.push(1.0);
        assert_invalid(
            &params,
            "asc_init, asc_decay, asc_amps and asc_r must have the same size",
        );
    }

    #[test]
    fn zero_asc_decay() {
        let mut params = GlifParams::default();
        params.asc_decay[1] = 0.0;
        assert_invalid(&params, "asc_decay must be strictly positive");
    }

    #[test]
    fn asc_r_out_of_range() {
        let mut params = GlifParams::default();
        params.asc_r[0] = -0.5;
        assert_invalid(&params, "asc_r must be in [0, 1]");
    }

    #[test]
    fn asc_per_channel_when_enabled() {
        let mut params = GlifParams::default();
        params.set_model(GlifModel::LifAsc);
        assert_invalid(
            &params,
            "after spike current parameters must have one entry per channel (2 != 1)",
        );

        params.tau_syn = vec![0.2, 2.0];
        params.e_rev = vec![0.0, -85.0];
        assert!(validate_glif_params(&params).is_ok());
    }

    #[test]
    fn reversal_potential_size_mismatch() {
        let mut params = GlifParams::default();
        params.e_rev = vec![0.0, -85.0];
        assert_invalid(&params, "E_rev and tau_syn must have the same size");
    }

    #[test]
    fn zero_tau_syn() {
        let mut params = GlifParams::default();
        params.tau_syn = vec![0.0];
        assert_invalid(&params, "tau_syn must be strictly positive");
    }

    #[test]
    fn voltage_threshold_pole() {
        let mut params = test_util::template_params(GlifModel::LifRAscA);
        params.th_voltage_decay = params.g / params.c_m;
        assert_invalid(&params, "th_voltage_decay must differ from g / C_m");
    }

    #[test]
    fn nan_is_rejected() {
        let cases: [(fn(&mut GlifParams), &str); 9] = [
            (|p| p.c_m = f64::NAN, "C_m must be strictly positive"),
            (|p| p.g = f64::NAN, "g must be strictly positive"),
            (|p| p.t_ref = f64::NAN, "t_ref must be strictly positive"),
            (|p| p.th_spike_decay = f64::NAN, "th_spike_decay must be strictly positive"),
            (|p| p.th_voltage_decay = f64::NAN, "th_voltage_decay must be strictly positive"),
            (|p| p.voltage_reset_fraction = f64::NAN, "voltage_reset_fraction must be in [0, 1]"),
            (|p| p.asc_decay[0] = f64::NAN, "asc_decay must be strictly positive"),
            (|p| p.asc_r[1] = f64::NAN, "asc_r must be in [0, 1]"),
            (|p| p.tau_syn[0] = f64::NAN, "tau_syn must be strictly positive"),
        ];

        for (corrupt, expected_msg) in cases {
            let mut params = GlifParams::default();
            corrupt(&mut params);
            assert_invalid(&params, expected_msg);
        }

        let mut params = GlifParams::default();
        params.th_inf = f64::NAN;
        assert_invalid(&params, "V_reset must be less than V_th");
    }

    #[test]
    fn simulation_params() {
        assert!(validate_simulation_params(&SimulationParams::default()).is_ok());

        let mut params = SimulationParams::default();
        params.resolution = 0.0;
        assert_eq!(
            validate_simulation_params(&params).unwrap_err().as_str(),
            "resolution must be strictly positive"
        );

        params.resolution = f64::NAN;
        assert_eq!(
            validate_simulation_params(&params).unwrap_err().as_str(),
            "resolution must be strictly positive"
        );

        let mut params = SimulationParams::default();
        params.max_delay_steps = 0;
        assert_eq!(
            validate_simulation_params(&params).unwrap_err().as_str(),
            "max_delay_steps must be strictly positive"
        );
    }

    #[test]
    fn reset_above_threshold_detection() {
        let mut params = GlifParams::default();
        params.set_model(GlifModel::LifR);
        assert!(!params.resets_above_threshold());

        params.voltage_reset_fraction = 1.0;
        params.voltage_reset_add = 5.0;
        params.th_spike_add = 0.0;
        assert!(params.resets_above_threshold());

        params.set_model(GlifModel::Lif);
        assert!(!params.resets_above_threshold());
    }
}
