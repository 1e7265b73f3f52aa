use std::f64::consts::E;

use crate::{
    params::GlifParams,
    util::{get_decay_factor, get_step_mean_factor, steps_for_duration},
};

/// Coefficients derived from the parameters and the resolution, consumed by
/// every update step.
#[derive(Debug, Clone, PartialEq)]
pub struct Variables {
    pub refractory_counts: usize,
    pub theta_spike_decay_rate: f64,
    pub theta_spike_refractory_decay_rate: f64,
    pub theta_voltage_decay_rate_inverse: f64,
    pub potential_decay_rate: f64,
    pub abpara_ratio_voltage: f64,
    pub phi: f64,
    pub asc_decay_rates: Vec<f64>,
    pub asc_stable_coeff: Vec<f64>,
    pub asc_refractory_decay_rates: Vec<f64>,
    /// Scales a unit weight so that the alpha conductance peaks at 1 nS at `t = tau_syn`.
    pub cond_initial_values: Vec<f64>,
}

impl Variables {
    pub fn calibrate(params: &GlifParams, h: f64) -> Self {
        Self {
            refractory_counts: steps_for_duration(params.t_ref, h),
            theta_spike_decay_rate: get_decay_factor(params.th_spike_decay, h),
            theta_spike_refractory_decay_rate: get_decay_factor(
                params.th_spike_decay,
                params.t_ref,
            ),
            theta_voltage_decay_rate_inverse: 1.0 / (params.th_voltage_decay * h).exp(),
            potential_decay_rate: get_decay_factor(params.g / params.c_m, h),
            abpara_ratio_voltage: params.th_voltage_index / params.th_voltage_decay,
            phi: params.th_voltage_index / (params.th_voltage_decay - params.g / params.c_m),
            asc_decay_rates: params
                .asc_decay
                .iter()
                .map(|&k| get_decay_factor(k, h))
                .collect(),
            asc_stable_coeff: params
                .asc_decay
                .iter()
                .map(|&k| get_step_mean_factor(k, h))
                .collect(),
            asc_refractory_decay_rates: params
                .asc_decay
                .iter()
                .zip(&params.asc_r)
                .map(|(&k, &r)| r * get_decay_factor(k, params.t_ref))
                .collect(),
            cond_initial_values: params.tau_syn.iter().map(|&tau| E / tau).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{params::GlifModel, util::test_util};
    use float_cmp::assert_approx_eq;

    #[test]
    fn default_params() {
        let params = GlifParams::default();
        let sut = Variables::calibrate(&params, 0.1);

        assert_eq!(sut.refractory_counts, steps_for_duration(3.75, 0.1));
        assert_approx_eq!(f64, sut.theta_spike_decay_rate, (-0.0009f64).exp());
        assert_approx_eq!(
            f64,
            sut.theta_spike_refractory_decay_rate,
            (-0.009f64 * 3.75).exp()
        );
        assert_approx_eq!(f64, sut.theta_voltage_decay_rate_inverse, (-0.009f64).exp());
        assert_approx_eq!(
            f64,
            sut.potential_decay_rate,
            (-9.43f64 * 0.1 / 58.72).exp()
        );
        assert_approx_eq!(f64, sut.abpara_ratio_voltage, 0.005 / 0.09);
        assert_approx_eq!(f64, sut.phi, 0.005 / (0.09 - 9.43 / 58.72));
        assert_approx_eq!(f64, sut.cond_initial_values[0], E / 0.2);
    }

    #[test]
    fn after_spike_current_coefficients() {
        let params = test_util::template_params(GlifModel::LifAsc);
        let sut = Variables::calibrate(&params, 0.1);

        test_util::assert_approx_eq_slice(
            &sut.asc_decay_rates,
            &[(-0.0003f64).exp(), (-0.01f64).exp()],
        );
        test_util::assert_approx_eq_slice(
            &sut.asc_refractory_decay_rates,
            &[(-0.003f64 * 3.75).exp(), (-0.1f64 * 3.75).exp()],
        );

        for (coeff, rate) in sut.asc_stable_coeff.iter().zip(&sut.asc_decay_rates) {
            // step mean lies between the start and end values
            assert!(*coeff < 1.0 && *coeff > *rate);
        }
    }

    #[test]
    fn resolution_dependence() {
        let params = GlifParams::default();
        let coarse = Variables::calibrate(&params, 0.1);
        let fine = Variables::calibrate(&params, 0.05);

        assert_approx_eq!(
            f64,
            fine.potential_decay_rate * fine.potential_decay_rate,
            coarse.potential_decay_rate,
            epsilon = 1e-12
        );
        assert!(fine.refractory_counts > coarse.refractory_counts);
        assert_eq!(fine.cond_initial_values, coarse.cond_initial_values);
    }
}
