pub fn get_decay_factor(rate: f64, dt: f64) -> f64 {
    (-rate * dt).exp()
}

/// Mean of `exp(-rate * t)` over `t` in `[0, dt]`.
pub fn get_step_mean_factor(rate: f64, dt: f64) -> f64 {
    (1.0 / rate) / dt * (1.0 - get_decay_factor(rate, dt))
}

pub fn steps_for_duration(duration: f64, resolution: f64) -> usize {
    (duration / resolution).round() as usize
}

#[cfg(test)]
pub mod test_util {
    use float_cmp::{assert_approx_eq, ApproxEq};
    use std::fmt::Debug;

    use crate::params::{GlifModel, GlifParams};

    pub fn assert_approx_eq_slice<T>(left: &[T], right: &[T])
    where
        T: ApproxEq + Debug + Copy,
    {
        assert_eq!(left.len(), right.len());

        for item in left.iter().zip(right) {
            assert_approx_eq!(T, *item.0, *item.1);
        }
    }

    /// Default parameters with two channels, valid for every model variant.
    pub fn template_params(model: GlifModel) -> GlifParams {
        let mut params = GlifParams::default();
        params.tau_syn = vec![0.2, 2.0];
        params.e_rev = vec![0.0, -85.0];
        params.set_model(model);
        params
    }
}
