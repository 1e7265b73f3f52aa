use crate::params::GlifParams;

/// Membrane potential, relative to `E_L`.
pub const V_M: usize = 0;
pub const NUM_FIXED_STATE_ELEMENTS: usize = 1;
pub const NUM_STATE_ELEMENTS_PER_CHANNEL: usize = 2;

pub fn state_dimension(num_channels: usize) -> usize {
    NUM_FIXED_STATE_ELEMENTS + NUM_STATE_ELEMENTS_PER_CHANNEL * num_channels
}

/// Index of the conductance rate of change of `channel`.
pub fn dg_index(channel: usize) -> usize {
    NUM_FIXED_STATE_ELEMENTS + NUM_STATE_ELEMENTS_PER_CHANNEL * channel
}

/// Index of the conductance of `channel`.
pub fn g_index(channel: usize) -> usize {
    dg_index(channel) + 1
}

/// Everything the right-hand side needs besides the state vector itself.
pub struct DynamicsContext<'a> {
    pub params: &'a GlifParams,
    pub i_ext: f64,
    pub asc_sum: f64,
    pub refractory: bool,
}

pub fn glif_dynamics(_t: f64, y: &[f64], dydt: &mut [f64], ctx: &DynamicsContext) {
    let params = ctx.params;
    let v = y[V_M];

    let mut i_syn = 0.0;

    for (channel, (&tau, &e_rev)) in params.tau_syn.iter().zip(&params.e_rev).enumerate() {
        let dg = y[dg_index(channel)];
        let g = y[g_index(channel)];

        i_syn += g * (v + params.e_l - e_rev);

        dydt[dg_index(channel)] = -dg / tau;
        dydt[g_index(channel)] = dg - g / tau;
    }

    dydt[V_M] = if ctx.refractory {
        0.0
    } else {
        let i_leak = params.g * v;
        (-i_leak - i_syn + ctx.i_ext + ctx.asc_sum) / params.c_m
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn context(params: &GlifParams) -> DynamicsContext {
        DynamicsContext {
            params,
            i_ext: 0.0,
            asc_sum: 0.0,
            refractory: false,
        }
    }

    #[test]
    fn layout() {
        assert_eq!(state_dimension(0), 1);
        assert_eq!(state_dimension(3), 7);
        assert_eq!(dg_index(0), 1);
        assert_eq!(g_index(0), 2);
        assert_eq!(dg_index(2), 5);
        assert_eq!(g_index(2), 6);
    }

    #[test]
    fn resting_state_is_fixed_point() {
        let params = GlifParams::default();
        let y = vec![0.0; state_dimension(1)];
        let mut dydt = vec![1.0; state_dimension(1)];

        glif_dynamics(0.0, &y, &mut dydt, &context(&params));

        assert!(dydt.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn leak_and_input_currents() {
        let params = GlifParams::default();
        let mut ctx = context(&params);
        ctx.i_ext = 100.0;
        ctx.asc_sum = -20.0;
        let y = vec![10.0, 0.0, 0.0];
        let mut dydt = vec![0.0; 3];

        glif_dynamics(0.0, &y, &mut dydt, &ctx);

        assert_approx_eq!(f64, dydt[V_M], (-params.g * 10.0 + 80.0) / params.c_m);
    }

    #[test]
    fn synaptic_conductance_drives_towards_reversal() {
        let mut params = GlifParams::default();
        params.tau_syn = vec![2.0];
        params.e_rev = vec![0.0];
        let y = vec![0.0, 0.5, 3.0];
        let mut dydt = vec![0.0; 3];

        glif_dynamics(0.0, &y, &mut dydt, &context(&params));

        // V + E_L = E_L < E_rev, so the synaptic current depolarizes
        assert_approx_eq!(f64, dydt[V_M], -3.0 * params.e_l / params.c_m);
        assert_approx_eq!(f64, dydt[dg_index(0)], -0.25);
        assert_approx_eq!(f64, dydt[g_index(0)], 0.5 - 1.5);
    }

    #[test]
    fn voltage_frozen_while_refractory() {
        let params = GlifParams::default();
        let mut ctx = context(&params);
        ctx.refractory = true;
        ctx.i_ext = 1000.0;
        let y = vec![5.0, 1.0, 1.0];
        let mut dydt = vec![1.0; 3];

        glif_dynamics(0.0, &y, &mut dydt, &ctx);

        assert_eq!(dydt[V_M], 0.0);
        assert!(dydt[g_index(0)] != 0.0);
    }
}
