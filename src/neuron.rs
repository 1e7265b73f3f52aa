use std::ops::RangeInclusive;

use log::{debug, trace, warn};
use simple_error::{try_with, SimpleError};

use crate::{
    calibration::Variables,
    dynamics::{self, DynamicsContext, V_M},
    error::{GlifError, GlifResult},
    params::{self, GlifModel, GlifParams, SimulationParams},
    recordables::{DataLogger, LoggedRow, Recordable, RecordableSource, RecordablesMap},
    ring_buffer::RingBuffer,
    solver::{ErrorControl, OdeWorkspace},
    spike_history::SpikeArchive,
    status::{Status, StatusUpdate},
    types::Step,
};

const MAX_SUBSTEPS_PER_STEP: usize = 100_000;

#[derive(Debug, Clone)]
struct State {
    /// `[V_m, dg_0, g_0, dg_1, g_1, ...]`, `V_m` relative to `E_L`.
    y: Vec<f64>,
    threshold: f64,
    threshold_spike: f64,
    threshold_voltage: f64,
    asc: Vec<f64>,
    asc_sum: f64,
    refractory_steps: usize,
}

impl State {
    fn new(params: &GlifParams) -> Self {
        let asc = params.asc_init.clone();
        let asc_sum = if params.has_asc {
            asc.iter().sum()
        } else {
            0.0
        };

        Self {
            y: vec![0.0; dynamics::state_dimension(params.num_channels())],
            threshold: params.th_inf,
            threshold_spike: 0.0,
            threshold_voltage: 0.0,
            asc,
            asc_sum,
            refractory_steps: 0,
        }
    }

    fn apply_update(&mut self, update: &StatusUpdate, params: &GlifParams, delta_e_l: f64) {
        self.y[V_M] = match update.v_m {
            Some(v_m) => v_m - params.e_l,
            None => self.y[V_M] - delta_e_l,
        };

        if let Some(asc) = &update.asc_currents {
            self.asc.clone_from(asc);
        }

        if let Some(threshold_spike) = update.threshold_spike {
            self.threshold_spike = threshold_spike;
        }

        if let Some(threshold_voltage) = update.threshold_voltage {
            self.threshold_voltage = threshold_voltage;
        }

        self.threshold = self.threshold_spike + self.threshold_voltage + params.th_inf;
    }
}

fn validate_state_update(update: &StatusUpdate, params: &GlifParams) -> Result<(), SimpleError> {
    if let Some(asc) = &update.asc_currents {
        if asc.len() != params.asc_init.len() {
            return Err(SimpleError::new(
                "ASCurrents must have the same size as asc_init",
            ));
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
struct Buffers {
    spikes: Vec<RingBuffer>,
    currents: RingBuffer,
    logger: DataLogger,
    workspace: OdeWorkspace,
    /// Injected current driving the step currently being integrated.
    i_ext: f64,
}

impl Buffers {
    fn new(num_channels: usize, simulation: &SimulationParams) -> Self {
        Self {
            spikes: vec![RingBuffer::new(simulation.max_delay_steps); num_channels],
            currents: RingBuffer::new(simulation.max_delay_steps),
            logger: DataLogger::default(),
            workspace: OdeWorkspace::new(
                dynamics::state_dimension(num_channels),
                simulation.resolution,
                ErrorControl::default(),
            ),
            i_ext: 0.0,
        }
    }
}

/// Conductance-based generalized leaky integrate-and-fire neuron.
#[derive(Debug, Clone)]
pub struct GlifNeuron {
    params: GlifParams,
    simulation: SimulationParams,
    state: State,
    vars: Variables,
    buffers: Buffers,
    recordables: RecordablesMap,
    has_connections: bool,
    now: Step,
}

impl GlifNeuron {
    pub fn new(params: GlifParams, simulation: SimulationParams) -> GlifResult<Self> {
        try_with!(
            params::validate_glif_params(&params),
            "invalid neuron parameters"
        );
        try_with!(
            params::validate_simulation_params(&simulation),
            "invalid simulation parameters"
        );
        warn_if_resets_above_threshold(&params);

        let num_channels = params.num_channels();

        let mut neuron = Self {
            state: State::new(&params),
            vars: Variables::calibrate(&params, simulation.resolution),
            buffers: Buffers::new(num_channels, &simulation),
            recordables: RecordablesMap::new(num_channels),
            params,
            simulation,
            has_connections: false,
            now: 0,
        };

        neuron.calibrate();
        Ok(neuron)
    }

    pub fn params(&self) -> &GlifParams {
        &self.params
    }

    pub fn variables(&self) -> &Variables {
        &self.vars
    }

    pub fn model(&self) -> GlifModel {
        // validated on every write
        self.params.model().unwrap_or(GlifModel::Lif)
    }

    pub fn num_channels(&self) -> usize {
        self.params.num_channels()
    }

    pub fn resolution(&self) -> f64 {
        self.simulation.resolution
    }

    /// The present grid point; the next update block must start here.
    pub fn now(&self) -> Step {
        self.now
    }

    pub fn refractory_steps(&self) -> usize {
        self.state.refractory_steps
    }

    pub fn integration_step(&self) -> f64 {
        self.buffers.workspace.integration_step()
    }

    /// Resets the dynamic state to the values implied by the parameters.
    pub fn init_state(&mut self) {
        self.state = State::new(&self.params);
    }

    /// Clears all pending input and recorded data and resets the solver workspace.
    pub fn init_buffers(&mut self) {
        for spikes in &mut self.buffers.spikes {
            spikes.clear();
        }
        self.buffers.currents.clear();
        self.buffers.logger.init();
        self.buffers.workspace.reset(self.simulation.resolution);
        self.buffers.i_ext = 0.0;
    }

    /// Changes the step size. Pending input and the solver's step size are kept.
    pub fn set_resolution(&mut self, resolution: f64) -> GlifResult<()> {
        let simulation = SimulationParams {
            resolution,
            ..self.simulation.clone()
        };
        try_with!(
            params::validate_simulation_params(&simulation),
            "invalid simulation parameters"
        );
        self.simulation = simulation;
        self.calibrate();
        Ok(())
    }

    fn calibrate(&mut self) {
        let num_channels = self.num_channels();
        let horizon = self.simulation.max_delay_steps;

        self.vars = Variables::calibrate(&self.params, self.simulation.resolution);

        self.state
            .y
            .resize(dynamics::state_dimension(num_channels), 0.0);
        self.buffers
            .spikes
            .resize_with(num_channels, || RingBuffer::new(horizon));
        self.buffers
            .workspace
            .resize(dynamics::state_dimension(num_channels));

        debug!(
            "calibrated {:?} neuron: {} channels, resolution {} ms, {} refractory steps",
            self.model(),
            num_channels,
            self.simulation.resolution,
            self.vars.refractory_counts
        );
    }

    pub fn get_status(&self) -> Status {
        let p = &self.params;

        Status {
            model: self.model(),
            v_m: self.state.y[V_M] + p.e_l,
            v_th: p.th_inf + p.e_l,
            g: p.g,
            e_l: p.e_l,
            c_m: p.c_m,
            t_ref: p.t_ref,
            v_reset: p.v_reset + p.e_l,
            th_spike_add: p.th_spike_add,
            th_spike_decay: p.th_spike_decay,
            voltage_reset_fraction: p.voltage_reset_fraction,
            voltage_reset_add: p.voltage_reset_add,
            th_voltage_index: p.th_voltage_index,
            th_voltage_decay: p.th_voltage_decay,
            asc_init: p.asc_init.clone(),
            asc_decay: p.asc_decay.clone(),
            asc_amps: p.asc_amps.clone(),
            asc_r: p.asc_r.clone(),
            tau_syn: p.tau_syn.clone(),
            e_rev: p.e_rev.clone(),
            spike_dependent_threshold: p.has_theta_spike,
            after_spike_currents: p.has_asc,
            adapting_threshold: p.has_theta_voltage,
            asc_currents: self.state.asc.clone(),
            asc_sum: self.state.asc_sum,
            threshold: self.state.threshold + p.e_l,
            threshold_spike: self.state.threshold_spike,
            threshold_voltage: self.state.threshold_voltage,
            refractory_steps: self.state.refractory_steps,
            refractory_counts: self.vars.refractory_counts,
            recordables: self.recordables.get_list(),
        }
    }

    /// Applies a configuration write atomically: on error nothing is changed.
    pub fn set_status(&mut self, update: &StatusUpdate) -> GlifResult<()> {
        let old_num_channels = self.num_channels();

        if self.has_connections && update.changes_num_channels(old_num_channels) {
            return Err(GlifError::InvalidParams(SimpleError::new(
                "the number of channels cannot be changed once the neuron has connections",
            )));
        }

        let mut params = self.params.clone();
        let delta_e_l = update.apply_to_params(&mut params);
        try_with!(
            params::validate_glif_params(&params),
            "invalid neuron parameters"
        );
        try_with!(
            validate_state_update(update, &params),
            "invalid neuron state"
        );

        let mut state = self.state.clone();
        if params.asc_init.len() != state.asc.len() {
            state.asc = params.asc_init.clone();
        }
        state.apply_update(update, &params, delta_e_l);

        warn_if_resets_above_threshold(&params);

        let new_num_channels = params.num_channels();
        self.recordables
            .update_num_channels(old_num_channels, new_num_channels);
        self.buffers.logger.retain_channels(new_num_channels);

        self.params = params;
        self.state = state;
        self.calibrate();
        Ok(())
    }

    /// Accepts a connection from a spike source on `channel`. From then on the
    /// number of channels is fixed.
    pub fn connect_spike_source(&mut self, channel: usize) -> GlifResult<usize> {
        self.validate_channel(channel)?;
        self.has_connections = true;
        Ok(channel)
    }

    pub fn has_connections(&self) -> bool {
        self.has_connections
    }

    fn validate_channel(&self, channel: usize) -> GlifResult<()> {
        if channel >= self.num_channels() {
            return Err(GlifError::UnknownChannel {
                channel,
                num_channels: self.num_channels(),
            });
        }
        Ok(())
    }

    /// Ring offset of the update step at whose end input with stamp `delivery` takes effect.
    fn delivery_offset(&self, delivery: Step) -> GlifResult<usize> {
        let horizon = self.simulation.max_delay_steps;
        let invalid = GlifError::InvalidDelivery {
            delivery,
            now: self.now,
            horizon,
        };

        if delivery <= self.now {
            return Err(invalid);
        }

        let offset = (delivery - self.now - 1) as usize;
        if offset >= horizon {
            return Err(invalid);
        }

        Ok(offset)
    }

    /// Buffers a spike of `weight` on `channel`, taking effect at grid point `delivery`.
    pub fn handle_spike(&mut self, channel: usize, weight: f64, delivery: Step) -> GlifResult<()> {
        self.validate_channel(channel)?;
        let offset = self.delivery_offset(delivery)?;
        self.buffers.spikes[channel].add_value(offset, weight);
        Ok(())
    }

    /// Buffers an injected current that drives the step starting at grid point `delivery`.
    pub fn handle_current(&mut self, amplitude: f64, delivery: Step) -> GlifResult<()> {
        let offset = self.delivery_offset(delivery)?;
        self.buffers.currents.add_value(offset, amplitude);
        Ok(())
    }

    pub fn sample(&self, name: &str) -> GlifResult<f64> {
        let recordable = self
            .recordables
            .get(name)
            .ok_or_else(|| GlifError::UnknownRecordable(name.to_string()))?;
        Ok(self.get_state_element(recordable))
    }

    pub fn recordable_names(&self) -> Vec<String> {
        self.recordables.get_list()
    }

    /// Starts recording the named quantities every `interval` steps.
    pub fn connect_data_logger(&mut self, names: &[&str], interval: Step) -> GlifResult<()> {
        if interval == 0 {
            return Err(GlifError::InvalidParams(SimpleError::new(
                "recording interval must be strictly positive",
            )));
        }

        let recordables = names
            .iter()
            .map(|&name| {
                self.recordables
                    .get(name)
                    .ok_or_else(|| GlifError::UnknownRecordable(name.to_string()))
            })
            .collect::<GlifResult<Vec<_>>>()?;

        self.buffers.logger.connect(recordables, interval);
        Ok(())
    }

    pub fn take_logged(&mut self) -> Vec<LoggedRow> {
        self.buffers.logger.take_rows()
    }

    /// Advances the neuron through `steps`, each taking it from grid point `s` to `s + 1`.
    /// Returns the grid points at which spikes were emitted, in increasing order.
    pub fn update<A: SpikeArchive>(
        &mut self,
        steps: RangeInclusive<Step>,
        archive: &mut A,
    ) -> GlifResult<Vec<Step>> {
        if *steps.start() != self.now {
            return Err(GlifError::StepOutOfSync {
                expected: self.now,
                got: *steps.start(),
            });
        }

        let mut spike_steps = Vec::new();
        let mut v_old = self.state.y[V_M];

        for step in steps {
            self.integrate(step)?;

            let stamp = step + 1;

            if self.state.refractory_steps == 0 {
                self.update_threshold_and_asc(v_old);

                if self.state.y[V_M] >= self.state.threshold {
                    self.emit_spike(v_old);
                    trace!("spike at step {}", stamp);
                    archive.record_spike(stamp);
                    spike_steps.push(stamp);
                }
            } else {
                self.state.refractory_steps -= 1;
                self.state.y[V_M] = v_old;
            }

            self.deliver_input();
            self.now = stamp;

            if self.buffers.logger.is_due(stamp) {
                let mut logger = std::mem::take(&mut self.buffers.logger);
                logger.record(stamp, &*self);
                self.buffers.logger = logger;
            }

            v_old = self.state.y[V_M];
        }

        Ok(spike_steps)
    }

    fn integrate(&mut self, step: Step) -> GlifResult<()> {
        let ctx = DynamicsContext {
            params: &self.params,
            i_ext: self.buffers.i_ext,
            asc_sum: self.state.asc_sum,
            refractory: self.state.refractory_steps > 0,
        };

        self.buffers
            .workspace
            .integrate(
                |t, y, dydt| dynamics::glif_dynamics(t, y, dydt, &ctx),
                self.simulation.resolution,
                &mut self.state.y,
                MAX_SUBSTEPS_PER_STEP,
            )
            .map_err(|failure| GlifError::SolverFailure {
                step,
                reason: failure.to_string(),
            })
    }

    fn update_threshold_and_asc(&mut self, v_old: f64) {
        let p = &self.params;
        let vars = &self.vars;
        let s = &mut self.state;

        if p.has_theta_spike {
            s.threshold_spike *= vars.theta_spike_decay_rate;
        }

        // mean current over the step, then decay to the end of the step
        s.asc_sum = 0.0;
        if p.has_asc {
            for (a, asc) in s.asc.iter_mut().enumerate() {
                s.asc_sum += vars.asc_stable_coeff[a] * *asc;
                *asc *= vars.asc_decay_rates[a];
            }
        }

        if p.has_theta_voltage {
            let beta = (self.buffers.i_ext + s.asc_sum) / p.g;
            let phi_v = vars.phi * (v_old - beta);
            s.threshold_voltage = phi_v * vars.potential_decay_rate
                + vars.theta_voltage_decay_rate_inverse
                    * (s.threshold_voltage - phi_v - vars.abpara_ratio_voltage * beta)
                + vars.abpara_ratio_voltage * beta;
        }

        s.threshold = s.threshold_spike + s.threshold_voltage + p.th_inf;
    }

    fn emit_spike(&mut self, v_old: f64) {
        let p = &self.params;
        let vars = &self.vars;
        let s = &mut self.state;

        s.refractory_steps = vars.refractory_counts;

        if p.has_asc {
            for (a, asc) in s.asc.iter_mut().enumerate() {
                *asc = p.asc_amps[a] + *asc * vars.asc_refractory_decay_rates[a];
            }
        }

        if p.has_theta_spike {
            s.y[V_M] = p.voltage_reset_fraction * v_old + p.voltage_reset_add;

            // decay over the refractory period, then add the spike increment
            s.threshold_spike =
                s.threshold_spike * vars.theta_spike_refractory_decay_rate + p.th_spike_add;
            s.threshold = s.threshold_spike + s.threshold_voltage + p.th_inf;
        } else {
            s.y[V_M] = p.v_reset;
        }
    }

    fn deliver_input(&mut self) {
        for (channel, spikes) in self.buffers.spikes.iter_mut().enumerate() {
            let weight = spikes.take_and_advance();
            if weight != 0.0 {
                self.state.y[dynamics::dg_index(channel)] +=
                    weight * self.vars.cond_initial_values[channel];
            }
        }

        self.buffers.i_ext = self.buffers.currents.take_and_advance();
    }
}

impl RecordableSource for GlifNeuron {
    fn get_state_element(&self, recordable: Recordable) -> f64 {
        match recordable {
            Recordable::MembranePotential => self.state.y[V_M] + self.params.e_l,
            Recordable::InjectedCurrent => self.buffers.i_ext,
            Recordable::AscSum => self.state.asc_sum,
            Recordable::Threshold => self.state.threshold + self.params.e_l,
            Recordable::ThresholdSpike => self.state.threshold_spike,
            Recordable::ThresholdVoltage => self.state.threshold_voltage,
            Recordable::Conductance(channel) => self.state.y[dynamics::g_index(channel)],
        }
    }
}

fn warn_if_resets_above_threshold(params: &GlifParams) {
    if params.resets_above_threshold() {
        warn!(
            "voltage after reset ({} mV) is not below the threshold after reset ({} mV); \
             the neuron will spike after every refractory period",
            params.e_l + params.voltage_reset_fraction * params.th_inf + params.voltage_reset_add,
            params.e_l + params.th_inf + params.th_spike_add
        );
    }
}
