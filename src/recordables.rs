use itertools::Itertools;

use crate::types::{HashMap, Step};

/// Quantities that can be sampled at grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recordable {
    MembranePotential,
    InjectedCurrent,
    AscSum,
    Threshold,
    ThresholdSpike,
    ThresholdVoltage,
    /// Conductance of the given zero-based channel.
    Conductance(usize),
}

const FIXED_RECORDABLES: [Recordable; 6] = [
    Recordable::MembranePotential,
    Recordable::InjectedCurrent,
    Recordable::AscSum,
    Recordable::Threshold,
    Recordable::ThresholdSpike,
    Recordable::ThresholdVoltage,
];

impl Recordable {
    pub fn name(&self) -> String {
        match self {
            Recordable::MembranePotential => "V_m".to_string(),
            Recordable::InjectedCurrent => "I".to_string(),
            Recordable::AscSum => "ASCurrents_sum".to_string(),
            Recordable::Threshold => "threshold".to_string(),
            Recordable::ThresholdSpike => "threshold_spike".to_string(),
            Recordable::ThresholdVoltage => "threshold_voltage".to_string(),
            Recordable::Conductance(channel) => format!("g_{}", channel + 1),
        }
    }
}

/// Read access to the recordable quantities of a neuron.
pub trait RecordableSource {
    fn get_state_element(&self, recordable: Recordable) -> f64;
}

#[derive(Debug, Clone)]
pub struct RecordablesMap {
    map: HashMap<String, Recordable>,
}

impl RecordablesMap {
    pub fn new(num_channels: usize) -> Self {
        let mut result = Self {
            map: HashMap::default(),
        };

        for recordable in FIXED_RECORDABLES {
            result.insert(recordable);
        }

        result.insert_conductances(0..num_channels);
        result
    }

    fn insert(&mut self, recordable: Recordable) {
        self.map.insert(recordable.name(), recordable);
    }

    fn insert_conductances(&mut self, channels: std::ops::Range<usize>) {
        for channel in channels {
            self.insert(Recordable::Conductance(channel));
        }
    }

    /// Adds or removes per-channel conductance entries.
    pub fn update_num_channels(&mut self, old_num_channels: usize, new_num_channels: usize) {
        if new_num_channels > old_num_channels {
            self.insert_conductances(old_num_channels..new_num_channels);
        } else {
            for channel in new_num_channels..old_num_channels {
                self.map.remove(&Recordable::Conductance(channel).name());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Recordable> {
        self.map.get(name).copied()
    }

    pub fn get_list(&self) -> Vec<String> {
        self.map.keys().cloned().sorted().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedRow {
    pub step: Step,
    pub values: Vec<f64>,
}

/// Records a fixed selection of recordables every `interval` steps.
#[derive(Debug, Clone, Default)]
pub struct DataLogger {
    recordables: Vec<Recordable>,
    interval: Step,
    rows: Vec<LoggedRow>,
}

impl DataLogger {
    pub fn connect(&mut self, recordables: Vec<Recordable>, interval: Step) {
        debug_assert!(interval > 0);
        self.recordables = recordables;
        self.interval = interval;
        self.rows.clear();
    }

    pub fn is_connected(&self) -> bool {
        !self.recordables.is_empty()
    }

    pub fn recordables(&self) -> &[Recordable] {
        &self.recordables
    }

    pub fn is_due(&self, step: Step) -> bool {
        self.is_connected() && step % self.interval == 0
    }

    pub fn record<S: RecordableSource>(&mut self, step: Step, source: &S) {
        if self.is_due(step) {
            let values = self
                .recordables
                .iter()
                .map(|&recordable| source.get_state_element(recordable))
                .collect();
            self.rows.push(LoggedRow { step, values });
        }
    }

    /// Drops recordables of channels that no longer exist.
    pub fn retain_channels(&mut self, num_channels: usize) {
        self.recordables.retain(|recordable| match recordable {
            Recordable::Conductance(channel) => *channel < num_channels,
            _ => true,
        });
    }

    pub fn take_rows(&mut self) -> Vec<LoggedRow> {
        std::mem::take(&mut self.rows)
    }

    pub fn init(&mut self) {
        self.rows.clear();
    }
}
