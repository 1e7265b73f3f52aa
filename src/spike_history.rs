use crate::types::Step;

/// Receives the stamps of emitted spikes, e.g. for spike-timing dependent learning rules.
pub trait SpikeArchive {
    fn record_spike(&mut self, step: Step);
}

#[derive(Debug, Clone, Default)]
pub struct SpikeHistory {
    spike_steps: Vec<Step>,
}

impl SpikeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_last_spike_step(&self) -> Option<Step> {
        self.spike_steps.last().copied()
    }

    pub fn spike_steps(&self) -> &[Step] {
        &self.spike_steps
    }

    pub fn clear(&mut self) {
        self.spike_steps.clear();
    }
}

impl SpikeArchive for SpikeHistory {
    fn record_spike(&mut self, step: Step) {
        debug_assert!(self.get_last_spike_step().map_or(true, |last| last < step));
        self.spike_steps.push(step);
    }
}

impl SpikeArchive for () {
    fn record_spike(&mut self, _step: Step) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut sut = SpikeHistory::new();
        assert_eq!(sut.get_last_spike_step(), None);

        sut.record_spike(3);
        sut.record_spike(42);

        assert_eq!(sut.get_last_spike_step(), Some(42));
        assert_eq!(sut.spike_steps(), &[3, 42]);

        sut.clear();
        assert!(sut.spike_steps().is_empty());
    }
}
