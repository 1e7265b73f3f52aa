use glif::{
    neuron::GlifNeuron, params::GlifParams, spike_history::SpikeHistory, types::Step,
};
use rand::{prelude::Distribution, rngs::StdRng, SeedableRng};
use statrs::distribution::Poisson;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let params = scenario_params::get_scenario_params();
    let stimulus = params.stimulus;

    let mut neuron = GlifNeuron::new(GlifParams::default(), params.simulation).unwrap();
    neuron.set_status(&params.neuron).unwrap();

    for channel in 0..neuron.num_channels() {
        neuron.connect_spike_source(channel).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(stimulus.seed);
    let spike_count_dists: Vec<Poisson> = stimulus
        .spike_rates
        .iter()
        .map(|&rate| Poisson::new(rate).unwrap())
        .collect();

    let mut history = SpikeHistory::new();

    while neuron.now() < stimulus.t_stop {
        let now = neuron.now();
        let block_end = (now + stimulus.min_delay).min(stimulus.t_stop);

        for delivery in now + 1..=block_end {
            neuron.handle_current(stimulus.current, delivery).unwrap();

            for (channel, dist) in spike_count_dists.iter().enumerate() {
                let count = dist.sample(&mut rng);
                if count > 0.0 {
                    neuron
                        .handle_spike(channel, count * stimulus.weights[channel], delivery)
                        .unwrap();
                }
            }
        }

        neuron.update(now..=block_end - 1, &mut history).unwrap();
    }

    let spike_steps = history.spike_steps();
    let spike_checksum: Step = spike_steps.iter().sum();

    println!("result:");
    println!("...spike count: {}", spike_steps.len());
    println!("...spike checksum: {}", spike_checksum);
    println!("...V_m: {}", neuron.sample("V_m").unwrap());
    println!("...threshold: {}", neuron.sample("threshold").unwrap());
    println!("...ASCurrents_sum: {}", neuron.sample("ASCurrents_sum").unwrap());
}
