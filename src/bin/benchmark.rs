use std::time::Instant;

use glif::{neuron::GlifNeuron, params::GlifParams};
use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};
use statrs::distribution::Poisson;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    let params = scenario_params::get_scenario_params();
    let stimulus = params.stimulus;
    let num_neurons = 100;

    let mut neurons: Vec<GlifNeuron> = (0..num_neurons)
        .map(|_| {
            let mut neuron =
                GlifNeuron::new(GlifParams::default(), params.simulation.clone()).unwrap();
            neuron.set_status(&params.neuron).unwrap();
            neuron
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(stimulus.seed);
    let current_jitter_dist = Uniform::new(0.0, 50.0);
    let spike_count_dists: Vec<Poisson> = stimulus
        .spike_rates
        .iter()
        .map(|&rate| Poisson::new(rate).unwrap())
        .collect();

    let mut spike_count = 0;
    let t_stop = stimulus.t_stop / 10;
    let wall_start = Instant::now();

    for neuron in &mut neurons {
        while neuron.now() < t_stop {
            let now = neuron.now();
            let block_end = (now + stimulus.min_delay).min(t_stop);

            for delivery in now + 1..=block_end {
                let current = stimulus.current + current_jitter_dist.sample(&mut rng);
                neuron.handle_current(current, delivery).unwrap();

                for (channel, dist) in spike_count_dists.iter().enumerate() {
                    let count = dist.sample(&mut rng);
                    if count > 0.0 {
                        neuron
                            .handle_spike(channel, count * stimulus.weights[channel], delivery)
                            .unwrap();
                    }
                }
            }

            spike_count += neuron.update(now..=block_end - 1, &mut ()).unwrap().len();
        }
    }

    let wall_time = wall_start.elapsed();
    let step_throughput = (num_neurons as u64 * t_stop) as f64 / wall_time.as_secs_f64();

    eprintln!(
        "Spikes per neuron and second: {}",
        spike_count as f64 / num_neurons as f64
            / (t_stop as f64 * params.simulation.resolution / 1000.0)
    );
    eprintln!(
        "Update throughput: {:.3e} steps/s ({:.3} ns per step)",
        step_throughput,
        1e9 / step_throughput
    );
}
