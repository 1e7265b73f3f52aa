/// Delay line summing the input due at each of the next `len` steps.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    slots: Vec<f64>,
    current_pos: usize,
}

impl RingBuffer {
    pub fn new(buffer_size: usize) -> RingBuffer {
        RingBuffer {
            slots: vec![0.0; buffer_size],
            current_pos: 0,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_within_horizon(&self, offset: usize) -> bool {
        offset < self.slots.len()
    }

    pub fn add_value(&mut self, offset: usize, value: f64) {
        debug_assert!(self.is_within_horizon(offset));

        let target_pos = self.get_target_pos(offset);
        self.slots[target_pos] += value;
    }

    fn get_target_pos(&self, offset: usize) -> usize {
        let mut target_pos = self.current_pos + offset;

        if target_pos >= self.slots.len() {
            target_pos -= self.slots.len();
        }

        target_pos
    }

    #[cfg(test)]
    pub fn peek(&self, offset: usize) -> f64 {
        self.slots[self.get_target_pos(offset)]
    }

    pub fn take_and_advance(&mut self) -> f64 {
        let value = std::mem::take(&mut self.slots[self.current_pos]);
        self.current_pos += 1;
        if self.current_pos == self.slots.len() {
            self.current_pos = 0;
        }
        value
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = 0.0);
        self.current_pos = 0;
    }
}

#[cfg(test)]
mod tests {

    use super::RingBuffer;
    use float_cmp::assert_approx_eq;
    use rand::{distributions::Uniform, prelude::Distribution, rngs::StdRng, SeedableRng};

    #[test]
    fn empty() {
        let mut sut = RingBuffer::new(8);
        assert_eq!(sut.take_and_advance(), 0.0);
    }

    #[test]
    fn coinciding_values_are_summed() {
        let mut sut = RingBuffer::new(8);
        sut.add_value(1, 0.5);
        sut.add_value(1, -0.2);
        sut.add_value(1, 1.0);
        assert_eq!(sut.take_and_advance(), 0.0);
        assert_approx_eq!(f64, sut.peek(0), 1.3);
        assert_approx_eq!(f64, sut.take_and_advance(), 1.3);
        assert_eq!(sut.take_and_advance(), 0.0);
    }

    #[test]
    fn slot_is_cleared_on_read() {
        let mut sut = RingBuffer::new(2);
        sut.add_value(0, 3.0);
        assert_eq!(sut.take_and_advance(), 3.0);
        assert_eq!(sut.take_and_advance(), 0.0);
        assert_eq!(sut.take_and_advance(), 0.0);
    }

    #[test]
    fn round_trip() {
        let mut sut = RingBuffer::new(10);
        sut.add_value(1, 2.0);

        for _ in 0..2 {
            sut.take_and_advance();
        }

        sut.add_value(9, 3.0);
        for _ in 0..9 {
            assert_eq!(sut.take_and_advance(), 0.0);
        }
        assert_eq!(sut.take_and_advance(), 3.0);
    }

    #[test]
    fn clear() {
        let mut sut = RingBuffer::new(4);
        sut.take_and_advance();
        sut.add_value(2, 1.0);
        sut.clear();
        for _ in 0..4 {
            assert_eq!(sut.take_and_advance(), 0.0);
        }
    }

    #[test]
    fn horizon() {
        let sut = RingBuffer::new(4);
        assert_eq!(sut.len(), 4);
        assert!(sut.is_within_horizon(3));
        assert!(!sut.is_within_horizon(4));
    }

    #[test]
    fn randomized_input() {
        let mut sut = RingBuffer::new(10);
        const NUM_TIME_SLOTS: usize = 101;
        let mut flat_expected_data = vec![0.0; NUM_TIME_SLOTS];
        let mut rng = StdRng::seed_from_u64(0);
        let amount_dist = Uniform::from(0..10);
        let offset_dist = Uniform::from(0..10);
        let value_dist = Uniform::from(-1000..1000);

        for flat_loc in 0..NUM_TIME_SLOTS {
            let amount = amount_dist.sample(&mut rng);

            for _ in 0..amount {
                let offset = offset_dist.sample(&mut rng);
                let value = value_dist.sample(&mut rng) as f64;
                sut.add_value(offset, value);
                let target_loc_flat_data = flat_loc + offset;
                if target_loc_flat_data < NUM_TIME_SLOTS {
                    flat_expected_data[target_loc_flat_data] += value;
                }
            }

            assert_eq!(sut.take_and_advance(), flat_expected_data[flat_loc]);
        }
    }
}
