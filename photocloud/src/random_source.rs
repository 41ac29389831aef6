use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;

/// Source of uniform draws in `[0, 1)` used by the point sampler.
///
/// Production code passes a [ThreadRng]; tests pass a seeded [StdRng] or a
/// [SequenceSource] to make sampling reproducible.
pub trait RandomSource {
    fn uniform(&mut self) -> f32;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.uniform() * len as f32) as usize).min(len - 1)
    }
}

impl RandomSource for ThreadRng {
    fn uniform(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

impl RandomSource for StdRng {
    fn uniform(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Replays a fixed list of values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f32>,
    position: usize,
}

impl SequenceSource {
    /// Values are clamped into `[0, 1)`. An empty list always yields 0.
    pub fn new(values: Vec<f32>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f32::EPSILON))
            .collect();
        SequenceSource { values, position: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn uniform(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

/// Draws a bin from non-negative `weights` by inverse cumulative sampling.
///
/// An all-zero (or non-finite) weight vector falls back to a uniform choice.
pub fn weighted_index<R: RandomSource + ?Sized>(weights: &[f32], random: &mut R) -> usize {
    if weights.is_empty() {
        return 0;
    }
    let total: f32 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return random.index(weights.len());
    }

    let target = random.uniform() * total;
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight.max(0.0);
        if target < cumulative {
            return i;
        }
    }
    weights.len() - 1
}
