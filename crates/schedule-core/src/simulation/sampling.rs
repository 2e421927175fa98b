use crate::simulation::distribution::Sampler;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Row-major `iterations × activities` matrix of sampled durations, drawn
/// sequentially from one seeded generator so a seed fully determines a run.
#[derive(Debug, Clone)]
pub(crate) struct SampleMatrix {
    columns: usize,
    values: Vec<f64>,
}

impl SampleMatrix {
    /// Columns without a sampler repeat `base` for that activity.
    pub fn generate(samplers: &[Option<Sampler>], base: &[i64], iterations: usize, seed: u64) -> Self {
        let columns = samplers.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut values = Vec::with_capacity(iterations * columns);
        for _ in 0..iterations {
            for (sampler, &fixed) in samplers.iter().zip(base) {
                values.push(match sampler {
                    Some(sampler) => sampler.sample(&mut rng),
                    None => fixed as f64,
                });
            }
        }
        Self { columns, values }
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.values.len() / self.columns
        }
    }

    pub fn row(&self, iteration: usize) -> &[f64] {
        let start = iteration * self.columns;
        &self.values[start..start + self.columns]
    }

    pub fn column(&self, activity: usize) -> Vec<f64> {
        self.values
            .iter()
            .skip(activity)
            .step_by(self.columns.max(1))
            .copied()
            .collect()
    }
}
