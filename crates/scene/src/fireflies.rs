use rand::Rng;

pub const FIREFLIES_COUNT: usize = 30;

/// Horizontal half-extent of the spawn volume (x and z).
const HALF_EXTENT: f32 = 2.0;
const MAX_HEIGHT: f32 = 1.5;

/// Fixed particle buffers: one position and one scale per firefly.
#[derive(Debug, Clone, PartialEq)]
pub struct Fireflies {
    pub positions: Vec<[f32; 3]>,
    pub scales: Vec<f32>,
}

impl Fireflies {
    /// Draw `FIREFLIES_COUNT` particles: x, z in [-2, 2], y in [0, 1.5],
    /// scale in [0, 1).
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(FIREFLIES_COUNT);
        let mut scales = Vec::with_capacity(FIREFLIES_COUNT);

        for _ in 0..FIREFLIES_COUNT {
            positions.push([
                (rng.gen_range(0.0..1.0_f32) - 0.5) * HALF_EXTENT * 2.0,
                rng.gen_range(0.0..1.0_f32) * MAX_HEIGHT,
                (rng.gen_range(0.0..1.0_f32) - 0.5) * HALF_EXTENT * 2.0,
            ]);
            scales.push(rng.gen_range(0.0..1.0_f32));
        }

        Self { positions, scales }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generates_thirty_particles_within_bounds() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let fireflies = Fireflies::generate(&mut rng);
            assert_eq!(fireflies.len(), FIREFLIES_COUNT);
            assert_eq!(fireflies.scales.len(), FIREFLIES_COUNT);

            for [x, y, z] in &fireflies.positions {
                assert!((-2.0..=2.0).contains(x), "x out of range: {x}");
                assert!((0.0..=1.5).contains(y), "y out of range: {y}");
                assert!((-2.0..=2.0).contains(z), "z out of range: {z}");
            }
            for s in &fireflies.scales {
                assert!((0.0..1.0).contains(s), "scale out of range: {s}");
            }
        }
    }

    #[test]
    fn unseeded_runs_differ() {
        let a = Fireflies::generate(&mut rand::thread_rng());
        let b = Fireflies::generate(&mut rand::thread_rng());
        assert_ne!(a, b);
    }
}
