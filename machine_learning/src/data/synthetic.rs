//! Synthetic two dimensional datasets.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use super::{Dataset, Splits};
use crate::{MlErr, Result};

/// Isotropic gaussian clusters, one per class, with their centers evenly spaced on a circle.
///
/// Samples are emitted round-robin over the classes, so any prefix of the dataset is balanced.
#[derive(Debug, Clone, Copy)]
pub struct Blobs {
    pub n_per_class: usize,
    pub n_classes: usize,
    pub radius: f32,
    pub std_dev: f32,
}

impl Blobs {
    /// Creates a new `Blobs` generator.
    ///
    /// # Arguments
    /// * `n_per_class` - The amount of samples drawn around each center.
    /// * `n_classes` - The amount of clusters.
    /// * `radius` - The distance from the origin to every center.
    /// * `std_dev` - The spread of each cluster.
    pub fn new(n_per_class: usize, n_classes: usize, radius: f32, std_dev: f32) -> Self {
        Self {
            n_per_class,
            n_classes,
            radius,
            std_dev,
        }
    }

    /// Returns the center of the cluster of class `c`.
    pub fn center(&self, c: usize) -> (f32, f32) {
        let angle = TAU * c as f32 / self.n_classes as f32;
        (self.radius * angle.cos(), self.radius * angle.sin())
    }

    /// Draws a dataset using `rng`.
    ///
    /// # Errors
    /// If there are no classes or the spread is negative or not finite.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Dataset> {
        if self.n_classes == 0 {
            return Err(MlErr::InvalidConfig("blobs need at least one class".into()));
        }

        if !(self.std_dev >= 0.0 && self.std_dev.is_finite()) {
            return Err(MlErr::InvalidConfig(format!(
                "blob spread must be finite and non negative, got {}",
                self.std_dev
            )));
        }

        let noise =
            Normal::new(0.0, self.std_dev).map_err(|e| MlErr::InvalidConfig(e.to_string()))?;

        let n = self.n_per_class * self.n_classes;
        let mut xs = Vec::with_capacity(2 * n);
        let mut ys = Vec::with_capacity(n);

        for _ in 0..self.n_per_class {
            for c in 0..self.n_classes {
                let (cx, cy) = self.center(c);
                xs.push(cx + noise.sample(rng));
                xs.push(cy + noise.sample(rng));
                ys.push(c);
            }
        }

        Dataset::from_vecs(xs, 2, ys, self.n_classes)
    }

    /// Draws a dataset from a seeded generator.
    pub fn generate(&self, seed: u64) -> Result<Dataset> {
        self.sample(&mut StdRng::seed_from_u64(seed))
    }

    /// Draws independent train, validation and test datasets from consecutive seeds.
    pub fn splits(&self, seed: u64) -> Result<Splits> {
        Splits::new(
            self.generate(seed)?,
            self.generate(seed.wrapping_add(1))?,
            self.generate(seed.wrapping_add(2))?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_round_robin_and_balanced() {
        let ds = Blobs::new(4, 3, 5.0, 0.1).generate(1).unwrap();

        assert_eq!(ds.len(), 12);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.n_classes(), 3);
        for (i, &label) in ds.y().iter().enumerate() {
            assert_eq!(label, i % 3);
        }
    }

    #[test]
    fn samples_stay_near_their_center() {
        let blobs = Blobs::new(50, 2, 4.0, 0.1);
        let ds = blobs.generate(3).unwrap();

        for (row, &label) in ds.x().rows().into_iter().zip(ds.y()) {
            let (cx, cy) = blobs.center(label);
            let dist = ((row[0] - cx).powi(2) + (row[1] - cy).powi(2)).sqrt();
            assert!(dist < 1.0, "sample {row} is {dist} away from its center");
        }
    }

    #[test]
    fn same_seed_same_data() {
        let blobs = Blobs::new(10, 2, 1.0, 1.0);
        assert_eq!(blobs.generate(42).unwrap(), blobs.generate(42).unwrap());
        assert_ne!(blobs.generate(42).unwrap(), blobs.generate(43).unwrap());
    }

    #[test]
    fn invalid_spread_is_rejected() {
        for blobs in [
            Blobs::new(1, 2, 1.0, -1.0),
            Blobs::new(1, 2, 1.0, f32::NAN),
            Blobs::new(1, 2, 1.0, f32::INFINITY),
            Blobs::new(1, 0, 1.0, 1.0),
        ] {
            assert!(
                matches!(blobs.generate(0), Err(MlErr::InvalidConfig(_))),
                "{blobs:?} was accepted"
            );
        }
    }
}
