//! Particle (weighted Dirac mixture) representation of a distribution.
//!
//! A distribution is held as at most `K` weighted atoms plus the exact
//! interval containing its mass. Affine maps act on every atom and are
//! exact. Independent sums convolve the two atom sets (`K * K` atoms) and
//! compress the sorted result back to `K` bins, each replaced by its
//! weighted mean, so total mass and the mean survive every operation.
//!
//! Bins follow the grid of [`bin_masses`]: equal mass in the body, and
//! geometrically shrinking mass towards both ends. Heavy right tails are
//! built from rare large outcomes; with equal-mass bins those are averaged
//! into the top bin at every sum and the upper quantiles of the aggregate
//! collapse.

use super::{BoundedPareto, DistributionProvider, DistributionalQuery, UncertainValue};
use crate::config::{DEFAULT_REPRESENTATION_SIZE, MAX_REPRESENTATION_SIZE};
use crate::error::{ConfigError, ProviderError};

/// Smallest representation size that gets refined tails.
const TAIL_REFINEMENT_MIN_SIZE: usize = 16;

/// Each tail gets `K / TAIL_SHARE` bins.
const TAIL_SHARE: usize = 8;

/// Mass of each tail region, in units of one body bin.
const TAIL_REGION_BINS: f64 = 2.0;

/// Probability held by the outermost bin on each side.
const TAIL_FLOOR: f64 = 1e-9;

/// Probability masses of the `size` bins a distribution is cut into, from
/// the lower end up.
///
/// Below [`TAIL_REFINEMENT_MIN_SIZE`] all bins are equal. Otherwise the
/// outer `TAIL_REGION_BINS` body bins' worth of mass on each side is split
/// into `size / TAIL_SHARE` bins whose masses fall geometrically down to
/// [`TAIL_FLOOR`]. The grid is symmetric and sums to 1.
///
/// # Examples
///
/// ```rust
/// use forecast_core::distribution::bin_masses;
///
/// assert_eq!(bin_masses(4), vec![0.25; 4]);
///
/// let masses = bin_masses(256);
/// assert_eq!(masses.len(), 256);
/// assert!(masses[255] < 1e-8);
/// assert!((masses.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
pub fn bin_masses(size: usize) -> Vec<f64> {
    let size = size.max(1);
    if size < TAIL_REFINEMENT_MIN_SIZE {
        return vec![1.0 / size as f64; size];
    }

    let tail_bins = size / TAIL_SHARE;
    let body_bins = size - 2 * tail_bins;
    let region = TAIL_REGION_BINS / body_bins as f64;
    let ratio = (TAIL_FLOOR / region).powf(1.0 / (tail_bins - 1) as f64);

    // survival probabilities at the inner edge of each upper tail bin
    let edges: Vec<f64> = (0..tail_bins)
        .map(|j| region * ratio.powi(j as i32))
        .collect();
    let upper_tail: Vec<f64> = edges
        .iter()
        .zip(edges.iter().skip(1).chain(std::iter::once(&0.0)))
        .map(|(inner, outer)| inner - outer)
        .collect();

    let mut masses = Vec::with_capacity(size);
    masses.extend(upper_tail.iter().rev());
    masses.extend(std::iter::repeat((1.0 - 2.0 * region) / body_bins as f64).take(body_bins));
    masses.extend(upper_tail.iter());
    masses
}

/// A single weighted atom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Location of the atom.
    pub value: f64,
    /// Probability mass carried by the atom.
    pub weight: f64,
}

/// Distribution represented by weighted atoms sorted by value.
///
/// # Examples
///
/// ```rust
/// use forecast_core::distribution::{
///     DistributionalQuery, ParticleDistribution, UncertainValue,
/// };
///
/// let fixed = ParticleDistribution::point(2.0, 64);
/// let moved = fixed.shift(1.0).scale(0.5);
/// assert_eq!(moved.mean(), 1.5);
/// assert_eq!(moved.support(), (1.5, 1.5));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleDistribution {
    particles: Vec<Particle>,
    lower: f64,
    upper: f64,
    representation_size: usize,
}

impl ParticleDistribution {
    /// Point mass at `value`.
    pub fn point(value: f64, representation_size: usize) -> Self {
        Self {
            particles: vec![Particle { value, weight: 1.0 }],
            lower: value,
            upper: value,
            representation_size: representation_size.max(1),
        }
    }

    /// Discretises a bounded Pareto distribution into atoms at the
    /// conditional means of the [`bin_masses`] slices.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::NonFinite` if a bin mean overflows.
    pub fn from_bounded_pareto(
        pareto: &BoundedPareto,
        representation_size: usize,
    ) -> Result<Self, ProviderError> {
        let representation_size = representation_size.max(1);
        if let Some(point) = pareto.point_mass() {
            return Ok(Self::point(point, representation_size));
        }

        let masses = bin_masses(representation_size);
        let means = pareto.bin_means(&masses)?;
        let particles = means
            .into_iter()
            .zip(masses)
            .map(|(value, weight)| Particle { value, weight })
            .collect();

        Ok(Self {
            particles,
            lower: pareto.lower(),
            upper: pareto.upper(),
            representation_size,
        })
    }

    /// Returns the atoms, sorted by value.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of atoms currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Returns `true` if the distribution holds no atoms.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Upper limit on the number of atoms kept after a sum.
    #[inline]
    pub fn representation_size(&self) -> usize {
        self.representation_size
    }

    /// Total probability mass (1 up to rounding).
    pub fn total_weight(&self) -> f64 {
        self.particles.iter().map(|p| p.weight).sum()
    }

    fn is_point(&self) -> bool {
        self.lower == self.upper
    }
}

impl UncertainValue for ParticleDistribution {
    fn shift(mut self, offset: f64) -> Self {
        for particle in &mut self.particles {
            particle.value += offset;
        }
        self.lower += offset;
        self.upper += offset;
        self
    }

    fn scale(mut self, factor: f64) -> Self {
        for particle in &mut self.particles {
            particle.value *= factor;
        }
        let (a, b) = (self.lower * factor, self.upper * factor);
        self.lower = a.min(b);
        self.upper = a.max(b);
        if factor < 0.0 {
            self.particles.reverse();
        }
        self
    }

    fn sum_with(&self, other: &Self) -> Result<Self, ProviderError> {
        let representation_size = self.representation_size.max(other.representation_size);

        let sum = if self.is_point() {
            let mut sum = other.clone().shift(self.lower);
            sum.representation_size = representation_size;
            sum
        } else if other.is_point() {
            let mut sum = self.clone().shift(other.lower);
            sum.representation_size = representation_size;
            sum
        } else {
            let mut atoms = Vec::with_capacity(self.len() * other.len());
            for a in &self.particles {
                for b in &other.particles {
                    atoms.push(Particle {
                        value: a.value + b.value,
                        weight: a.weight * b.weight,
                    });
                }
            }
            atoms.sort_unstable_by(|x, y| x.value.total_cmp(&y.value));

            let lower = self.lower + other.lower;
            let upper = self.upper + other.upper;
            Self {
                particles: compress(atoms, &bin_masses(representation_size), lower, upper),
                lower,
                upper,
                representation_size,
            }
        };

        if !(sum.lower.is_finite() && sum.upper.is_finite()) {
            return Err(ProviderError::NonFinite("particle sum"));
        }
        Ok(sum)
    }

    fn mean(&self) -> f64 {
        let (moment, mass) = self
            .particles
            .iter()
            .fold((0.0, 0.0), |(m, w), p| (m + p.value * p.weight, w + p.weight));
        if mass > 0.0 {
            moment / mass
        } else {
            0.0
        }
    }
}

impl DistributionalQuery for ParticleDistribution {
    fn probability_greater_than(&self, threshold: f64) -> f64 {
        let total = self.total_weight();
        if total <= 0.0 {
            return 0.0;
        }
        let above: f64 = self
            .particles
            .iter()
            .filter(|p| p.value > threshold)
            .map(|p| p.weight)
            .sum();
        (above / total).clamp(0.0, 1.0)
    }

    /// Each atom stands at the centre of the cumulative mass it carries;
    /// between centres the quantile is interpolated linearly, and beyond the
    /// outer centres it is the outer atom.
    fn quantile(&self, p: f64) -> Result<f64, ProviderError> {
        if !(p > 0.0 && p < 1.0) {
            return Err(ProviderError::InvalidProbability(p));
        }

        let target = p * self.total_weight();
        let mut cumulative = 0.0;
        let mut previous: Option<(f64, f64)> = None;
        for particle in &self.particles {
            let centre = cumulative + 0.5 * particle.weight;
            if centre >= target {
                return Ok(match previous {
                    Some((previous_centre, previous_value)) if centre > previous_centre => {
                        let t = (target - previous_centre) / (centre - previous_centre);
                        previous_value + t * (particle.value - previous_value)
                    }
                    _ => particle.value,
                });
            }
            previous = Some((centre, particle.value));
            cumulative += particle.weight;
        }
        Ok(self.particles.last().map_or(self.upper, |p| p.value))
    }

    fn support(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

/// Fills bins of prescribed mass from a stream of atoms.
struct BinFill<'a> {
    targets: std::slice::Iter<'a, f64>,
    target: Option<f64>,
    scale: f64,
    mass: f64,
    moment: f64,
    bins: Vec<Particle>,
}

impl<'a> BinFill<'a> {
    fn new(targets: &'a [f64], scale: f64) -> Self {
        let mut targets = targets.iter();
        let target = targets.next().map(|t| t * scale);
        Self {
            targets,
            target,
            scale,
            mass: 0.0,
            moment: 0.0,
            bins: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.target.is_none()
    }

    /// Pours `weight` at `value` into the open bins and returns what did
    /// not fit.
    fn pour(&mut self, value: f64, mut weight: f64) -> f64 {
        while let Some(target) = self.target {
            let space = target - self.mass;
            if weight < space {
                self.mass += weight;
                self.moment += weight * value;
                return 0.0;
            }
            self.mass += space;
            self.moment += space * value;
            weight -= space;
            self.close();
            self.target = self.targets.next().map(|t| t * self.scale);
        }
        weight
    }

    fn close(&mut self) {
        if self.mass > 0.0 {
            self.bins.push(Particle {
                value: self.moment / self.mass,
                weight: self.mass,
            });
        }
        self.mass = 0.0;
        self.moment = 0.0;
    }

    fn finish(mut self) -> Vec<Particle> {
        self.close();
        self.bins
    }
}

/// Merges value-sorted atoms into bins with the relative masses `grid`.
///
/// Each output atom sits at the weighted mean of the mass it absorbed, which
/// keeps the overall mean. An atom straddling a bin boundary is split. Bins
/// below the middle one are filled from the bottom and bins above it from
/// the top, so the tiny tail bins are measured from their own end and the
/// middle bin absorbs the rounding.
fn compress(atoms: Vec<Particle>, grid: &[f64], lower: f64, upper: f64) -> Vec<Particle> {
    if atoms.len() <= grid.len() || grid.is_empty() {
        return atoms;
    }

    let total: f64 = atoms.iter().map(|p| p.weight).sum();
    let middle = grid.len() / 2;
    let upper_grid: Vec<f64> = grid[middle + 1..].iter().rev().copied().collect();

    let mut low = BinFill::new(&grid[..middle], total);
    let mut start = atoms.len();
    let mut carry = 0.0;
    for (index, atom) in atoms.iter().enumerate() {
        let left = low.pour(atom.value, atom.weight);
        if low.is_full() {
            start = index;
            carry = left;
            break;
        }
    }
    let mut out = low.finish();

    if start < atoms.len() {
        let mut high = BinFill::new(&upper_grid, total);
        let (mut mass, mut moment) = (0.0, 0.0);
        for (index, atom) in atoms.iter().enumerate().skip(start).rev() {
            let mut weight = if index == start { carry } else { atom.weight };
            if !high.is_full() {
                weight = high.pour(atom.value, weight);
            }
            mass += weight;
            moment += weight * atom.value;
        }
        if mass > 0.0 {
            out.push(Particle {
                value: moment / mass,
                weight: mass,
            });
        }
        out.extend(high.finish().into_iter().rev());
    }

    for particle in &mut out {
        particle.value = particle.value.clamp(lower, upper);
    }
    out
}

/// Provider producing [`ParticleDistribution`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticleProvider {
    representation_size: usize,
}

impl ParticleProvider {
    /// Creates a provider keeping `representation_size` atoms per value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRepresentationSize` unless the size is
    /// between 1 and `MAX_REPRESENTATION_SIZE`.
    pub fn new(representation_size: usize) -> Result<Self, ConfigError> {
        if representation_size == 0 || representation_size > MAX_REPRESENTATION_SIZE {
            return Err(ConfigError::InvalidRepresentationSize(representation_size));
        }
        Ok(Self {
            representation_size,
        })
    }

    /// Returns the number of atoms kept per value.
    #[inline]
    pub fn representation_size(&self) -> usize {
        self.representation_size
    }
}

impl Default for ParticleProvider {
    fn default() -> Self {
        Self {
            representation_size: DEFAULT_REPRESENTATION_SIZE,
        }
    }
}

impl DistributionProvider for ParticleProvider {
    type Value = ParticleDistribution;

    fn sample_bounded_pareto(
        &mut self,
        alpha: f64,
        lower: f64,
        upper: f64,
    ) -> Result<Self::Value, ProviderError> {
        let pareto = BoundedPareto::new(alpha, lower, upper)?;
        ParticleDistribution::from_bounded_pareto(&pareto, self.representation_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn uniform_atoms(values: &[f64], size: usize) -> ParticleDistribution {
        let weight = 1.0 / values.len() as f64;
        ParticleDistribution {
            particles: values.iter().map(|&value| Particle { value, weight }).collect(),
            lower: values[0],
            upper: values[values.len() - 1],
            representation_size: size,
        }
    }

    #[test]
    fn test_provider_rejects_bad_size() {
        assert!(ParticleProvider::new(0).is_err());
        assert!(ParticleProvider::new(MAX_REPRESENTATION_SIZE + 1).is_err());
        assert_eq!(ParticleProvider::new(8).unwrap().representation_size(), 8);
        assert_eq!(
            ParticleProvider::default().representation_size(),
            DEFAULT_REPRESENTATION_SIZE
        );
    }

    #[test]
    fn test_provider_builds_exact_support_and_mean() {
        let mut provider = ParticleProvider::new(128).unwrap();
        let dist = provider.sample_bounded_pareto(1.05, 0.35, 1000.35).unwrap();
        let pareto = BoundedPareto::new(1.05, 0.35, 1000.35).unwrap();

        assert_eq!(dist.len(), 128);
        assert_eq!(dist.support(), (0.35, 1000.35));
        assert_relative_eq!(dist.mean(), pareto.mean(), max_relative = 1e-9);
        assert_relative_eq!(dist.total_weight(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_provider_rejects_invalid_parameters() {
        let mut provider = ParticleProvider::default();
        assert!(provider.sample_bounded_pareto(-1.0, 1.0, 2.0).is_err());
        assert!(provider.sample_bounded_pareto(1.0, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_point_mass_queries() {
        let dist = ParticleDistribution::point(3.0, 16);
        assert_eq!(dist.probability_greater_than(2.999), 1.0);
        assert_eq!(dist.probability_greater_than(3.0), 0.0);
        assert_eq!(dist.quantile(0.01).unwrap(), 3.0);
        assert_eq!(dist.quantile(0.99).unwrap(), 3.0);
    }

    #[test]
    fn test_quantile_rejects_out_of_range() {
        let dist = ParticleDistribution::point(1.0, 4);
        for &p in &[0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                dist.quantile(p),
                Err(ProviderError::InvalidProbability(_))
            ));
        }
    }

    #[test]
    fn test_shift_and_scale_are_exact() {
        let dist = uniform_atoms(&[1.0, 2.0, 3.0, 4.0], 4);
        let moved = dist.shift(-1.0).scale(2.0);

        let values: Vec<f64> = moved.particles().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(moved.support(), (0.0, 6.0));
        assert_eq!(moved.mean(), 3.0);
    }

    #[test]
    fn test_negative_scale_keeps_order() {
        let dist = uniform_atoms(&[1.0, 2.0, 5.0], 3).scale(-1.0);
        assert_eq!(dist.support(), (-5.0, -1.0));
        assert!(dist.particles().windows(2).all(|w| w[0].value <= w[1].value));
        // centres sit at cumulative 1/6 and 1/2
        assert_relative_eq!(dist.quantile(0.1).unwrap(), -5.0);
        assert_relative_eq!(dist.quantile(0.2).unwrap(), -4.7, epsilon = 1e-12);
    }

    #[test]
    fn test_sum_with_point_is_shift() {
        let dist = uniform_atoms(&[0.0, 1.0], 2);
        let sum = dist.sum_with(&ParticleDistribution::point(10.0, 2)).unwrap();
        assert_eq!(sum.support(), (10.0, 11.0));
        assert_eq!(sum.mean(), 10.5);
        assert_eq!(sum.len(), 2);
    }

    #[test]
    fn test_sum_small_is_exact_convolution() {
        // two fair coins on {0, 1}: sum is {0, 1, 1, 2}, no compression at size 4
        let coin = uniform_atoms(&[0.0, 1.0], 4);
        let sum = coin.sum_with(&coin).unwrap();

        assert_eq!(sum.len(), 4);
        assert_eq!(sum.support(), (0.0, 2.0));
        assert_relative_eq!(sum.probability_greater_than(0.5), 0.75, epsilon = 1e-12);
        assert_relative_eq!(sum.probability_greater_than(1.5), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_sum_compresses_and_preserves_mean() {
        let a = uniform_atoms(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 8);
        let b = uniform_atoms(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0], 8);
        let sum = a.sum_with(&b).unwrap();

        assert_eq!(sum.len(), 8);
        assert_eq!(sum.support(), (10.0, 87.0));
        assert_relative_eq!(sum.mean(), a.mean() + b.mean(), epsilon = 1e-12);
        assert_relative_eq!(sum.total_weight(), 1.0, epsilon = 1e-12);
        for particle in sum.particles() {
            assert_relative_eq!(particle.weight, 0.125, epsilon = 1e-12);
            assert!(particle.value >= 10.0 && particle.value <= 87.0);
        }
    }

    #[test]
    fn test_quantile_interpolates_between_centres() {
        // centres at cumulative 0.125, 0.375, 0.625, 0.875
        let dist = uniform_atoms(&[1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(dist.quantile(0.1).unwrap(), 1.0);
        assert_eq!(dist.quantile(0.125).unwrap(), 1.0);
        assert_relative_eq!(dist.quantile(0.25).unwrap(), 1.5, epsilon = 1e-12);
        assert_relative_eq!(dist.quantile(0.5).unwrap(), 2.5, epsilon = 1e-12);
        assert_eq!(dist.quantile(0.95).unwrap(), 4.0);
    }

    #[test]
    fn test_bin_masses_refine_tails() {
        assert_eq!(bin_masses(0), vec![1.0]);
        assert_eq!(bin_masses(8), vec![0.125; 8]);

        let masses = bin_masses(256);
        assert_eq!(masses.len(), 256);
        assert_relative_eq!(masses.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for (low, high) in masses.iter().zip(masses.iter().rev()) {
            assert_relative_eq!(*low, *high, max_relative = 1e-12);
        }

        // 32 bins per tail shrinking towards the ends, equal mass in between
        let body = masses[128];
        assert!(masses[32..224].iter().all(|&m| (m - body).abs() < 1e-15));
        assert!(masses[224..255].windows(2).all(|w| w[0] > w[1]));
        assert_relative_eq!(masses[255], TAIL_FLOOR, max_relative = 1e-9);
        assert_relative_eq!(masses[224..].iter().sum::<f64>(), 2.0 / 192.0, max_relative = 1e-9);
    }

    #[test]
    fn test_pareto_quantiles_match_closed_form() {
        let pareto = BoundedPareto::new(1.05, 0.35, 1000.35).unwrap();
        let dist = ParticleDistribution::from_bounded_pareto(&pareto, 256).unwrap();

        for &p in &[0.001, 0.01, 0.1, 0.5, 0.9] {
            assert_relative_eq!(dist.quantile(p).unwrap(), pareto.quantile(p), max_relative = 1e-3);
        }
        for &p in &[0.99, 0.999, 0.9999] {
            assert_relative_eq!(dist.quantile(p).unwrap(), pareto.quantile(p), max_relative = 0.1);
        }
    }

    #[test]
    fn test_sum_keeps_rare_large_outcomes() {
        // one atom in a million sits far out; equal-mass compression would
        // average it into the top bin
        let mut particles: Vec<Particle> = (0..63)
            .map(|i| Particle {
                value: i as f64 / 63.0,
                weight: (1.0 - 1e-6) / 63.0,
            })
            .collect();
        particles.push(Particle {
            value: 1000.0,
            weight: 1e-6,
        });
        let dist = ParticleDistribution {
            particles,
            lower: 0.0,
            upper: 1000.0,
            representation_size: 64,
        };

        let sum = dist.sum_with(&dist).unwrap();
        assert_eq!(sum.len(), 64);
        assert_relative_eq!(sum.mean(), 2.0 * dist.mean(), max_relative = 1e-12);
        // about 2e-6 of the mass lies above 1000
        let above = sum.probability_greater_than(999.0);
        assert!(above > 1.5e-6 && above < 2.5e-6, "mass above 999: {}", above);
        assert!(sum.particles().last().unwrap().value >= 1000.0);
    }

    #[test]
    fn test_compress_splits_heavy_atom() {
        let atoms = vec![
            Particle { value: 0.0, weight: 0.1 },
            Particle { value: 1.0, weight: 0.8 },
            Particle { value: 2.0, weight: 0.1 },
        ];
        let out = compress(atoms, &[0.5, 0.5], 0.0, 2.0);

        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].weight, 0.5, epsilon = 1e-12);
        assert_relative_eq!(out[1].weight, 0.5, epsilon = 1e-12);
        assert_relative_eq!(out[0].value, 0.8, epsilon = 1e-12);
        assert_relative_eq!(out[1].value, 1.2, epsilon = 1e-12);
    }
}
