//! Closed-form bounded Pareto distribution.
//!
//! For shape `a`, lower bound `L` and upper bound `H` with `0 < L < H`:
//!
//! ```text
//! F(x)   = (1 - (L/x)^a) / (1 - (L/H)^a)            L <= x <= H
//! Q(u)   = L * exp(-ln(1 - u * (1 - (L/H)^a)) / a)
//! E[X; x in [s, t]] = a L / (1 - (L/H)^a) * ((s/L)^(1-a) - (t/L)^(1-a)) / (a - 1)
//! ```
//!
//! with the `a = 1` limit `L / (1 - L/H) * ln(t/s)`. `L == H` and `L == 0`
//! both collapse to a point mass at `L`.

use crate::error::ProviderError;

/// Bounded (truncated) Pareto distribution on `[lower, upper]`.
///
/// # Examples
///
/// ```rust
/// use forecast_core::distribution::BoundedPareto;
///
/// let pareto = BoundedPareto::new(2.0, 1.0, 10.0).unwrap();
/// assert_eq!(pareto.quantile(0.0), 1.0);
/// assert_eq!(pareto.quantile(1.0), 10.0);
/// assert!((pareto.cdf(pareto.quantile(0.3)) - 0.3).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundedPareto {
    alpha: f64,
    lower: f64,
    upper: f64,
    /// `1 - (L/H)^a`, the normalising mass of the truncated support.
    truncated_mass: f64,
}

impl BoundedPareto {
    /// Creates a bounded Pareto distribution.
    ///
    /// # Errors
    ///
    /// - `ProviderError::InvalidShape` unless `alpha` is positive and finite
    /// - `ProviderError::InvalidSupport` unless `0 <= lower <= upper < inf`
    /// - `ProviderError::MassUnderflow` if `alpha` is so small that
    ///   `1 - (lower/upper)^alpha` is not a normal float
    pub fn new(alpha: f64, lower: f64, upper: f64) -> Result<Self, ProviderError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ProviderError::InvalidShape(alpha));
        }
        if !(lower.is_finite() && upper.is_finite() && lower >= 0.0 && lower <= upper) {
            return Err(ProviderError::InvalidSupport { lower, upper });
        }

        let truncated_mass = if lower > 0.0 && lower < upper {
            -(alpha * (lower / upper).ln()).exp_m1()
        } else {
            1.0
        };
        if !truncated_mass.is_normal() {
            return Err(ProviderError::MassUnderflow {
                alpha,
                lower,
                upper,
            });
        }

        Ok(Self {
            alpha,
            lower,
            upper,
            truncated_mass,
        })
    }

    /// Returns the shape parameter.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the lower bound of the support.
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Returns the upper bound of the support.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Returns the atom if the distribution is a point mass.
    #[inline]
    pub fn point_mass(&self) -> Option<f64> {
        if self.lower == self.upper || self.lower == 0.0 {
            Some(self.lower)
        } else {
            None
        }
    }

    /// Cumulative distribution function.
    pub fn cdf(&self, x: f64) -> f64 {
        if let Some(point) = self.point_mass() {
            return if x >= point { 1.0 } else { 0.0 };
        }
        if x < self.lower {
            0.0
        } else if x >= self.upper {
            1.0
        } else {
            let tail = -(self.alpha * (self.lower / x).ln()).exp_m1();
            (tail / self.truncated_mass).clamp(0.0, 1.0)
        }
    }

    /// Inverse CDF for `u` in [0, 1]; values outside are clamped.
    pub fn quantile(&self, u: f64) -> f64 {
        if let Some(point) = self.point_mass() {
            return point;
        }
        if u <= 0.0 {
            return self.lower;
        }
        if u >= 1.0 {
            return self.upper;
        }
        // ln_1p keeps u * mass from vanishing next to 1 when alpha is tiny
        let exponent = -(-u * self.truncated_mass).ln_1p() / self.alpha;
        (self.lower * exponent.exp()).clamp(self.lower, self.upper)
    }

    /// Maps a uniform variate in (0, 1) to a draw.
    #[inline]
    pub fn sample(&self, u: f64) -> f64 {
        self.quantile(u)
    }

    /// Expected value.
    pub fn mean(&self) -> f64 {
        match self.point_mass() {
            Some(point) => point,
            None => self.partial_expectation(self.lower, self.upper),
        }
    }

    /// Partial expectation `E[X; s <= X <= t]` for `lower <= s <= t <= upper`.
    ///
    /// Arguments are clamped to the support.
    pub fn partial_expectation(&self, s: f64, t: f64) -> f64 {
        if let Some(point) = self.point_mass() {
            return if s <= point && point <= t { point } else { 0.0 };
        }
        let s = s.clamp(self.lower, self.upper);
        let t = t.clamp(self.lower, self.upper);
        if t <= s {
            return 0.0;
        }

        let c = 1.0 - self.alpha;
        let log_s = (s / self.lower).ln();
        let log_t = (t / self.lower).ln();
        // (e^{c log_t} - e^{c log_s}) / c, written to stay accurate as c -> 0
        let integral = if c.abs() < 1e-12 {
            log_t - log_s
        } else {
            (c * log_s).exp() * (c * (log_t - log_s)).exp_m1() / c
        };

        self.alpha * self.lower / self.truncated_mass * integral
    }

    /// Conditional means of consecutive probability slices of the support.
    ///
    /// `masses` are the probabilities of the slices, from the lower end up,
    /// and should sum to 1. The returned values are ascending, each lies
    /// inside its slice, and their `masses`-weighted sum equals
    /// [`mean`](Self::mean).
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::NonFinite` if a bin mean overflows.
    pub fn bin_means(&self, masses: &[f64]) -> Result<Vec<f64>, ProviderError> {
        if let Some(point) = self.point_mass() {
            return Ok(vec![point; masses.len().max(1)]);
        }

        let mut means = Vec::with_capacity(masses.len());
        let mut left = self.lower;
        let mut cumulative = 0.0;

        for (i, &mass) in masses.iter().enumerate() {
            cumulative += mass;
            let right = if i + 1 == masses.len() {
                self.upper
            } else {
                self.quantile(cumulative)
            };
            let mean = (self.partial_expectation(left, right) / mass).clamp(left, right);
            if !mean.is_finite() {
                return Err(ProviderError::NonFinite("bounded Pareto bin mean"));
            }
            means.push(mean);
            left = right;
        }

        Ok(means)
    }
}
