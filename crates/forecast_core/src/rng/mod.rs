//! # Random Number Generation
//!
//! Seeded pseudo-random number generation for the sampled evaluation mode.
//!
//! - **Reproducibility**: every generator is created from an explicit seed
//! - **Independent streams**: each Monte Carlo iteration derives its own
//!   stream from `(seed, iteration)`, so results do not depend on how
//!   iterations are scheduled across threads
//! - **Open interval**: inverse-CDF sampling needs uniforms strictly inside
//!   (0, 1), which [`ForecastRng::gen_open01`] provides
//!
//! ## Usage Example
//!
//! ```rust
//! use forecast_core::rng::ForecastRng;
//!
//! let mut rng = ForecastRng::for_stream(42, 7);
//! let u = rng.gen_open01();
//! assert!(u > 0.0 && u < 1.0);
//! ```

mod prng;

pub use prng::ForecastRng;
