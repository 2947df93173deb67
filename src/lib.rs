//! # BLOBWORLD
//!
//! Stochastic population-dynamics simulator for typed "blobs".
//!
//! ## Features
//!
//! - **Typed kinds**: nine blob kinds described by a constant capability table
//! - **Three environments**: pure probability masking, foraging, and
//!   foraging with attack/evade interactions
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: Seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust
//! use blobworld::{Blob, BlobKind, Config, Environment, Point, Traits};
//!
//! let mut env = Environment::new_with_seed(Config::default(), 42).unwrap();
//!
//! let traits = Traits::new(0.9, 0.5, 0.1).unwrap();
//! env.spawn(vec![Blob::with_traits(BlobKind::Base, traits, Point::new(0.5, 0.5))])
//!     .unwrap();
//!
//! env.run(10).unwrap();
//! assert_eq!(env.history().len(), 11);
//! println!("Population: {}", env.population());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use blobworld::{Config, EnvironmentKind};
//!
//! let mut config = Config::for_kind(EnvironmentKind::Interactive);
//! config.environment.food_per_generation = 40;
//! config.logging.stats_interval = 5;
//! assert!(config.validate().is_ok());
//! ```

pub mod blob;
pub mod config;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod population;
pub mod resolver;
pub mod stats;

// Re-export main types
pub use blob::{Blob, BlobKind, Traits};
pub use config::{Config, EnvironmentKind};
pub use environment::Environment;
pub use error::{BlobError, Result};
pub use geometry::Point;
pub use population::{Attribute, Generation};
pub use resolver::StochasticResolver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark: `population` random blobs of every foraging kind
/// resolved for `generations` steps in an interactive environment.
pub fn benchmark(generations: usize, population: usize) -> Result<BenchmarkResult> {
    use rand::SeedableRng;
    use std::time::Instant;

    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
    let kinds = [
        BlobKind::FoodSense,
        BlobKind::Quick,
        BlobKind::Aggressive,
        BlobKind::Evasive,
    ];
    let seed: Vec<Blob> = (0..population)
        .map(|i| Blob::random(kinds[i % kinds.len()], &mut rng))
        .collect();

    let mut env = Environment::new_with_seed(Config::for_kind(EnvironmentKind::Interactive), 42)?;
    env.spawn(seed)?;

    let start = Instant::now();
    env.run(generations)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        generations,
        initial_population: population,
        final_population: env.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        generations_per_second: generations as f64 / elapsed.as_secs_f64(),
        extinct_at: env.stats_history().extinction_generation(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub generations: usize,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub generations_per_second: f64,
    pub extinct_at: Option<usize>,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Generations: {}", self.generations)?;
        writeln!(f, "Population: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} generations/s", self.generations_per_second)?;
        match self.extinct_at {
            Some(generation) => writeln!(f, "Extinct at generation: {}", generation)?,
            None => writeln!(f, "Extinct: no")?,
        }
        Ok(())
    }
}
