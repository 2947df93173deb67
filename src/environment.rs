//! Environment engine: owns the generation history and advances it.

use crate::blob::{Blob, BlobKind};
use crate::config::{Config, EnvironmentKind};
use crate::error::{BlobError, Result};
use crate::geometry::Point;
use crate::interaction::{self, InteractionOutcome, InteractionRules};
use crate::population::{self, Attribute, Generation};
use crate::resolver::{self, StochasticResolver};
use crate::stats::{Stats, StatsHistory, StepCounters};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A simulated environment.
///
/// History is append-only: a generation is pushed only once it has been
/// fully resolved, and nothing ever changes it afterwards.
pub struct Environment {
    // Generations, index 0 is the seed
    history: Vec<Generation>,
    // Food laid while resolving generation i into i + 1
    food_history: Vec<Vec<Point>>,

    // Configuration, validated once at construction
    config: Config,
    resolver: StochasticResolver,

    // Statistics
    stats: Stats,
    stats_history: StatsHistory,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl Environment {
    /// Create an environment with a random seed
    pub fn new(config: Config) -> Result<Self> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create an environment with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let resolver = StochasticResolver::from_config(&config.trials)?;

        log::debug!(
            "environment created: kind={:?}, seed={}, trials=[{}, {}]",
            config.environment.kind,
            seed,
            resolver.low(),
            resolver.high()
        );

        Ok(Self {
            history: Vec::new(),
            food_history: Vec::new(),
            config,
            resolver,
            stats: Stats::new(),
            stats_history: StatsHistory::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        })
    }

    /// Configuration this environment was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generation algorithm this environment runs
    pub fn kind(&self) -> EnvironmentKind {
        self.config.environment.kind
    }

    /// Append a caller-supplied generation, sorted by kind.
    ///
    /// `Base` environments accept a spawn at any time (the blobs become a
    /// new generation). Spatial environments only accept the seed
    /// generation, since their food history is aligned with it.
    pub fn spawn(&mut self, blobs: Vec<Blob>) -> Result<()> {
        if !self.history.is_empty() && self.kind().is_spatial() {
            return Err(BlobError::OutOfSequence(
                "spatial environments only accept a seed generation",
            ));
        }

        let generation = Generation::new(blobs);
        log::debug!(
            "spawned generation {} with {} blobs",
            self.history.len(),
            generation.len()
        );
        self.history.push(generation);
        Ok(())
    }

    /// Resolve exactly one generation
    pub fn step(&mut self) -> Result<()> {
        let current = self
            .history
            .last()
            .ok_or(BlobError::OutOfSequence("step called before any generation was spawned"))?;
        let parent_population = current.len();

        let (outcome, food) = match self.config.environment.kind {
            EnvironmentKind::Base => (
                resolve_masked(current, &self.resolver, &mut self.rng),
                None,
            ),
            kind => {
                let rules = if kind == EnvironmentKind::Interactive {
                    InteractionRules::interactive()
                } else {
                    InteractionRules::foraging()
                };
                let food = interaction::spawn_food(
                    self.config.environment.food_per_generation,
                    &mut self.rng,
                );
                let outcome = interaction::resolve_generation(
                    current,
                    &food,
                    rules,
                    &self.resolver,
                    &mut self.rng,
                );
                (outcome, Some(food))
            }
        };

        let counters = outcome.counters;
        let next = outcome.into_generation();
        let index = self.history.len();

        self.stats = Stats::from_step(index, parent_population, next.len(), &counters);
        self.stats_history.record(self.stats.clone());
        self.log_step(&counters, parent_population, next.len());

        if let Some(food) = food {
            self.food_history.push(food);
        }
        self.history.push(next);

        Ok(())
    }

    fn log_step(&self, counters: &StepCounters, parent_population: usize, population: usize) {
        log::debug!("generation {}: {:?}", self.stats.generation, counters);

        if self.stats.generation as u64 % self.config.logging.stats_interval == 0 {
            log::info!("{}", self.stats.summary());
        }
        if population == 0 && parent_population > 0 {
            log::warn!("population extinct at generation {}", self.stats.generation);
        }
    }

    /// Resolve `generations` steps
    pub fn run(&mut self, generations: usize) -> Result<()> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(())
    }

    /// Resolve `generations` steps, calling `callback` after each one
    pub fn run_with_callback<F>(&mut self, generations: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&Environment, usize),
    {
        for i in 0..generations {
            self.step()?;
            callback(self, i);
        }
        Ok(())
    }

    /// Every generation so far, index 0 being the seed
    pub fn history(&self) -> &[Generation] {
        &self.history
    }

    /// Most recent generation
    pub fn current(&self) -> Option<&Generation> {
        self.history.last()
    }

    /// Food laid for each resolved step of a spatial environment
    pub fn food_history(&self) -> &[Vec<Point>] {
        &self.food_history
    }

    /// One attribute value per blob of generation `index`
    pub fn attributes(&self, index: usize, attribute: Attribute) -> Result<Vec<f64>> {
        self.history
            .get(index)
            .map(|generation| generation.attributes(attribute))
            .ok_or(BlobError::OutOfSequence("generation index is not in the history"))
    }

    /// Per-kind population series, each as long as the history
    pub fn counts(&self) -> BTreeMap<BlobKind, Vec<usize>> {
        population::population_counts(&self.history)
    }

    /// Display color of every kind observed so far
    pub fn color_map(&self) -> BTreeMap<BlobKind, &'static str> {
        population::color_map(&self.history)
    }

    /// Size of the latest generation
    pub fn population(&self) -> usize {
        self.current().map_or(0, |g| g.len())
    }

    /// Whether a history exists and its latest generation is empty
    pub fn is_extinct(&self) -> bool {
        self.current().is_some_and(|g| g.is_empty())
    }

    /// Stats of the latest step
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stats_history(&self) -> &StatsHistory {
        &self.stats_history
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Pure probability masking: survival trials, then reproduction trials
/// among the survivors. No movement, food or interaction.
fn resolve_masked<R: Rng + ?Sized>(
    current: &Generation,
    resolver: &StochasticResolver,
    rng: &mut R,
) -> InteractionOutcome {
    let mut counters = StepCounters::default();

    let surv_attrs = current.attributes(Attribute::SurvivalProb);
    let repr_attrs = current.attributes(Attribute::ReproductionProb);

    let (survivors, surv_mask) = resolver.apply_mask(current, &surv_attrs, rng);
    counters.survivors = survivors.len();

    let repr_attrs = resolver::filter_by_mask(&repr_attrs, &surv_mask);
    let offspring =
        interaction::reproduce_survivors(&survivors, &repr_attrs, resolver, rng, &mut counters);

    InteractionOutcome {
        survivors,
        offspring,
        remaining_food: Vec::new(),
        counters,
    }
}
