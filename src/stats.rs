//! Statistics tracking for the simulation.

/// Raw counters produced while resolving one generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepCounters {
    /// Blobs that made it through the survival phase
    pub survivors: usize,
    /// Offspring produced
    pub births: usize,
    /// Offspring of the mutated kind
    pub mutations: usize,
    /// Food laid this generation
    pub food_laid: usize,
    /// Food consumed (priority meals included)
    pub food_eaten: usize,
    /// Food consumed by priority foragers
    pub priority_meals: usize,
    /// Individual damage applications
    pub attacks: usize,
    /// Blobs that stepped away from a threat
    pub evasions: usize,
}

/// Statistics snapshot for one resolved generation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// Index of the generation that was produced
    pub generation: usize,
    /// Size of the generation the step started from
    pub parent_population: usize,
    /// Size of the produced generation
    pub population: usize,
    /// Parents that did not survive
    pub deaths: usize,
    pub survivors: usize,
    pub births: usize,
    pub mutations: usize,
    pub food_laid: usize,
    pub food_eaten: usize,
    pub priority_meals: usize,
    pub attacks: usize,
    pub evasions: usize,
}

impl Stats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the snapshot for a freshly appended generation
    pub fn from_step(
        generation: usize,
        parent_population: usize,
        population: usize,
        counters: &StepCounters,
    ) -> Self {
        Self {
            generation,
            parent_population,
            population,
            deaths: parent_population.saturating_sub(counters.survivors),
            survivors: counters.survivors,
            births: counters.births,
            mutations: counters.mutations,
            food_laid: counters.food_laid,
            food_eaten: counters.food_eaten,
            priority_meals: counters.priority_meals,
            attacks: counters.attacks,
            evasions: counters.evasions,
        }
    }

    /// Fraction of the parent generation that survived
    pub fn survival_rate(&self) -> f64 {
        if self.parent_population == 0 {
            0.0
        } else {
            self.survivors as f64 / self.parent_population as f64
        }
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        if self.food_laid > 0 {
            format!(
                "Gen:{:5} | Pop:{:6} | Born:{:5} | Died:{:5} | Mut:{:4} | Food:{:3}/{:3} | Atk:{:4} | Evd:{:4}",
                self.generation,
                self.population,
                self.births,
                self.deaths,
                self.mutations,
                self.food_eaten,
                self.food_laid,
                self.attacks,
                self.evasions,
            )
        } else {
            format!(
                "Gen:{:5} | Pop:{:6} | Born:{:5} | Died:{:5} | Mut:{:4}",
                self.generation, self.population, self.births, self.deaths, self.mutations
            )
        }
    }
}

/// Historical statistics tracker, one snapshot per step
#[derive(Clone, Debug, Default)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Stats of the step that produced `generation`
    pub fn get(&self, generation: usize) -> Option<&Stats> {
        self.snapshots.iter().find(|s| s.generation == generation)
    }

    /// Population over time
    pub fn population_series(&self) -> Vec<(usize, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.population))
            .collect()
    }

    /// Births over time
    pub fn births_series(&self) -> Vec<(usize, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.births))
            .collect()
    }

    /// First generation with no blobs left, if any
    pub fn extinction_generation(&self) -> Option<usize> {
        self.snapshots
            .iter()
            .find(|s| s.population == 0)
            .map(|s| s.generation)
    }
}
