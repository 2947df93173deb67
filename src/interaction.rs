//! Interaction protocol: one generation of movement, feeding and combat.
//!
//! Resolution order:
//!
//! 1. the caller lays this generation's food ([`spawn_food`]);
//! 2. every blob moves once, computed from the pre-step snapshot (an evader
//!    with an attacker in reach steps away from it instead of seeking food);
//! 3. priority foragers eat first;
//! 4. everyone else interacts (attacks land) and then tries to eat;
//! 5. survivors roll for reproduction.
//!
//! All work happens on a private copy of the generation.

use crate::blob::{Blob, Interaction};
use crate::geometry::{self, Point};
use crate::population::{self, Attribute, Generation};
use crate::resolver::StochasticResolver;
use crate::stats::StepCounters;
use rand::Rng;

/// Which phases of the protocol are active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionRules {
    /// Priority foragers eat before everyone else
    pub priority_feeding: bool,
    /// Interaction capabilities (attack, evade) are invoked
    pub interactions: bool,
}

impl InteractionRules {
    /// Movement and feeding only
    pub const fn foraging() -> Self {
        Self {
            priority_feeding: false,
            interactions: false,
        }
    }

    /// The full protocol
    pub const fn interactive() -> Self {
        Self {
            priority_feeding: true,
            interactions: true,
        }
    }
}

/// How a blob fared in the feeding phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meal {
    /// Reached food: survives regardless of its survival probability
    Ate,
    /// Missed food but won the survival trial
    Survived,
    Starved,
}

impl Meal {
    pub fn survived(self) -> bool {
        !matches!(self, Meal::Starved)
    }
}

/// Result of resolving one generation
#[derive(Debug, Clone, Default)]
pub struct InteractionOutcome {
    /// Surviving parents, in generation order, with their post-step state
    pub survivors: Vec<Blob>,
    pub offspring: Vec<Blob>,
    /// Food left uneaten
    pub remaining_food: Vec<Point>,
    pub counters: StepCounters,
}

impl InteractionOutcome {
    /// Survivors and offspring merged into the next generation
    pub fn into_generation(self) -> Generation {
        population::merge_populations(&self.survivors, &self.offspring)
    }
}

/// Lay `count` pieces of food uniformly over the unit square
pub fn spawn_food<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Point> {
    (0..count)
        .map(|_| Point::new(rng.gen::<f64>(), rng.gen::<f64>()))
        .collect()
}

/// Whether a blob at `distance` from food can eat it
#[inline]
pub fn within_reach(blob: &Blob, distance: f64) -> bool {
    distance <= blob.size
}

/// Let `blob` try to eat from `food`.
///
/// The closest piece within reach is removed from `food`. Without one, the
/// blob survives only by winning a trial against its survival probability.
pub fn try_to_eat<R: Rng + ?Sized>(
    blob: &Blob,
    food: &mut Vec<Point>,
    resolver: &StochasticResolver,
    rng: &mut R,
) -> Meal {
    if let Some((idx, dist)) = geometry::closest(blob.position, food) {
        if within_reach(blob, dist) {
            food.remove(idx);
            return Meal::Ate;
        }
    }

    if resolver.trial(blob.traits.survival(), rng) {
        Meal::Survived
    } else {
        Meal::Starved
    }
}

/// Indices of blobs other than `blobs[idx]` within its radius
pub fn find_in_reach(idx: usize, blobs: &[Blob]) -> Vec<usize> {
    let center = &blobs[idx];
    blobs
        .iter()
        .enumerate()
        .filter(|&(j, other)| j != idx && center.position.distance_to(&other.position) <= center.size)
        .map(|(j, _)| j)
        .collect()
}

/// Nearest blob among `nearby` that can attack
fn nearest_threat(idx: usize, nearby: &[usize], blobs: &[Blob]) -> Option<usize> {
    let origin = blobs[idx].position;
    nearby
        .iter()
        .copied()
        .filter(|&j| blobs[j].kind.is_threat())
        .map(|j| (j, origin.distance_to(&blobs[j].position)))
        .fold(None, |best: Option<(usize, f64)>, (j, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((j, dist)),
        })
        .map(|(j, _)| j)
}

/// Position of the threat `blobs[idx]` should flee, if it can evade and an
/// attacker is within its radius
fn evasion_threat(idx: usize, blobs: &[Blob]) -> Option<Point> {
    if blobs[idx].kind.interaction() != Some(Interaction::Evade) {
        return None;
    }
    let nearby = find_in_reach(idx, blobs);
    nearest_threat(idx, &nearby, blobs).map(|j| blobs[j].position)
}

/// Apply `blobs[idx]`'s interaction capability, if it has one.
///
/// Evasion is settled in the movement phase: an evader flees instead of
/// seeking food, so `evaded` only reports whether that happened.
fn interact(idx: usize, blobs: &mut [Blob], evaded: bool, counters: &mut StepCounters) {
    match blobs[idx].kind.interaction() {
        Some(Interaction::Attack { damage }) => {
            // No floor: a negative survival probability is certain death
            for j in find_in_reach(idx, blobs) {
                blobs[j].traits.take_damage(damage);
                counters.attacks += 1;
            }
        }
        Some(Interaction::Evade) if evaded => counters.evasions += 1,
        _ => {}
    }
}

/// Resolve one generation against `food`.
///
/// `generation` is only read. Priority foragers and then everyone else are
/// processed in generation order, so with a seeded `rng` the outcome is
/// reproducible; the first forager to reach a contested piece of food gets
/// it.
pub fn resolve_generation<R: Rng + ?Sized>(
    generation: &[Blob],
    food: &[Point],
    rules: InteractionRules,
    resolver: &StochasticResolver,
    rng: &mut R,
) -> InteractionOutcome {
    let mut counters = StepCounters {
        food_laid: food.len(),
        ..StepCounters::default()
    };

    // Phase 1: one simultaneous move per blob against the pre-step snapshot
    let mut evaded = vec![false; generation.len()];
    let moves: Vec<Point> = generation
        .iter()
        .enumerate()
        .map(|(idx, blob)| {
            let threat = if rules.interactions {
                evasion_threat(idx, generation)
            } else {
                None
            };
            if let Some(threat) = threat {
                evaded[idx] = true;
                return geometry::step_away(blob.position, threat, blob.step);
            }

            let target = geometry::closest(blob.position, food)
                .map(|(i, _)| food[i])
                .unwrap_or(blob.position);
            blob.move_toward(target, rng)
        })
        .collect();

    let mut working: Vec<Blob> = generation
        .iter()
        .zip(moves)
        .map(|(blob, position)| Blob {
            position,
            ..blob.clone()
        })
        .collect();

    let mut remaining = food.to_vec();
    let mut meals: Vec<Option<Meal>> = vec![None; working.len()];

    // Phase 2: priority foragers eat first
    if rules.priority_feeding {
        for (idx, blob) in working.iter().enumerate() {
            if !blob.kind.is_priority_forager() {
                continue;
            }
            let meal = try_to_eat(blob, &mut remaining, resolver, rng);
            if meal == Meal::Ate {
                counters.food_eaten += 1;
                counters.priority_meals += 1;
            }
            meals[idx] = Some(meal);
        }
    }

    // Phase 3: everyone else interacts, then eats if still able to
    for idx in 0..working.len() {
        if meals[idx].is_some() {
            continue;
        }

        if rules.interactions {
            interact(idx, &mut working, evaded[idx], &mut counters);
        }

        // Combat can leave a blob unable to eat even with food in reach
        let meal = if rules.interactions && working[idx].is_doomed() {
            Meal::Starved
        } else {
            try_to_eat(&working[idx], &mut remaining, resolver, rng)
        };
        if meal == Meal::Ate {
            counters.food_eaten += 1;
        }
        meals[idx] = Some(meal);
    }

    let survivors: Vec<Blob> = working
        .into_iter()
        .zip(&meals)
        .filter(|(_, meal)| meal.is_some_and(Meal::survived))
        .map(|(blob, _)| blob)
        .collect();
    counters.survivors = survivors.len();

    // Phase 4: reproduction among survivors
    let repr_attrs = population::generation_attributes(&survivors, Attribute::ReproductionProb);
    let offspring = reproduce_survivors(&survivors, &repr_attrs, resolver, rng, &mut counters);

    log::trace!(
        "interaction resolved: {} survivors, {} offspring, {}/{} food eaten",
        counters.survivors,
        counters.births,
        counters.food_eaten,
        counters.food_laid
    );

    InteractionOutcome {
        survivors,
        offspring,
        remaining_food: remaining,
        counters,
    }
}

/// Roll reproduction for every survivor and collect the offspring.
///
/// `repr_attrs` holds one reproduction probability per survivor.
pub(crate) fn reproduce_survivors<R: Rng + ?Sized>(
    survivors: &[Blob],
    repr_attrs: &[f64],
    resolver: &StochasticResolver,
    rng: &mut R,
    counters: &mut StepCounters,
) -> Vec<Blob> {
    let (parents, _) = resolver.apply_mask(survivors, repr_attrs, rng);

    parents
        .iter()
        .map(|parent| {
            let child = parent.offspring(rng);
            counters.births += 1;
            if child.mutated {
                counters.mutations += 1;
            }
            child.blob
        })
        .collect()
}
