//! Blob catalog: behavioral variants, their traits and capabilities.
//!
//! Every variant is a [`BlobKind`]. Its attributes and optional behaviors
//! live in a single capability table ([`BlobKind::profile`]) instead of a
//! type hierarchy, so asking whether a blob can interact is a plain match
//! on [`BlobKind::interaction`].

use crate::error::{BlobError, Result};
use crate::geometry::{self, Point};
use crate::resolver;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of blob variants.
///
/// The derived ordering is the "type tag" order generations are sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlobKind {
    /// Baseline wanderer
    Base,
    MutatedBase,
    /// Perfect traits, used mostly by tests
    PerfectTest,
    Sturdy,
    /// Seeker: steps toward its target
    FoodSense,
    /// Bigger and faster seeker
    MutatedFoodSense,
    /// Priority forager: eats before everyone else
    Quick,
    /// Aggressor: damages everyone in reach
    Aggressive,
    /// Evader: steps away from the nearest aggressor
    Evasive,
}

/// How a blob picks its next position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Random ±step on each axis, target ignored
    Wander,
    /// ±step on each axis toward the target
    Seek,
}

/// Optional interaction capability
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Subtract `damage` from the survival probability of everyone in reach
    Attack { damage: f64 },
    /// Step away from the nearest neighbor that can attack
    Evade,
}

/// Static attributes of a kind
#[derive(Debug, Clone, Copy)]
pub struct KindProfile {
    pub name: &'static str,
    pub color: &'static str,
    pub traits: Traits,
    pub size: f64,
    pub step: f64,
    pub movement: Movement,
    pub interaction: Option<Interaction>,
    pub priority_forager: bool,
    pub reproduces_as: BlobKind,
    pub mutates_to: BlobKind,
    /// Traits given to a mutated child; `None` means the child inherits
    pub mutated_traits: Option<Traits>,
}

const DEFAULT_SIZE: f64 = 0.1;
const DEFAULT_STEP: f64 = 0.1;
const AGGRESSIVE_DAMAGE: f64 = 0.2;

impl BlobKind {
    /// Every kind, in tag order
    pub const ALL: [BlobKind; 9] = [
        BlobKind::Base,
        BlobKind::MutatedBase,
        BlobKind::PerfectTest,
        BlobKind::Sturdy,
        BlobKind::FoodSense,
        BlobKind::MutatedFoodSense,
        BlobKind::Quick,
        BlobKind::Aggressive,
        BlobKind::Evasive,
    ];

    /// Capability table
    pub const fn profile(self) -> KindProfile {
        let base = KindProfile {
            name: "BaseBlob",
            color: "blue",
            traits: Traits::uniform(0.5),
            size: DEFAULT_SIZE,
            step: DEFAULT_STEP,
            movement: Movement::Wander,
            interaction: None,
            priority_forager: false,
            reproduces_as: BlobKind::Base,
            mutates_to: BlobKind::MutatedBase,
            mutated_traits: None,
        };

        match self {
            BlobKind::Base => base,
            BlobKind::MutatedBase => KindProfile {
                name: "MutatedBaseBlob",
                color: "red",
                reproduces_as: BlobKind::MutatedBase,
                ..base
            },
            BlobKind::PerfectTest => KindProfile {
                name: "PerfectTestBlob",
                color: "black",
                traits: Traits::uniform(1.0),
                reproduces_as: BlobKind::MutatedBase,
                mutated_traits: Some(Traits::uniform(1.0)),
                ..base
            },
            BlobKind::Sturdy => KindProfile {
                name: "SturdyBlob",
                color: "green",
                traits: Traits {
                    survival: 0.8,
                    reproduction: 0.5,
                    mutation: 0.5,
                },
                reproduces_as: BlobKind::Sturdy,
                ..base
            },
            BlobKind::FoodSense => KindProfile {
                name: "BlobWithFoodSense",
                color: "purple",
                movement: Movement::Seek,
                reproduces_as: BlobKind::FoodSense,
                mutates_to: BlobKind::MutatedFoodSense,
                ..base
            },
            BlobKind::MutatedFoodSense => KindProfile {
                name: "MutatedBlobWithFoodSense",
                color: "pink",
                size: 0.3,
                step: 0.3,
                movement: Movement::Seek,
                reproduces_as: BlobKind::MutatedFoodSense,
                mutates_to: BlobKind::MutatedFoodSense,
                ..base
            },
            BlobKind::Quick => KindProfile {
                name: "QuickBlob",
                color: "orange",
                movement: Movement::Seek,
                priority_forager: true,
                reproduces_as: BlobKind::Quick,
                mutates_to: BlobKind::MutatedFoodSense,
                ..base
            },
            BlobKind::Aggressive => KindProfile {
                name: "AggressiveBlob",
                color: "darkred",
                movement: Movement::Seek,
                interaction: Some(Interaction::Attack {
                    damage: AGGRESSIVE_DAMAGE,
                }),
                reproduces_as: BlobKind::Aggressive,
                mutates_to: BlobKind::Evasive,
                mutated_traits: Some(Traits {
                    survival: 0.5,
                    reproduction: 0.5,
                    mutation: 0.1,
                }),
                ..base
            },
            BlobKind::Evasive => KindProfile {
                name: "EvasiveBlob",
                color: "cyan",
                movement: Movement::Seek,
                interaction: Some(Interaction::Evade),
                reproduces_as: BlobKind::Evasive,
                mutates_to: BlobKind::Aggressive,
                mutated_traits: Some(Traits {
                    survival: 0.5,
                    reproduction: 0.5,
                    mutation: 0.1,
                }),
                ..base
            },
        }
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        self.profile().name
    }

    /// Display color (irrelevant to the simulation itself)
    pub const fn color(self) -> &'static str {
        self.profile().color
    }

    pub const fn movement(self) -> Movement {
        self.profile().movement
    }

    /// Interaction capability, if the kind has one
    pub const fn interaction(self) -> Option<Interaction> {
        self.profile().interaction
    }

    /// Whether this kind eats before every other kind
    pub const fn is_priority_forager(self) -> bool {
        self.profile().priority_forager
    }

    /// Whether neighbors should treat this kind as a threat
    pub const fn is_threat(self) -> bool {
        matches!(self.interaction(), Some(Interaction::Attack { .. }))
    }

    /// Attack strength, for kinds that attack
    pub const fn attack_damage(self) -> Option<f64> {
        match self.interaction() {
            Some(Interaction::Attack { damage }) => Some(damage),
            _ => None,
        }
    }
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlobKind {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        BlobKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| BlobError::InvalidConfiguration(format!("unknown blob kind '{}'", s)))
    }
}

/// Survival, reproduction and mutation probabilities.
///
/// Only [`Traits::new`] builds a triple from outside the crate, so every
/// value starts in [0, 1]. Combat is the one thing that lowers survival
/// past that range afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    survival: f64,
    reproduction: f64,
    mutation: f64,
}

impl Traits {
    /// Validated constructor: every value must lie in [0, 1]
    pub fn new(survival: f64, reproduction: f64, mutation: f64) -> Result<Self> {
        check_probability("survival_prob", survival)?;
        check_probability("reproduction_prob", reproduction)?;
        check_probability("mutation_prob", mutation)?;
        Ok(Self {
            survival,
            reproduction,
            mutation,
        })
    }

    /// All three probabilities set to `p`
    pub(crate) const fn uniform(p: f64) -> Self {
        Self {
            survival: p,
            reproduction: p,
            mutation: p,
        }
    }

    pub fn survival(&self) -> f64 {
        self.survival
    }

    pub fn reproduction(&self) -> f64 {
        self.reproduction
    }

    pub fn mutation(&self) -> f64 {
        self.mutation
    }

    /// Lower the survival probability by `damage`, with no floor
    pub(crate) fn take_damage(&mut self, damage: f64) {
        self.survival -= damage;
    }
}

fn check_probability(attribute: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BlobError::InvariantViolation { attribute, value })
    }
}

/// A single agent.
///
/// Blobs are plain values. A step works on its own copy of the current
/// generation, so recorded generations are never touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub kind: BlobKind,
    pub traits: Traits,
    pub position: Point,
    /// Interaction radius
    pub size: f64,
    /// Movement per step along each axis
    pub step: f64,
}

impl Blob {
    /// Create a blob with its kind's default traits
    pub fn new(kind: BlobKind, position: Point) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            traits: profile.traits,
            position,
            size: profile.size,
            step: profile.step,
        }
    }

    /// Create a blob with explicit (already validated) traits
    pub fn with_traits(kind: BlobKind, traits: Traits, position: Point) -> Self {
        Self {
            traits,
            ..Self::new(kind, position)
        }
    }

    /// Create a blob at a uniformly random position in the unit square
    pub fn random<R: Rng + ?Sized>(kind: BlobKind, rng: &mut R) -> Self {
        Self::new(kind, random_position(rng))
    }

    /// Replace the probability triple
    pub fn set_traits(&mut self, traits: Traits) {
        self.traits = traits;
    }

    pub fn color(&self) -> &'static str {
        self.kind.color()
    }

    /// Whether combat has left this blob with no chance at all
    #[inline]
    pub fn is_doomed(&self) -> bool {
        !(self.traits.survival > 0.0)
    }

    /// Position after one move toward `target`.
    ///
    /// Returns the new position instead of updating `self` so callers can
    /// compute every move against the same snapshot.
    pub fn move_toward<R: Rng + ?Sized>(&self, target: Point, rng: &mut R) -> Point {
        match self.kind.movement() {
            Movement::Wander => {
                let dx = if rng.gen::<bool>() { self.step } else { -self.step };
                let dy = if rng.gen::<bool>() { self.step } else { -self.step };
                Point::new(self.position.x + dx, self.position.y + dy)
            }
            Movement::Seek => geometry::step_toward(self.position, target, self.step),
        }
    }

    /// Produce one offspring.
    ///
    /// With probability `mutation` the child is of the mutated kind, with
    /// the kind's mutated trait triple or, absent one, the parent's. Otherwise
    /// the child is of the reproduction kind and inherits the parent's triple.
    pub fn reproduce<R: Rng + ?Sized>(&self, rng: &mut R) -> Blob {
        self.offspring(rng).blob
    }

    /// Same as [`Blob::reproduce`], also reporting whether the child mutated
    pub fn offspring<R: Rng + ?Sized>(&self, rng: &mut R) -> Offspring {
        let profile = self.kind.profile();
        let position = random_position(rng);

        if resolver::bernoulli(self.traits.mutation, rng) {
            let traits = profile.mutated_traits.unwrap_or(self.traits);
            Offspring {
                blob: Blob::with_traits(profile.mutates_to, traits, position),
                mutated: true,
            }
        } else {
            Offspring {
                blob: Blob::with_traits(profile.reproduces_as, self.traits, position),
                mutated: false,
            }
        }
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(s={},r={},m={})",
            self.kind, self.traits.survival, self.traits.reproduction, self.traits.mutation
        )
    }
}

/// A newborn blob and whether the mutation trial fired
#[derive(Debug, Clone, PartialEq)]
pub struct Offspring {
    pub blob: Blob,
    pub mutated: bool,
}

/// Uniform position in the unit square
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Point {
    Point::new(rng.gen::<f64>(), rng.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_guaranteed_mutation() {
        let mut rng = rng();
        let blob = Blob::with_traits(BlobKind::Base, Traits::uniform(1.0), Point::default());

        for _ in 0..100 {
            assert_eq!(blob.reproduce(&mut rng).kind, BlobKind::MutatedBase);
        }
    }

    #[test]
    fn test_no_mutation() {
        let mut rng = rng();
        let traits = Traits::new(1.0, 1.0, 0.0).unwrap();

        for kind in BlobKind::ALL {
            let blob = Blob::with_traits(kind, traits, Point::default());
            for _ in 0..20 {
                let child = blob.reproduce(&mut rng);
                assert_eq!(child.kind, kind.profile().reproduces_as);
                assert_eq!(child.traits, traits);
            }
        }
    }

    #[test]
    fn test_mutated_child_uses_fixed_triple() {
        let mut rng = rng();
        let parent = Blob::with_traits(
            BlobKind::Aggressive,
            Traits::new(0.9, 0.9, 1.0).unwrap(),
            Point::default(),
        );

        let child = parent.reproduce(&mut rng);
        assert_eq!(child.kind, BlobKind::Evasive);
        assert_eq!(child.traits, Traits::new(0.5, 0.5, 0.1).unwrap());
    }

    #[test]
    fn test_mutated_child_inherits_without_triple() {
        let mut rng = rng();
        let traits = Traits::new(0.3, 0.7, 1.0).unwrap();
        let parent = Blob::with_traits(BlobKind::FoodSense, traits, Point::default());

        let child = parent.reproduce(&mut rng);
        assert_eq!(child.kind, BlobKind::MutatedFoodSense);
        assert_eq!(child.traits, traits);
        // Size and step follow the child's kind, not the parent's
        assert_eq!(child.size, 0.3);
        assert_eq!(child.step, 0.3);
    }

    #[test]
    fn test_traits_validation() {
        assert!(Traits::new(0.0, 1.0, 0.5).is_ok());
        assert!(matches!(
            Traits::new(1.5, 0.5, 0.5),
            Err(BlobError::InvariantViolation {
                attribute: "survival_prob",
                ..
            })
        ));
        assert!(Traits::new(0.5, -0.1, 0.5).is_err());
        assert!(Traits::new(0.5, 0.5, f64::NAN).is_err());
    }

    #[test]
    fn test_traits_only_leave_range_through_damage() {
        let mut traits = Traits::new(0.3, 0.6, 0.9).unwrap();
        assert_eq!(traits.survival(), 0.3);
        assert_eq!(traits.reproduction(), 0.6);
        assert_eq!(traits.mutation(), 0.9);

        traits.take_damage(0.2);
        traits.take_damage(0.2);
        assert!((traits.survival() + 0.1).abs() < 1e-12);
        assert_eq!(traits.reproduction(), 0.6);

        let blob = Blob::with_traits(BlobKind::Base, traits, Point::default());
        assert!(blob.is_doomed());
    }

    #[test]
    fn test_wander_moves_by_step() {
        let mut rng = rng();
        let blob = Blob::new(BlobKind::Base, Point::new(0.5, 0.5));

        for _ in 0..20 {
            let next = blob.move_toward(Point::new(1.0, 1.0), &mut rng);
            assert!(((next.x - blob.position.x).abs() - blob.step).abs() < 1e-9);
            assert!(((next.y - blob.position.y).abs() - blob.step).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeker_closes_distance() {
        let mut rng = rng();
        let target = Point::new(1.0, 0.8);
        let mut blob = Blob::new(BlobKind::FoodSense, Point::new(0.0, 0.0));

        let mut last = blob.position.distance_to(&target);
        // Strictly closer while both gaps exceed the step
        while (target.x - blob.position.x).abs() > blob.step
            && (target.y - blob.position.y).abs() > blob.step
        {
            blob.position = blob.move_toward(target, &mut rng);
            let dist = blob.position.distance_to(&target);
            assert!(dist < last, "distance went from {} to {}", last, dist);
            last = dist;
        }
    }

    #[test]
    fn test_capability_table() {
        for kind in BlobKind::ALL {
            match kind {
                BlobKind::Aggressive => {
                    assert_eq!(kind.attack_damage(), Some(AGGRESSIVE_DAMAGE));
                    assert!(kind.is_threat());
                }
                BlobKind::Evasive => {
                    assert_eq!(kind.interaction(), Some(Interaction::Evade));
                    assert!(!kind.is_threat());
                }
                _ => assert!(kind.interaction().is_none()),
            }
            assert_eq!(kind.is_priority_forager(), kind == BlobKind::Quick);
        }
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in BlobKind::ALL {
            assert_eq!(kind.name().parse::<BlobKind>().unwrap(), kind);
        }
        assert!("MiscBlob".parse::<BlobKind>().is_err());
    }

    #[test]
    fn test_display() {
        let blob = Blob::with_traits(
            BlobKind::Sturdy,
            Traits::new(0.8, 0.5, 0.25).unwrap(),
            Point::default(),
        );
        assert_eq!(blob.to_string(), "SturdyBlob(s=0.8,r=0.5,m=0.25)");
    }
}
