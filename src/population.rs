//! Population index: type runs of sorted generations and the aggregate
//! queries built on them.
//!
//! Every query here assumes its input is sorted by [`BlobKind`]. Nothing in
//! this module sorts except [`Generation::new`] and [`merge_populations`].

use crate::blob::{Blob, BlobKind, Traits};
use crate::error::{BlobError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Deref, Range};
use std::str::FromStr;

/// One time step's population, sorted by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    blobs: Vec<Blob>,
}

impl Generation {
    /// Build a generation, sorting (stably) by kind
    pub fn new(mut blobs: Vec<Blob>) -> Self {
        blobs.sort_by_key(|b| b.kind);
        Self { blobs }
    }

    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn into_blobs(self) -> Vec<Blob> {
        self.blobs
    }

    /// Type runs of this generation
    pub fn pivot_index(&self) -> PivotIndex {
        pivot_indices(&self.blobs)
    }

    /// One value per blob, in generation order
    pub fn attributes(&self, attribute: Attribute) -> Vec<f64> {
        generation_attributes(&self.blobs, attribute)
    }
}

impl Deref for Generation {
    type Target = [Blob];

    fn deref(&self) -> &[Blob] {
        &self.blobs
    }
}

impl From<Vec<Blob>> for Generation {
    fn from(blobs: Vec<Blob>) -> Self {
        Self::new(blobs)
    }
}

/// Run-length view of a sorted population.
///
/// `tags[i]` is the kind of the i-th run and `pivots[i]` the index of its
/// last member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotIndex {
    pub tags: Vec<BlobKind>,
    pub pivots: Vec<usize>,
}

impl PivotIndex {
    /// Number of runs
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Each run's kind and index range
    pub fn runs(&self) -> impl Iterator<Item = (BlobKind, Range<usize>)> + '_ {
        let starts = std::iter::once(0).chain(self.pivots.iter().map(|&p| p + 1));
        self.tags
            .iter()
            .zip(starts)
            .zip(&self.pivots)
            .map(|((&tag, start), &pivot)| (tag, start..pivot + 1))
    }

    /// Length of each run
    pub fn run_lengths(&self) -> Vec<usize> {
        self.runs().map(|(_, range)| range.len()).collect()
    }
}

/// Find the type runs of a population already sorted by kind
pub fn pivot_indices(population: &[Blob]) -> PivotIndex {
    let mut index = PivotIndex::default();

    for (i, pair) in population.windows(2).enumerate() {
        if pair[0].kind != pair[1].kind {
            index.tags.push(pair[0].kind);
            index.pivots.push(i);
        }
    }
    if let Some(last) = population.last() {
        index.tags.push(last.kind);
        index.pivots.push(population.len() - 1);
    }

    index
}

/// Scalar attributes that can be read off a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    SurvivalProb,
    ReproductionProb,
    MutationProb,
    Size,
    Step,
    AttackDamage,
}

impl Attribute {
    pub const fn name(self) -> &'static str {
        match self {
            Attribute::SurvivalProb => "survival_prob",
            Attribute::ReproductionProb => "reproduction_prob",
            Attribute::MutationProb => "mutation_prob",
            Attribute::Size => "size",
            Attribute::Step => "step",
            Attribute::AttackDamage => "attack_damage",
        }
    }

    /// Attributes fixed by the kind, which can be broadcast per run.
    /// Probabilities change per blob (combat, bulk setters) and cannot.
    pub const fn is_kind_constant(self) -> bool {
        matches!(
            self,
            Attribute::Size | Attribute::Step | Attribute::AttackDamage
        )
    }

    fn read(self, blob: &Blob) -> f64 {
        match self {
            Attribute::SurvivalProb => blob.traits.survival(),
            Attribute::ReproductionProb => blob.traits.reproduction(),
            Attribute::MutationProb => blob.traits.mutation(),
            Attribute::Size => blob.size,
            Attribute::Step => blob.step,
            Attribute::AttackDamage => blob.kind.attack_damage().unwrap_or(0.0),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "survival_prob" => Ok(Attribute::SurvivalProb),
            "reproduction_prob" => Ok(Attribute::ReproductionProb),
            "mutation_prob" => Ok(Attribute::MutationProb),
            "size" => Ok(Attribute::Size),
            "step" => Ok(Attribute::Step),
            "attack_damage" => Ok(Attribute::AttackDamage),
            other => Err(BlobError::InvalidConfiguration(format!(
                "unknown attribute '{}'",
                other
            ))),
        }
    }
}

/// Read one attribute per blob, aligned with `population`.
///
/// Kind-constant attributes are looked up once per run at its pivot.
pub fn generation_attributes(population: &[Blob], attribute: Attribute) -> Vec<f64> {
    let mut values = Vec::with_capacity(population.len());

    for (_, range) in pivot_indices(population).runs() {
        if attribute.is_kind_constant() {
            let value = attribute.read(&population[range.end - 1]);
            values.extend(std::iter::repeat(value).take(range.len()));
        } else {
            values.extend(population[range].iter().map(|b| attribute.read(b)));
        }
    }

    values
}

/// Count each kind in every generation of `history`.
///
/// Every kind seen anywhere gets a series as long as `history`, with 0
/// for generations it is absent from.
pub fn population_counts(history: &[Generation]) -> BTreeMap<BlobKind, Vec<usize>> {
    let indices: Vec<PivotIndex> = history.iter().map(Generation::pivot_index).collect();
    let kinds: BTreeSet<BlobKind> = indices
        .iter()
        .flat_map(|index| index.tags.iter().copied())
        .collect();

    match kinds.len() {
        0 => BTreeMap::new(),
        1 => kinds
            .into_iter()
            .map(|kind| (kind, history.iter().map(|g| g.len()).collect()))
            .collect(),
        _ => {
            let mut counts: BTreeMap<BlobKind, Vec<usize>> = kinds
                .into_iter()
                .map(|kind| (kind, vec![0; history.len()]))
                .collect();

            for (g, index) in indices.iter().enumerate() {
                for (kind, range) in index.runs() {
                    if let Some(series) = counts.get_mut(&kind) {
                        series[g] += range.len();
                    }
                }
            }
            counts
        }
    }
}

/// Display color of every kind seen in `history`
pub fn color_map(history: &[Generation]) -> BTreeMap<BlobKind, &'static str> {
    history
        .iter()
        .flat_map(|g| g.pivot_index().tags)
        .map(|kind| (kind, kind.color()))
        .collect()
}

/// Concatenate two populations and re-sort by kind
pub fn merge_populations(first: &[Blob], second: &[Blob]) -> Generation {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    merged.extend_from_slice(first);
    merged.extend_from_slice(second);
    Generation::new(merged)
}

/// Number of blobs of `kind` in a sorted population
pub fn survivors_of_kind(kind: BlobKind, population: &[Blob]) -> usize {
    pivot_indices(population)
        .runs()
        .filter(|(tag, _)| *tag == kind)
        .map(|(_, range)| range.len())
        .sum()
}

/// Kind with the most members, ties going to the earlier kind
pub fn most_prevalent(population: &[Blob]) -> Option<(BlobKind, usize)> {
    let mut totals: BTreeMap<BlobKind, usize> = BTreeMap::new();
    for (kind, range) in pivot_indices(population).runs() {
        *totals.entry(kind).or_insert(0) += range.len();
    }

    totals
        .into_iter()
        .fold(None, |best, (kind, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((kind, count)),
        })
}

/// Partial replacement of a probability triple
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraitUpdate {
    pub survival: Option<f64>,
    pub reproduction: Option<f64>,
    pub mutation: Option<f64>,
}

impl TraitUpdate {
    pub fn survival(mut self, p: f64) -> Self {
        self.survival = Some(p);
        self
    }

    pub fn reproduction(mut self, p: f64) -> Self {
        self.reproduction = Some(p);
        self
    }

    pub fn mutation(mut self, p: f64) -> Self {
        self.mutation = Some(p);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.survival.is_none() && self.reproduction.is_none() && self.mutation.is_none()
    }

    fn apply(&self, traits: Traits) -> Result<Traits> {
        Traits::new(
            self.survival.unwrap_or(traits.survival()),
            self.reproduction.unwrap_or(traits.reproduction()),
            self.mutation.unwrap_or(traits.mutation()),
        )
    }
}

/// Copy `population` with the given traits overridden on every blob.
///
/// Fails with `InvalidConfiguration` when the update sets nothing.
pub fn set_traits_of_population(population: &[Blob], update: TraitUpdate) -> Result<Vec<Blob>> {
    if update.is_empty() {
        return Err(BlobError::InvalidConfiguration(
            "no attributes given to set".to_string(),
        ));
    }

    population
        .iter()
        .map(|blob| {
            let traits = update.apply(blob.traits)?;
            Ok(Blob::with_traits(blob.kind, traits, blob.position))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn blob(kind: BlobKind, s: f64, r: f64, m: f64) -> Blob {
        Blob::with_traits(kind, Traits::new(s, r, m).unwrap(), Point::default())
    }

    /// Two generations: [Base, Base, MutatedBase, MutatedBase] and [Base]
    fn dummy_history() -> Vec<Generation> {
        let b = blob(BlobKind::Base, 0.5, 1.0, 1.0);
        let m = blob(BlobKind::MutatedBase, 0.3, 1.0, 1.0);
        let b2 = blob(BlobKind::Base, 0.5, 0.5, 0.5);
        vec![
            Generation::new(vec![b.clone(), b, m.clone(), m]),
            Generation::new(vec![b2]),
        ]
    }

    fn kinds(population: &[Blob]) -> Vec<BlobKind> {
        population.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_pivot_indices() {
        let history = dummy_history();
        let index = pivot_indices(&history[0]);
        assert_eq!(index.tags, vec![BlobKind::Base, BlobKind::MutatedBase]);
        assert_eq!(index.pivots, vec![1, 3]);
        assert_eq!(index.run_lengths(), vec![2, 2]);
    }

    #[test]
    fn test_pivots_partition_generation() {
        let population = Generation::new(vec![
            Blob::new(BlobKind::Quick, Point::default()),
            Blob::new(BlobKind::Base, Point::default()),
            Blob::new(BlobKind::Evasive, Point::default()),
            Blob::new(BlobKind::Quick, Point::default()),
            Blob::new(BlobKind::Base, Point::default()),
            Blob::new(BlobKind::Base, Point::default()),
        ]);

        let index = population.pivot_index();
        let rebuilt: Vec<BlobKind> = index
            .runs()
            .flat_map(|(kind, range)| std::iter::repeat(kind).take(range.len()))
            .collect();
        assert_eq!(rebuilt, kinds(&population));
        assert_eq!(*index.pivots.last().unwrap(), population.len() - 1);
    }

    #[test]
    fn test_empty_generation() {
        let empty = Generation::default();
        let index = empty.pivot_index();
        assert!(index.tags.is_empty());
        assert!(index.pivots.is_empty());
        assert_eq!(index.runs().count(), 0);
        assert!(empty.attributes(Attribute::SurvivalProb).is_empty());
        assert!(most_prevalent(&empty).is_none());
        assert_eq!(survivors_of_kind(BlobKind::Base, &empty), 0);
    }

    #[test]
    fn test_generation_attributes() {
        let history = dummy_history();
        let attrs = generation_attributes(&history[0], Attribute::SurvivalProb);
        assert_eq!(attrs, vec![0.5, 0.5, 0.3, 0.3]);

        let sizes = generation_attributes(&history[0], Attribute::Size);
        assert_eq!(sizes, vec![0.1; 4]);
    }

    #[test]
    fn test_attributes_follow_per_blob_state() {
        let mut population = vec![
            Blob::new(BlobKind::Aggressive, Point::default()),
            Blob::new(BlobKind::Aggressive, Point::default()),
            Blob::new(BlobKind::Base, Point::default()),
        ];
        population[0].traits.take_damage(0.8);

        // Sorted: Base first, then the two aggressors in spawn order
        let generation = Generation::new(population);
        let survival = generation.attributes(Attribute::SurvivalProb);
        assert_eq!(survival.len(), 3);
        assert_eq!(survival[0], 0.5);
        assert!((survival[1] + 0.3).abs() < 1e-12);
        assert_eq!(survival[2], 0.5);

        let damage = generation.attributes(Attribute::AttackDamage);
        assert_eq!(damage, vec![0.0, 0.2, 0.2]);
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(
            "survival_prob".parse::<Attribute>().unwrap(),
            Attribute::SurvivalProb
        );
        assert_eq!(Attribute::MutationProb.to_string(), "mutation_prob");
        assert!(matches!(
            "colour".parse::<Attribute>(),
            Err(BlobError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_population_counts() {
        let counts = population_counts(&dummy_history());
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&BlobKind::Base], vec![2, 1]);
        assert_eq!(counts[&BlobKind::MutatedBase], vec![2, 0]);
    }

    #[test]
    fn test_population_counts_fast_paths() {
        assert!(population_counts(&[]).is_empty());
        assert!(population_counts(&[Generation::default(), Generation::default()]).is_empty());

        let single = vec![
            Generation::new(vec![Blob::new(BlobKind::Sturdy, Point::default()); 3]),
            Generation::default(),
            Generation::new(vec![Blob::new(BlobKind::Sturdy, Point::default())]),
        ];
        let counts = population_counts(&single);
        assert_eq!(counts[&BlobKind::Sturdy], vec![3, 0, 1]);
    }

    #[test]
    fn test_color_map() {
        let colors = color_map(&dummy_history());
        assert_eq!(colors[&BlobKind::Base], "blue");
        assert_eq!(colors[&BlobKind::MutatedBase], "red");
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn test_merge_populations_sorts() {
        let history = dummy_history();
        let merged = merge_populations(&history[0], &history[1]);
        assert_eq!(
            kinds(&merged),
            vec![
                BlobKind::Base,
                BlobKind::Base,
                BlobKind::Base,
                BlobKind::MutatedBase,
                BlobKind::MutatedBase
            ]
        );
    }

    #[test]
    fn test_merge_matches_concat_and_resort() {
        let first = Generation::new(vec![
            Blob::new(BlobKind::Base, Point::default()),
            Blob::new(BlobKind::Quick, Point::default()),
        ]);
        let second = Generation::new(vec![
            Blob::new(BlobKind::Sturdy, Point::default()),
            Blob::new(BlobKind::Evasive, Point::default()),
            Blob::new(BlobKind::Sturdy, Point::default()),
        ]);

        let merged = merge_populations(&first, &second);

        let mut concat: Vec<Blob> = first.iter().chain(second.iter()).cloned().collect();
        concat.sort_by_key(|b| b.kind);
        assert_eq!(merged.pivot_index(), pivot_indices(&concat));
        assert_eq!(merged.pivot_index().pivots, vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_survivors_of_kind() {
        let mut population = vec![Blob::new(BlobKind::PerfectTest, Point::default()); 5];
        population.push(Blob::new(BlobKind::Base, Point::default()));
        let generation = Generation::new(population);

        assert_eq!(survivors_of_kind(BlobKind::PerfectTest, &generation), 5);
        assert_eq!(survivors_of_kind(BlobKind::Base, &generation), 1);
        assert_eq!(survivors_of_kind(BlobKind::Evasive, &generation), 0);
    }

    #[test]
    fn test_most_prevalent() {
        let history = dummy_history();
        // Tie between Base and MutatedBase resolves to the earlier kind
        assert_eq!(most_prevalent(&history[0]), Some((BlobKind::Base, 2)));

        let generation = Generation::new(vec![
            Blob::new(BlobKind::Base, Point::default()),
            Blob::new(BlobKind::Quick, Point::default()),
            Blob::new(BlobKind::Quick, Point::default()),
        ]);
        assert_eq!(most_prevalent(&generation), Some((BlobKind::Quick, 2)));
    }

    #[test]
    fn test_set_traits_missing_attributes() {
        let history = dummy_history();
        assert!(matches!(
            set_traits_of_population(&history[0], TraitUpdate::default()),
            Err(BlobError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_set_traits_one_attribute() {
        let history = dummy_history();
        let changed =
            set_traits_of_population(&history[0], TraitUpdate::default().survival(0.42)).unwrap();
        assert!(changed.iter().all(|b| b.traits.survival() == 0.42));
        // Untouched fields keep their values
        assert!(changed.iter().all(|b| b.traits.reproduction() == 1.0));
        // The source population is not modified
        assert_eq!(history[0][0].traits.survival(), 0.5);
    }

    #[test]
    fn test_set_traits_three_attributes() {
        let history = dummy_history();
        let update = TraitUpdate::default()
            .survival(0.42)
            .reproduction(0.9)
            .mutation(0.5);
        let changed = set_traits_of_population(&history[0], update).unwrap();
        let expected = Traits::new(0.42, 0.9, 0.5).unwrap();
        assert!(changed.iter().all(|b| b.traits == expected));
    }

    #[test]
    fn test_set_traits_out_of_range() {
        let history = dummy_history();
        assert!(matches!(
            set_traits_of_population(&history[0], TraitUpdate::default().mutation(1.2)),
            Err(BlobError::InvariantViolation { .. })
        ));
    }
}
