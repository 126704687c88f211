//! Optimizer configuration.
//!
//! Defaults are the calibrated values of the 2017 study week.  Every
//! optimizer validates its config once, at construction.

use std::time::Duration;

use crate::{OptimError, OptimResult};

// ── Strategy selections ───────────────────────────────────────────────────────

/// How station capacities are enforced.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintStrategy {
    /// Capacities are ignored.
    #[default]
    None,
    /// Violations are added to the fitness.
    Penalty,
    /// Individuals are repaired before they enter a population.
    Repair,
}

/// How fresh allocations are generated.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitializerKind {
    #[default]
    Random,
    Uniform,
    UniformRandom,
    PopulationProportionate,
    SatisfyConstraintRandom,
    /// Random 80 %, population proportionate 10 %, uniform random 10 %.
    Mix,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeighborhoodKind {
    /// Advance one gene to the next station id.
    #[default]
    Forward,
    /// Set one gene to any other station id.
    Hamming,
}

/// What a memetic improvement does with a better neighbor.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvolutionStrategy {
    /// Nothing.
    Darwinian,
    /// Adopt its fitness only.
    Baldwinian,
    /// Adopt its fitness and its allocation.
    #[default]
    Lamarckian,
}

/// How the genetic algorithms pick parents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParentSelection {
    /// Tournament on fitness.
    #[default]
    Tournament,
    /// Tournament on fitness; near ties go to the more novel individual.
    Novelty,
}

// ── FitnessConfig ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitnessConfig {
    /// Minimize `1 − average survival probability` instead of the average
    /// response time.
    pub use_urgency_fitness: bool,
    pub constraint_strategy: ConstraintStrategy,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self { use_urgency_fitness: true, constraint_strategy: ConstraintStrategy::default() }
    }
}

impl FitnessConfig {
    /// Fitness added per unit of capacity violation.  Scaled to the
    /// objective: survival odds live in `[0, 1]`, response times in seconds.
    pub fn penalty_factor(&self) -> f64 {
        if self.use_urgency_fitness { 0.01 } else { 10.0 }
    }
}

// ── GaConfig ──────────────────────────────────────────────────────────────────

/// Parameters of the genetic and memetic algorithms.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    pub population_size: usize,
    /// Best individuals copied unchanged into the next generation.
    pub elite_size:      usize,
    pub tournament_size: usize,
    /// Ignored by the multi-objective algorithm, which ranks by front and
    /// crowding distance.
    pub selection:       ParentSelection,

    /// Crossover probability of generation 0.
    pub crossover_start:       f64,
    /// Crossover probability once the decay is over.
    pub crossover_floor:       f64,
    /// Generations over which the crossover probability falls linearly from
    /// `crossover_start` to `crossover_floor`.
    pub crossover_decay_generations: usize,
    /// Per-gene mutation probability.
    pub mutation_probability:  f64,
    /// Chance that an offspring gets a local-search improvement (memetic
    /// algorithm only).
    pub improve_probability:   f64,

    /// Sub-populations evolved separately before merging.  `0` disables the
    /// island phase.
    pub islands:                usize,
    pub generations_per_island: usize,
    /// Generation budget of the combined population.
    pub max_generations:        usize,
    pub max_running_time:       Duration,

    /// Diversity below which a stagnating population is diversified.
    pub diversity_limit:         f64,
    /// Generations without improvement before diversifying.
    pub diversify_after:         usize,
    /// Per-gene mutation probability used when diversifying.
    pub diversify_mutation:      f64,

    pub seed:        u64,
    pub initializer: InitializerKind,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size:             200,
            elite_size:                  10,
            tournament_size:             6,
            selection:                   ParentSelection::default(),
            crossover_start:             0.8,
            crossover_floor:             0.1,
            crossover_decay_generations: 30,
            mutation_probability:        0.014,
            improve_probability:         0.25,
            islands:                     0,
            generations_per_island:      90,
            max_generations:             9_999,
            max_running_time:            Duration::from_secs(4 * 60),
            diversity_limit:             0.5,
            diversify_after:             10,
            diversify_mutation:          0.25,
            seed:                        42,
            initializer:                 InitializerKind::default(),
        }
    }
}

impl GaConfig {
    /// Crossover probability for `generation`.
    pub fn crossover_probability(&self, generation: usize) -> f64 {
        if self.crossover_decay_generations == 0 || generation >= self.crossover_decay_generations {
            return self.crossover_floor;
        }
        let progress = generation as f64 / self.crossover_decay_generations as f64;
        self.crossover_start - (self.crossover_start - self.crossover_floor) * progress
    }

    pub fn validate(&self) -> OptimResult<()> {
        if self.population_size < 2 {
            return Err(OptimError::Config("population size must be at least 2".into()));
        }
        if self.elite_size >= self.population_size {
            return Err(OptimError::Config(format!(
                "elite size {} must be below the population size {}",
                self.elite_size, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(OptimError::Config("tournament size must be positive".into()));
        }
        if self.islands > 0 && self.population_size / self.islands < 2 {
            return Err(OptimError::Config(format!(
                "{} islands leave fewer than two individuals each",
                self.islands
            )));
        }
        check_probability("crossover start", self.crossover_start)?;
        check_probability("crossover floor", self.crossover_floor)?;
        check_probability("mutation", self.mutation_probability)?;
        check_probability("improve", self.improve_probability)?;
        check_probability("diversify mutation", self.diversify_mutation)
    }
}

// ── SlsConfig ─────────────────────────────────────────────────────────────────

/// Parameters of the stochastic local search.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlsConfig {
    pub max_tries:           usize,
    pub restart_probability: f64,
    /// Chance of a random forward step when not restarting.
    pub noise_probability:   f64,
    pub neighborhood:        NeighborhoodKind,
    pub max_running_time:    Duration,
    pub seed:                u64,
}

impl Default for SlsConfig {
    fn default() -> Self {
        Self {
            max_tries:           999,
            restart_probability: 0.025,
            noise_probability:   0.8,
            neighborhood:        NeighborhoodKind::default(),
            max_running_time:    Duration::from_secs(4 * 60),
            seed:                42,
        }
    }
}

impl SlsConfig {
    pub fn validate(&self) -> OptimResult<()> {
        check_probability("restart", self.restart_probability)?;
        check_probability("noise", self.noise_probability)
    }
}

fn check_probability(name: &str, p: f64) -> OptimResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(OptimError::Config(format!("{name} probability {p} is outside [0, 1]")))
    }
}
