//! Tests for ems-optim.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ems_core::{
    Allocation, BaseStation, Coordinate, HospitalId, SearchRng, ShiftType, SimTime, StationId, StationTable,
};
use ems_incident::{Incident, IncidentLog, UrgencyLevel};
use ems_spatial::{Hospital, HospitalIndex, StraightLineOracle};
use ems_sim::{SimConfig, SimulatorBuilder};

use crate::initializer::{PopulationProportionate, Random, SatisfyConstraintRandom, Uniform, UniformRandom};
use crate::neighborhood::{greedy_step, neighborhood, noise_step};
use crate::nsga::{Standing, crowding_distances, non_dominated_fronts, standings};
use crate::operators::{crossover, mutate};
use crate::{
    ConstraintStrategy, EvolutionStrategy, FitnessConfig, FitnessFunction, GaConfig, GeneticAlgorithm, Initializer,
    InitializerKind, MemeticAlgorithm, MultiObjectiveGeneticAlgorithm, NeighborhoodKind, Objectives, OptimError,
    OptimResult, Optimizer, ParentSelection, Population, Problem, SimulationFitness, SlsConfig, Solution,
    StochasticLocalSearch,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ids(raw: &[u16]) -> Vec<StationId> {
    raw.iter().map(|&s| StationId(s)).collect()
}

fn solution(day: &[u16], night: &[u16]) -> Solution {
    Solution::new(Allocation::new(ids(day), ids(night)))
}

/// `n` stations 10 km apart on an east-west line; station `i` serves
/// `1000 × (i + 1)` people.
fn stations(n: u16, capacity: u32) -> StationTable {
    let table = (0..n)
        .map(|i| BaseStation {
            id:         StationId(i),
            name:       format!("S{i}"),
            coordinate: Coordinate::from_utm(260_000 + 10_000 * i as i64, 6_650_000),
            population: 1_000 * (i as u32 + 1),
            capacity,
        })
        .collect();
    StationTable::new(table).unwrap()
}

/// L1 distance between the per-station counts of each shift and a target.
struct TargetCounts {
    target: Vec<u32>,
}

impl FitnessFunction for TargetCounts {
    fn evaluate(&self, allocation: &Allocation) -> OptimResult<f64> {
        let mut distance = 0.0;
        for shift in ShiftType::ALL {
            let counts = allocation.station_counts(shift, self.target.len());
            for (c, t) in counts.iter().zip(&self.target) {
                distance += (*c as f64 - *t as f64).abs();
            }
        }
        Ok(distance)
    }
}

fn l1(allocation: &Allocation, target: &[u32]) -> f64 {
    ShiftType::ALL
        .into_iter()
        .flat_map(|shift| allocation.station_counts(shift, target.len()).into_iter().zip(target.iter().copied()))
        .map(|(c, t)| c.abs_diff(t) as f64)
        .sum()
}

/// Two conflicting count targets; the acute objective is the L1 distance to
/// the first, the urgent one to the second.
struct TwoTargets {
    acute:  Vec<u32>,
    urgent: Vec<u32>,
}

impl FitnessFunction for TwoTargets {
    fn evaluate(&self, allocation: &Allocation) -> OptimResult<f64> {
        Ok(l1(allocation, &self.acute) + l1(allocation, &self.urgent))
    }

    fn evaluate_objectives(&self, allocation: &Allocation) -> OptimResult<(f64, Objectives)> {
        let objectives = Objectives::new(l1(allocation, &self.acute), l1(allocation, &self.urgent));
        Ok((objectives.acute + objectives.urgent, objectives))
    }
}

/// Four stations, eight ambulances per shift; acute calls want them all in
/// the west, urgent calls all in the east.
fn two_target_problem() -> Problem {
    Problem::new(
        Arc::new(stations(4, 8)),
        Arc::new(StraightLineOracle::new(10.0, 1)),
        Arc::new(TwoTargets { acute: vec![4, 4, 0, 0], urgent: vec![0, 0, 4, 4] }),
        8,
        8,
        ConstraintStrategy::None,
    )
}

fn problem_with(target: &[u32], capacity: u32, strategy: ConstraintStrategy) -> Problem {
    let n = target.len() as u16;
    let ambulances = target.iter().sum::<u32>() as usize;
    Problem::new(
        Arc::new(stations(n, capacity)),
        Arc::new(StraightLineOracle::new(10.0, 1)),
        Arc::new(TargetCounts { target: target.to_vec() }),
        ambulances,
        ambulances,
        strategy,
    )
}

/// Four stations, eight ambulances per shift, best with two at each.
fn problem() -> Problem {
    problem_with(&[2, 2, 2, 2], 8, ConstraintStrategy::None)
}

fn small_ga() -> GaConfig {
    GaConfig {
        population_size: 20,
        elite_size: 2,
        tournament_size: 3,
        max_generations: 15,
        seed: 7,
        ..GaConfig::default()
    }
}

fn non_increasing(series: &[f64]) -> bool {
    series.windows(2).all(|w| w[1] <= w[0])
}

// ── Solution ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod solution_tests {
    use super::*;

    #[test]
    fn reordering_keeps_the_cached_fitness() {
        let p = problem();
        let mut s = solution(&[0, 1, 2], &[3]);
        s.fitness(p.fitness()).unwrap();
        s.set_allocation(Allocation::new(ids(&[2, 0, 1]), ids(&[3])));
        assert!(s.is_evaluated());
        s.set_allocation(Allocation::new(ids(&[2, 2, 1]), ids(&[3])));
        assert!(!s.is_evaluated());
    }

    #[test]
    fn changing_a_gene_invalidates_the_fitness() {
        let p = problem();
        let mut s = solution(&[0, 1], &[1]);
        s.fitness(p.fitness()).unwrap();
        s.set_gene(ShiftType::Day, 0, StationId(0));
        assert!(s.is_evaluated());
        s.set_gene(ShiftType::Day, 0, StationId(3));
        assert!(!s.is_evaluated());
    }

    #[test]
    fn equality_and_hash_ignore_gene_order() {
        let a = solution(&[0, 1, 1], &[2, 3]);
        let b = solution(&[1, 0, 1], &[3, 2]);
        let c = solution(&[0, 0, 1], &[2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<Solution> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn repair_moves_surplus_to_the_closest_open_station() {
        let table = stations(3, 1);
        let oracle = StraightLineOracle::new(10.0, 1);
        let mut s = solution(&[0, 0, 2], &[1]);
        assert_eq!(s.capacity_violations(&table), 1);
        s.conform_to_constraints(&table, &oracle).unwrap();
        assert_eq!(s.allocation().day(), ids(&[0, 2, 1]).as_slice());
        assert_eq!(s.capacity_violations(&table), 0);
    }

    #[test]
    fn repair_fails_without_spare_capacity() {
        let table = stations(2, 1);
        let oracle = StraightLineOracle::new(10.0, 1);
        let mut s = solution(&[0, 0, 1], &[0]);
        let err = s.conform_to_constraints(&table, &oracle).unwrap_err();
        assert!(matches!(err, OptimError::Infeasible { shift: ShiftType::Day, .. }));
    }

    #[test]
    fn random_overloads_are_always_repaired() {
        // Twelve ambulances on six stations of capacity two: every repair
        // must end exactly at full capacity.
        let table = stations(6, 2);
        let oracle = StraightLineOracle::new(10.0, 1);
        let mut rng = SearchRng::new(11);
        for _ in 0..50 {
            let day = Random.initialize(12, &table, &mut rng);
            let night = Random.initialize(12, &table, &mut rng);
            let mut s = Solution::new(Allocation::new(day, night));
            s.conform_to_constraints(&table, &oracle).unwrap();
            assert_eq!(s.capacity_violations(&table), 0, "{:?}", s.allocation());
            for shift in ShiftType::ALL {
                assert_eq!(s.allocation().shift(shift).len(), 12);
                assert_eq!(s.allocation().station_counts(shift, 6), vec![2; 6]);
            }
        }
    }

    #[test]
    fn distance_counts_moved_ambulances() {
        let a = solution(&[0, 1], &[2]);
        let b = solution(&[1, 0], &[2]);
        let c = solution(&[0, 0], &[3]);
        assert_eq!(a.distance(&b, 4), 0);
        assert_eq!(a.distance(&c, 4), 4);
        assert_eq!(c.distance(&a, 4), 4);
    }

    #[test]
    fn changing_a_gene_clears_the_objectives() {
        let p = two_target_problem();
        let mut s = solution(&[0, 0, 0, 0, 3, 3, 3, 3], &[0; 8]);
        let objectives = s.objectives(p.fitness()).unwrap();
        assert_eq!(objectives, Objectives::new(8.0 + 8.0, 8.0 + 16.0));
        assert_eq!(s.cached_fitness(), Some(40.0));

        s.set_gene(ShiftType::Day, 0, StationId(1));
        assert_eq!(s.cached_objectives(), None);
        assert!(!s.is_evaluated());
    }

    #[test]
    fn plain_fitness_functions_have_no_objectives() {
        let p = problem();
        let mut s = solution(&[0, 1, 2, 3, 0, 1, 2, 3], &[0, 1, 2, 3, 0, 1, 2, 3]);
        assert!(matches!(s.objectives(p.fitness()), Err(OptimError::Config(_))));
    }
}

// ── Initializers ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod initializer_tests {
    use super::*;

    #[test]
    fn uniform_spreads_evenly() {
        let table = stations(5, 10);
        let genes = Uniform.initialize(10, &table, &mut SearchRng::new(1));
        let counts = Allocation::new(genes, Vec::new()).station_counts(ShiftType::Day, 5);
        assert_eq!(counts, vec![2; 5]);
    }

    #[test]
    fn uniform_random_counts_differ_by_at_most_one() {
        let table = stations(4, 10);
        let genes = UniformRandom.initialize(11, &table, &mut SearchRng::new(3));
        assert_eq!(genes.len(), 11);
        let counts = Allocation::new(genes, Vec::new()).station_counts(ShiftType::Day, 4);
        let (min, max) = (counts.iter().min().unwrap(), counts.iter().max().unwrap());
        assert!(max - min <= 1, "{counts:?}");
    }

    #[test]
    fn random_draws_known_stations() {
        let table = stations(6, 10);
        let genes = Random.initialize(50, &table, &mut SearchRng::new(5));
        assert_eq!(genes.len(), 50);
        assert!(genes.iter().all(|g| g.index() < 6));
    }

    #[test]
    fn population_proportionate_has_the_requested_length() {
        let table = stations(4, 10);
        for count in 0..30 {
            let genes = PopulationProportionate.initialize(count, &table, &mut SearchRng::new(0));
            assert_eq!(genes.len(), count);
        }
    }

    #[test]
    fn population_proportionate_favours_larger_catchments() {
        // Weights 0.1, 0.2, 0.3, 0.4.
        let table = stations(4, 10);
        let genes = PopulationProportionate.initialize(10, &table, &mut SearchRng::new(0));
        let counts = Allocation::new(genes, Vec::new()).station_counts(ShiftType::Day, 4);
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }

    #[test]
    fn satisfy_constraint_random_respects_capacity() {
        let table = stations(4, 2);
        for seed in 0..10 {
            let genes = SatisfyConstraintRandom.initialize(8, &table, &mut SearchRng::new(seed));
            let counts = Allocation::new(genes, Vec::new()).station_counts(ShiftType::Day, 4);
            assert_eq!(counts, vec![2; 4]);
        }
    }

    #[test]
    fn every_kind_fills_both_shifts() {
        let p = problem_with(&[3, 2, 1], 10, ConstraintStrategy::None);
        let kinds = [
            InitializerKind::Random,
            InitializerKind::Uniform,
            InitializerKind::UniformRandom,
            InitializerKind::PopulationProportionate,
            InitializerKind::SatisfyConstraintRandom,
            InitializerKind::Mix,
        ];
        let mut rng = SearchRng::new(9);
        for kind in kinds {
            let allocation = p.generate(kind.initializer(), &mut rng);
            assert_eq!(allocation.day().len(), 6, "{kind:?}");
            assert_eq!(allocation.night().len(), 6, "{kind:?}");
        }
    }
}

// ── Operators ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod operator_tests {
    use super::*;

    #[test]
    fn crossover_takes_each_position_from_a_parent() {
        let a = solution(&[0, 0, 0, 0, 0], &[1, 1, 1]);
        let b = solution(&[3, 3, 3, 3, 3], &[2, 2, 2]);
        let mut rng = SearchRng::new(11);
        for _ in 0..20 {
            let (x, y) = crossover(&a, &b, 1.0, &mut rng);
            for shift in ShiftType::ALL {
                let (pa, pb) = (a.allocation().shift(shift), b.allocation().shift(shift));
                let (cx, cy) = (x.allocation().shift(shift), y.allocation().shift(shift));
                assert_eq!(cx.len(), pa.len());
                assert_eq!(cy.len(), pb.len());
                // One cut: x starts like a, y like b, and they are swapped everywhere.
                assert_eq!(cx[0], pa[0]);
                assert_eq!(cy[0], pb[0]);
                for i in 0..cx.len() {
                    assert!((cx[i] == pa[i] && cy[i] == pb[i]) || (cx[i] == pb[i] && cy[i] == pa[i]));
                }
                assert_ne!(cx, pa, "the tail is always swapped");
            }
        }
    }

    #[test]
    fn crossover_skipped_keeps_the_parents() {
        let p = problem();
        let mut a = solution(&[0, 1], &[2]);
        a.fitness(p.fitness()).unwrap();
        let b = solution(&[3, 3], &[3]);
        let (x, y) = crossover(&a, &b, 0.0, &mut SearchRng::new(1));
        assert_eq!(x, a);
        assert_eq!(y, b);
        assert!(x.is_evaluated());
    }

    #[test]
    fn single_gene_shifts_are_copied() {
        let a = solution(&[0], &[1]);
        let b = solution(&[2], &[3]);
        let (x, y) = crossover(&a, &b, 1.0, &mut SearchRng::new(2));
        assert_eq!(x, a);
        assert_eq!(y, b);
    }

    #[test]
    fn mutation_probability_bounds() {
        let original = solution(&[0, 1, 2, 3], &[3, 2]);
        let mut rng = SearchRng::new(4);

        let mut untouched = original.clone();
        mutate(&mut untouched, 0.0, 4, &mut rng);
        assert_eq!(untouched.allocation().day(), original.allocation().day());

        let mut mutated = original.clone();
        mutate(&mut mutated, 1.0, 4, &mut rng);
        assert_eq!(mutated.allocation().gene_count(), original.allocation().gene_count());
        assert!(mutated.allocation().day().iter().all(|g| g.index() < 4));
    }

    #[test]
    fn crossover_probability_decays_linearly() {
        let config = GaConfig::default();
        assert!((config.crossover_probability(0) - 0.8).abs() < 1e-12);
        assert!((config.crossover_probability(15) - 0.45).abs() < 1e-12);
        assert!((config.crossover_probability(30) - 0.1).abs() < 1e-12);
        assert!((config.crossover_probability(500) - 0.1).abs() < 1e-12);
    }
}

// ── Neighborhoods ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod neighborhood_tests {
    use super::*;

    #[test]
    fn neighborhood_sizes() {
        let s = solution(&[0, 1, 2], &[3, 3]);
        assert_eq!(neighborhood(&s, NeighborhoodKind::Forward, 4).len(), 5);
        assert_eq!(neighborhood(&s, NeighborhoodKind::Hamming, 4).len(), 15);
        assert!(!neighborhood(&s, NeighborhoodKind::Hamming, 4).contains(&s));
    }

    #[test]
    fn forward_wraps_to_the_first_station() {
        let s = solution(&[3], &[]);
        let neighbors = neighborhood(&s, NeighborhoodKind::Forward, 4);
        assert_eq!(neighbors[0].allocation().day(), ids(&[0]).as_slice());
    }

    #[test]
    fn greedy_steps_never_worsen() {
        let p = problem();
        let mut current = solution(&[0, 0, 0, 0, 0, 0, 0, 0], &[1, 1, 1, 1, 2, 2, 3, 3]);
        let mut last = current.fitness(p.fitness()).unwrap();
        for _ in 0..10 {
            greedy_step(&mut current, NeighborhoodKind::Hamming, &p).unwrap();
            let now = current.fitness(p.fitness()).unwrap();
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn noise_changes_one_gene() {
        let original = solution(&[0, 1, 2], &[3]);
        let mut rng = SearchRng::new(8);
        for _ in 0..10 {
            let mut s = original.clone();
            noise_step(&mut s, 4, &mut rng);
            let changed: usize = ShiftType::ALL
                .into_iter()
                .map(|shift| {
                    let (a, b) = (s.allocation().shift(shift), original.allocation().shift(shift));
                    a.iter().zip(b).filter(|(x, y)| x != y).count()
                })
                .sum();
            assert_eq!(changed, 1);
        }
    }
}

// ── Population ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod population_tests {
    use super::*;

    fn evaluated(p: &Problem, raw: &[&[u16]]) -> Population {
        let mut population = Population::new(raw.iter().map(|day| solution(day, day)).collect());
        population.evaluate(p.fitness()).unwrap();
        population
    }

    #[test]
    fn diversity_spans_zero_to_one() {
        let same = Population::new(vec![solution(&[1, 1], &[1, 1]); 5]);
        assert_eq!(same.diversity(4), 0.0);

        let even = Population::new(vec![solution(&[0, 1, 2, 3], &[3, 2, 1, 0])]);
        assert!((even.diversity(4) - 1.0).abs() < 1e-9);

        let p = problem();
        let random = Population::generate(30, &p, &Random, &mut SearchRng::new(2)).unwrap();
        let d = random.diversity(4);
        assert!((0.0..=1.0).contains(&d));
    }

    #[test]
    fn ranking_puts_unevaluated_last() {
        let p = problem();
        let mut population = evaluated(&p, &[&[0, 0, 0, 0, 0, 0, 0, 0], &[0, 0, 1, 1, 2, 2, 3, 3]]);
        population.merge(Population::new(vec![solution(&[1], &[1])]));
        population.sort();
        assert_eq!(population.individuals()[0].cached_fitness(), Some(0.0));
        assert!(!population.individuals()[2].is_evaluated());
        assert_eq!(population.best_fitness(), Some(0.0));
        assert_eq!(population.average_fitness(), Some(12.0));
    }

    #[test]
    fn reduce_keeps_the_fittest() {
        let p = problem();
        let mut population = evaluated(
            &p,
            &[&[0, 0, 0, 0, 0, 0, 0, 0], &[0, 0, 1, 1, 2, 2, 3, 3], &[0, 0, 0, 1, 2, 2, 3, 3]],
        );
        population.reduce(2);
        assert_eq!(population.len(), 2);
        assert_eq!(population.elite(1)[0].cached_fitness(), Some(0.0));
        assert_eq!(population.individuals()[1].cached_fitness(), Some(4.0));
    }

    #[test]
    fn full_tournament_picks_the_two_fittest() {
        let p = problem();
        let population = evaluated(
            &p,
            &[&[0, 0, 0, 0, 0, 0, 0, 0], &[0, 0, 1, 1, 2, 2, 3, 3], &[0, 0, 0, 1, 2, 2, 3, 3]],
        );
        let (a, b) = population.select_parents(3, &mut SearchRng::new(1)).unwrap();
        assert_eq!(a.cached_fitness(), Some(0.0));
        assert_eq!(b.cached_fitness(), Some(4.0));
        assert!(Population::default().select_parents(3, &mut SearchRng::new(1)).is_err());
    }

    /// Two identical crowded individuals and a distant one with the given
    /// fitness.
    fn crowd_and_outlier(outlier_fitness: f64) -> Population {
        let mut crowd = solution(&[0, 0], &[0]);
        crowd.adopt_fitness(1.0);
        let mut outlier = solution(&[3, 3], &[3]);
        outlier.adopt_fitness(outlier_fitness);
        Population::new(vec![crowd.clone(), crowd, outlier])
    }

    #[test]
    fn novelty_is_the_mean_distance() {
        let population = crowd_and_outlier(1.0);
        let crowd = &population.individuals()[0];
        let outlier = &population.individuals()[2];
        assert!((population.novelty(crowd, 4) - 2.0).abs() < 1e-12);
        assert!((population.novelty(outlier, 4) - 4.0).abs() < 1e-12);
        assert_eq!(Population::default().novelty(crowd, 4), 0.0);
    }

    #[test]
    fn novelty_decides_near_ties() {
        let population = crowd_and_outlier(1.0002);
        let (a, b) = population.select_diverse_parents(3, 4, &mut SearchRng::new(5)).unwrap();
        assert_eq!(a.allocation().day(), ids(&[3, 3]).as_slice());
        assert_eq!(b.allocation().day(), ids(&[0, 0]).as_slice());
    }

    #[test]
    fn clear_fitness_gap_beats_novelty() {
        let population = crowd_and_outlier(1.01);
        let (a, b) = population.select_diverse_parents(3, 4, &mut SearchRng::new(5)).unwrap();
        assert_eq!(a.cached_fitness(), Some(1.0));
        assert_eq!(b.cached_fitness(), Some(1.0));
        assert!(Population::default().select_diverse_parents(3, 4, &mut SearchRng::new(5)).is_err());
    }

    #[test]
    fn add_repairs_under_the_repair_strategy() {
        let p = problem_with(&[1, 1, 1], 1, ConstraintStrategy::Repair);
        let mut population = Population::default();
        population.add(solution(&[0, 0, 0], &[2, 2, 1]), &p).unwrap();
        assert_eq!(population.individuals()[0].capacity_violations(p.stations()), 0);

        let generated = Population::generate(10, &p, &Random, &mut SearchRng::new(4)).unwrap();
        assert!(generated.iter().all(|s| s.capacity_violations(p.stations()) == 0));
    }
}

// ── Genetic and memetic algorithms ────────────────────────────────────────────

#[cfg(test)]
mod ga_tests {
    use super::*;

    #[test]
    fn elitism_never_loses_the_best() {
        let mut ga = GeneticAlgorithm::new(problem(), small_ga()).unwrap();
        ga.optimize().unwrap();
        let stats = ga.run_statistics();
        assert_eq!(stats.generations(), 16);
        assert_eq!(stats.diversity.len(), 16);
        assert!(non_increasing(&stats.best), "{:?}", stats.best);
        let best = ga.optimal_solution().unwrap().cached_fitness().unwrap();
        assert!(best <= stats.best[0]);
        assert_eq!(ga.population().len(), 20);
        assert_eq!(ga.abbreviation(), "GA");
    }

    #[test]
    fn statistics_end_with_the_returned_population() {
        let mut ga = GeneticAlgorithm::new(problem(), small_ga()).unwrap();
        ga.optimize().unwrap();
        let stats = ga.run_statistics();
        let population = ga.population();
        assert_eq!(stats.best.last().copied(), population.best_fitness());
        assert_eq!(stats.average.last().copied(), population.average_fitness());
        assert_eq!(stats.diversity.last().copied(), Some(population.diversity(4)));
    }

    #[test]
    fn novelty_selection_keeps_the_elite() {
        let config = GaConfig { selection: ParentSelection::Novelty, ..small_ga() };
        let mut ga = GeneticAlgorithm::new(problem(), config).unwrap();
        ga.optimize().unwrap();
        let stats = ga.run_statistics();
        assert_eq!(stats.generations(), 16);
        assert!(non_increasing(&stats.best), "{:?}", stats.best);
        assert_eq!(ga.population().len(), 20);
    }

    #[test]
    fn island_phase_feeds_the_main_population() {
        let config = GaConfig { islands: 2, generations_per_island: 3, max_generations: 3, ..small_ga() };
        let mut ga = GeneticAlgorithm::new(problem(), config).unwrap();
        ga.optimize().unwrap();
        assert_eq!(ga.run_statistics().generations(), 4);
        assert_eq!(ga.population().len(), 20);
    }

    #[test]
    fn zero_time_budget_still_yields_a_solution() {
        let config = GaConfig { max_running_time: Duration::ZERO, ..small_ga() };
        let mut ga = GeneticAlgorithm::new(problem(), config).unwrap();
        ga.optimize().unwrap();
        assert_eq!(ga.run_statistics().generations(), 1);
        assert!(ga.optimal_solution().is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GaConfig { elite_size: 20, ..small_ga() };
        assert!(matches!(GeneticAlgorithm::new(problem(), config), Err(OptimError::Config(_))));
    }

    #[test]
    fn improvement_strategies() {
        let p = problem();
        let start = solution(&[0, 0, 0, 0, 0, 0, 0, 0], &[0, 0, 1, 1, 2, 2, 3, 3]);

        let mut darwinian = start.clone();
        EvolutionStrategy::Darwinian.improve(&mut darwinian, NeighborhoodKind::Hamming, &p).unwrap();
        assert!(!darwinian.is_evaluated());

        let mut baldwinian = start.clone();
        EvolutionStrategy::Baldwinian.improve(&mut baldwinian, NeighborhoodKind::Hamming, &p).unwrap();
        assert_eq!(baldwinian.allocation().day(), start.allocation().day());
        assert_eq!(baldwinian.cached_fitness(), Some(10.0));

        let mut lamarckian = start.clone();
        EvolutionStrategy::Lamarckian.improve(&mut lamarckian, NeighborhoodKind::Hamming, &p).unwrap();
        assert_ne!(lamarckian, start);
        assert_eq!(lamarckian.cached_fitness(), Some(10.0));
        assert_eq!(p.fitness().evaluate(lamarckian.allocation()).unwrap(), 10.0);
    }

    #[test]
    fn memetic_run_improves_on_its_first_generation() {
        let config = GaConfig { max_generations: 5, improve_probability: 0.5, ..small_ga() };
        let mut ma =
            MemeticAlgorithm::new(problem(), config, EvolutionStrategy::Lamarckian, NeighborhoodKind::Forward).unwrap();
        ma.optimize().unwrap();
        let stats = ma.run_statistics();
        assert_eq!(stats.generations(), 6);
        assert!(non_increasing(&stats.best));
        assert_eq!(ma.abbreviation(), "MA");
        assert_eq!(ma.population().len(), 20);
    }
}

// ── Multi-objective genetic algorithm ─────────────────────────────────────────

#[cfg(test)]
mod nsga_tests {
    use super::*;

    fn objectives(raw: &[(f64, f64)]) -> Vec<Objectives> {
        raw.iter().map(|&(a, u)| Objectives::new(a, u)).collect()
    }

    #[test]
    fn dominance_needs_one_strict_improvement() {
        let a = Objectives::new(1.0, 2.0);
        assert!(a.dominates(&Objectives::new(1.0, 3.0)));
        assert!(a.dominates(&Objectives::new(2.0, 3.0)));
        assert!(!a.dominates(&a));
        assert!(!a.dominates(&Objectives::new(0.0, 5.0)));
        assert!(!Objectives::new(0.0, 5.0).dominates(&a));
    }

    #[test]
    fn fronts_peel_off_in_order() {
        let points = objectives(&[(1.0, 5.0), (2.0, 2.0), (5.0, 1.0), (3.0, 3.0), (4.0, 4.0), (6.0, 6.0)]);
        assert_eq!(non_dominated_fronts(&points), vec![vec![0, 1, 2], vec![3], vec![4], vec![5]]);
        assert!(non_dominated_fronts(&[]).is_empty());
    }

    #[test]
    fn crowding_favours_the_ends_and_sparse_regions() {
        let points = objectives(&[(0.0, 10.0), (1.0, 9.0), (2.0, 8.0), (8.0, 2.0), (10.0, 0.0)]);
        let distance = crowding_distances(&points, &[0, 1, 2, 3, 4]);
        assert!(distance[0].is_infinite() && distance[4].is_infinite());
        assert!((distance[1] - 0.4).abs() < 1e-12, "{distance:?}");
        assert!((distance[2] - 1.4).abs() < 1e-12, "{distance:?}");
        assert!((distance[3] - 1.6).abs() < 1e-12, "{distance:?}");

        let pair = crowding_distances(&points, &[1, 3]);
        assert!(pair.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn identical_points_share_a_front() {
        let points = objectives(&[(3.0, 3.0), (3.0, 3.0), (3.0, 3.0), (4.0, 4.0)]);
        let placed = standings(&points);
        assert!(placed[..3].iter().all(|s| s.front == 0));
        assert!(placed[..3].iter().all(|s| !s.crowding.is_nan()));
        assert_eq!(placed[3].front, 1);
    }

    #[test]
    fn standing_prefers_lower_front_then_crowding() {
        use std::cmp::Ordering;
        let near = Standing { front: 0, crowding: 0.5 };
        let far = Standing { front: 0, crowding: f64::INFINITY };
        let behind = Standing { front: 1, crowding: f64::INFINITY };
        assert_eq!(far.preference(&near), Ordering::Less);
        assert_eq!(near.preference(&behind), Ordering::Less);
        assert_eq!(near.preference(&near), Ordering::Equal);
    }

    #[test]
    fn run_reports_a_non_dominated_solution() {
        let mut moga = MultiObjectiveGeneticAlgorithm::new(two_target_problem(), small_ga()).unwrap();
        moga.optimize().unwrap();
        assert_eq!(moga.abbreviation(), "MOGA");
        assert_eq!(moga.run_statistics().generations(), 16);
        assert_eq!(moga.population().len(), 20);

        let population: Vec<Objectives> = moga.population().iter().filter_map(Solution::cached_objectives).collect();
        assert_eq!(population.len(), 20);
        let front: Vec<&Solution> = moga.pareto_front().collect();
        assert!(!front.is_empty());
        for member in &front {
            let own = member.cached_objectives().unwrap();
            assert!(population.iter().all(|other| !other.dominates(&own)));
        }

        let best = moga.optimal_solution().unwrap();
        let best_fitness = best.cached_fitness().unwrap();
        assert!(front.iter().all(|s| s.cached_fitness().unwrap() >= best_fitness));
        assert_eq!(moga.run_statistics().best.last().copied(), Some(best_fitness));
    }

    #[test]
    fn run_needs_objectives() {
        let mut moga = MultiObjectiveGeneticAlgorithm::new(problem(), small_ga()).unwrap();
        assert!(matches!(moga.optimize(), Err(OptimError::Config(_))));
    }

    #[test]
    fn zero_time_budget_reports_the_first_front() {
        let config = GaConfig { max_running_time: Duration::ZERO, ..small_ga() };
        let mut moga = MultiObjectiveGeneticAlgorithm::new(two_target_problem(), config).unwrap();
        moga.optimize().unwrap();
        assert_eq!(moga.run_statistics().generations(), 1);
        assert!(moga.optimal_solution().is_some());
    }
}

// ── Stochastic local search ───────────────────────────────────────────────────

#[cfg(test)]
mod sls_tests {
    use super::*;

    #[test]
    fn pure_greedy_search_reaches_the_optimum() {
        let config = SlsConfig {
            max_tries: 20,
            restart_probability: 0.0,
            noise_probability: 0.0,
            neighborhood: NeighborhoodKind::Hamming,
            ..SlsConfig::default()
        };
        let mut sls = StochasticLocalSearch::new(problem(), config).unwrap();
        sls.optimize().unwrap();
        assert_eq!(sls.optimal_solution().unwrap().cached_fitness(), Some(0.0));
        assert_eq!(sls.abbreviation(), "SLS");
    }

    #[test]
    fn best_tracks_every_visited_solution() {
        let config = SlsConfig { max_tries: 60, seed: 3, ..SlsConfig::default() };
        let mut sls = StochasticLocalSearch::new(problem(), config).unwrap();
        sls.optimize().unwrap();
        let stats = sls.run_statistics();
        assert_eq!(stats.generations(), 60);
        assert!(stats.diversity.is_empty());
        assert!(non_increasing(&stats.best));
        for (best, current) in stats.best.iter().zip(&stats.average) {
            assert!(best <= current);
        }
        assert_eq!(sls.optimal_solution().unwrap().cached_fitness(), stats.best.last().copied());
    }

    #[test]
    fn invalid_probability_is_rejected() {
        let config = SlsConfig { noise_probability: 1.5, ..SlsConfig::default() };
        assert!(StochasticLocalSearch::new(problem(), config).is_err());
    }
}

// ── Simulation fitness ────────────────────────────────────────────────────────

#[cfg(test)]
mod fitness_tests {
    use super::*;

    fn at(h: u32) -> SimTime {
        SimTime::from_ymd_hms(2017, 8, 7, h, 0, 0).unwrap()
    }

    fn simulator(incidents: Vec<Incident>) -> Arc<ems_sim::Simulator> {
        let hospital = Hospital {
            id:         HospitalId(0),
            name:       "H".into(),
            coordinate: Coordinate::from_utm(265_000, 6_650_000),
        };
        let simulator = SimulatorBuilder::new(IncidentLog::new(incidents), Arc::new(StraightLineOracle::new(10.0, 1)))
            .stations(stations(2, 1))
            .hospitals(HospitalIndex::new(vec![hospital]))
            .build()
            .unwrap();
        Arc::new(simulator)
    }

    fn acute_call(call: SimTime) -> Incident {
        Incident {
            call_received:             call,
            location:                  Coordinate::from_utm(262_000, 6_650_000),
            urgency:                   UrgencyLevel::Acute,
            dispatched:                call,
            arrival_at_scene:          Some(call.plus_secs(600)),
            departure_from_scene:      None,
            arrival_at_hospital:       None,
            available_non_transport:   call.plus_secs(1_800),
            available_transport:       call.plus_secs(1_800),
            non_transporting_vehicles: 1,
            transporting_vehicles:     0,
        }
    }

    fn sim_config() -> SimConfig {
        SimConfig {
            start: at(9),
            end: at(11),
            buffer_secs: 0,
            ambulances_day: 2,
            ambulances_night: 2,
            ..SimConfig::default()
        }
    }

    #[test]
    fn penalty_adds_per_violation() {
        let sim = simulator(vec![acute_call(at(10))]);
        let crowded = Allocation::new(ids(&[0, 0]), ids(&[0, 0]));
        assert_eq!(crowded.capacity_violations(sim.stations()), 2);

        let fitness = |strategy| {
            let config = FitnessConfig { use_urgency_fitness: false, constraint_strategy: strategy };
            SimulationFitness::new(Arc::clone(&sim), sim_config(), config).unwrap().evaluate(&crowded).unwrap()
        };
        let plain = fitness(ConstraintStrategy::None);
        let penalized = fitness(ConstraintStrategy::Penalty);
        assert!(plain > 0.0);
        assert!((penalized - plain - 20.0).abs() < 1e-9);
    }

    #[test]
    fn urgency_fitness_lies_in_the_unit_interval() {
        let sim = simulator(vec![acute_call(at(10))]);
        let fitness = SimulationFitness::new(sim, sim_config(), FitnessConfig::default()).unwrap();
        let value = fitness.evaluate(&Allocation::new(ids(&[0, 1]), ids(&[0, 1]))).unwrap();
        assert!((0.0..1.0).contains(&value), "{value}");
    }

    #[test]
    fn no_calls_means_no_fitness() {
        let fitness = SimulationFitness::new(simulator(Vec::new()), sim_config(), FitnessConfig::default()).unwrap();
        let err = fitness.evaluate(&Allocation::new(ids(&[0, 1]), ids(&[0, 1]))).unwrap_err();
        assert!(matches!(err, OptimError::NoResponses));
    }

    #[test]
    fn unknown_station_is_reported_with_its_allocation() {
        let fitness = SimulationFitness::new(simulator(vec![acute_call(at(10))]), sim_config(), FitnessConfig::default())
            .unwrap();
        let err = fitness.evaluate(&Allocation::new(ids(&[0, 7]), ids(&[0, 1]))).unwrap_err();
        assert!(matches!(err, OptimError::Simulation { .. }));
    }

    #[test]
    fn objectives_split_responses_by_urgency() {
        // The acute call takes S0, 2 km away; the urgent one a quarter of an
        // hour later gets S1, 5 km away.
        let urgent = Incident {
            urgency: UrgencyLevel::Urgent,
            location: Coordinate::from_utm(265_000, 6_650_000),
            ..acute_call(at(10).plus_secs(900))
        };
        let sim = simulator(vec![acute_call(at(10)), urgent]);
        let config = FitnessConfig { use_urgency_fitness: false, ..FitnessConfig::default() };
        let fitness = SimulationFitness::new(sim, sim_config(), config).unwrap();
        let allocation = Allocation::new(ids(&[0, 1]), ids(&[0, 1]));

        let (value, objectives) = fitness.evaluate_objectives(&allocation).unwrap();
        assert!(objectives.urgent > objectives.acute, "{objectives:?}");
        assert!((value - (objectives.acute + objectives.urgent) / 2.0).abs() < 1e-9);
        assert_eq!(value, fitness.evaluate(&allocation).unwrap());
    }

    #[test]
    fn objectives_need_both_urgencies() {
        let fitness = SimulationFitness::new(simulator(vec![acute_call(at(10))]), sim_config(), FitnessConfig::default())
            .unwrap();
        let err = fitness.evaluate_objectives(&Allocation::new(ids(&[0, 1]), ids(&[0, 1]))).unwrap_err();
        assert!(matches!(err, OptimError::NoResponses));
    }

    #[test]
    fn problem_takes_shift_sizes_from_the_simulation() {
        let sim = simulator(vec![acute_call(at(10))]);
        let p = Problem::from_simulation(sim, sim_config(), FitnessConfig::default()).unwrap();
        assert_eq!(p.ambulances(ShiftType::Day), 2);
        assert_eq!(p.station_count(), 2);

        let config = SlsConfig { max_tries: 5, ..SlsConfig::default() };
        let mut sls = StochasticLocalSearch::new(p, config).unwrap();
        sls.optimize().unwrap();
        assert!(sls.optimal_solution().is_some());
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(GaConfig::default().validate().is_ok());
        assert!(SlsConfig::default().validate().is_ok());
    }

    #[test]
    fn ga_config_errors() {
        let bad = [
            GaConfig { population_size: 1, elite_size: 0, ..GaConfig::default() },
            GaConfig { tournament_size: 0, ..GaConfig::default() },
            GaConfig { mutation_probability: -0.1, ..GaConfig::default() },
            GaConfig { islands: 150, ..GaConfig::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(OptimError::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn penalty_factor_follows_the_objective() {
        let urgency = FitnessConfig::default();
        let response = FitnessConfig { use_urgency_fitness: false, ..FitnessConfig::default() };
        assert_eq!(urgency.penalty_factor(), 0.01);
        assert_eq!(response.penalty_factor(), 10.0);
    }
}
