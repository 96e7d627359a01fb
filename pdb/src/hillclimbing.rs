//! Hill-climbing pattern collection generator (Haslum et al.): repeatedly
//! samples states, evaluates which locally grown candidate pattern improves
//! the canonical heuristic on the most samples, and adopts the best one
//! until no candidate clears the configured improvement threshold.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use thiserror::Error;

use crate::additive::AdditiveSubset;
use crate::errors::{ConfigError, PdbError};
use crate::incremental::IncrementalCanonicalPdbs;
use crate::pattern::Pattern;
use crate::pdb::Pdb;
use crate::sampler::{self, Countdown, DeadEndPredicate};
use crate::task::{State, Task};
#[cfg(test)]
use crate::task::VarId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HillClimbingConfig {
    pub pdb_max_size: usize,
    pub collection_max_size: usize,
    pub num_samples: u32,
    pub min_improvement: u32,
    pub max_time: Option<Duration>,
    pub dominance_pruning: bool,
}

impl Default for HillClimbingConfig {
    fn default() -> Self {
        HillClimbingConfig {
            pdb_max_size: 2_000_000,
            collection_max_size: 20_000_000,
            num_samples: 1000,
            min_improvement: 10,
            max_time: None,
            dominance_pruning: true,
        }
    }
}

impl HillClimbingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pdb_max_size == 0 {
            return Err(ConfigError::ZeroPdbMaxSize);
        }
        if self.collection_max_size == 0 {
            return Err(ConfigError::ZeroCollectionMaxSize);
        }
        if self.min_improvement > self.num_samples {
            return Err(ConfigError::MinImprovementExceedsSamples {
                min_improvement: self.min_improvement,
                num_samples: self.num_samples,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum HillClimbingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pdb(#[from] PdbError),
}

/// Final output of a generator run: the task it ran against, the resulting
/// pattern collection, the PDBs built for it, and the (dominance-pruned)
/// max-additive-subsets family.
pub struct PatternCollectionInformation<'t> {
    pub task: &'t dyn Task,
    pub patterns: Vec<Pattern>,
    pub pdbs: Vec<Pdb>,
    pub max_additive_subsets: Vec<AdditiveSubset>,
}

struct DeadlineCountdown {
    deadline: Option<Instant>,
}

impl Countdown for DeadlineCountdown {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

struct CollectionDeadEnds<'a, 't> {
    collection: &'a IncrementalCanonicalPdbs<'t>,
}

impl DeadEndPredicate for CollectionDeadEnds<'_, '_> {
    fn is_dead_end(&self, state: &State) -> bool {
        self.collection.is_dead_end(state)
    }
}

/// Candidates grown from a single pattern by adding one causally-preceding
/// variable per effect variable, skipping growths that would exceed the
/// per-pattern size budget. Effect-to-effect arcs are deliberately ignored.
fn candidates_from(task: &dyn Task, pattern: &Pattern, pdb_max_size: usize, num_rejected: &mut u64) -> Vec<Pattern> {
    let mut out = BTreeSet::new();
    for &v in pattern.vars() {
        for &pre in task.causal_graph().eff_to_pre(v) {
            if pattern.contains(pre) {
                continue;
            }
            let grown_size = pattern.size(task).unwrap_or(usize::MAX).saturating_mul(task.domain_size(pre) as usize);
            if grown_size > pdb_max_size {
                *num_rejected += 1;
                continue;
            }
            out.insert(pattern.union(&Pattern::singleton(pre)));
        }
    }
    out.into_iter().collect()
}

/// `improves(p, s)`: true iff adding `p`'s PDB to the collection would
/// strictly raise the canonical heuristic at `s`, given `p`'s max-additive
/// subsets `candidate_subsets` (restricted to PDBs additive with `p`).
fn improves(p: &Pdb, candidate_subsets: &[AdditiveSubset], collection: &IncrementalCanonicalPdbs, state: &State) -> bool {
    let p_value = p.get_value(state);
    if p_value.is_infinite() {
        return true;
    }
    let h = collection.get_value(state);
    if h.is_infinite() {
        return false;
    }
    for subset in candidate_subsets {
        let h_sigma = crate::canonical::subset_value(collection.pdbs(), subset, state);
        if h_sigma.is_infinite() {
            continue;
        }
        if (p_value + h_sigma) > h {
            return true;
        }
    }
    false
}

/// Runs hill climbing to completion (or until its timer/termination
/// conditions trigger) and returns the resulting collection.
pub fn generate<'t>(task: &'t dyn Task, config: &HillClimbingConfig, rng: &mut SmallRng) -> Result<PatternCollectionInformation<'t>, HillClimbingError> {
    config.validate()?;
    let span = tracing::span!(tracing::Level::DEBUG, "hill_climbing");
    let _enter = span.enter();

    let mut collection = IncrementalCanonicalPdbs::new(task, config.pdb_max_size, config.dominance_pruning)?;

    let deadline = config.max_time.map(|d| Instant::now() + d);
    if config.max_time == Some(Duration::ZERO) {
        tracing::info!("max_time is zero, skipping hill climbing entirely");
        return Ok(finish(task, collection));
    }
    let countdown = DeadlineCountdown { deadline };

    let started = Instant::now();
    let mut generated: BTreeSet<Pattern> = collection.patterns().iter().cloned().collect();
    let mut frontier: Vec<Pattern> = collection.patterns().to_vec();
    // The candidate pool `V`: persists and accumulates across iterations.
    // A slot becomes `None` once its pattern is adopted or found to no
    // longer fit `collection_max_size`; it is never repopulated.
    let mut candidate_pool: Vec<Option<(Pattern, Pdb)>> = Vec::new();
    let mut num_rejected: u64 = 0;
    let mut iteration = 0u64;

    loop {
        if countdown.expired() {
            tracing::info!("time limit reached, stopping hill climbing");
            break;
        }

        if collection.is_dead_end(task.initial_state()) {
            tracing::info!("initial state has infinite heuristic value, stopping hill climbing");
            break;
        }

        for pattern in &frontier {
            for candidate in candidates_from(task, pattern, config.pdb_max_size, &mut num_rejected) {
                if generated.insert(candidate.clone()) {
                    match Pdb::build(task, candidate.clone(), config.pdb_max_size) {
                        Ok(pdb) => candidate_pool.push(Some((candidate, pdb))),
                        Err(_) => {
                            num_rejected += 1;
                        }
                    }
                }
            }
        }

        let h0 = collection.get_value(task.initial_state());
        tracing::debug!(
            iteration,
            collection_size = collection.get_size(),
            initial_h = %h0,
            "hill climbing iteration"
        );

        let avg_cost = average_operator_cost(task);
        let dead_ends = CollectionDeadEnds { collection: &collection };
        let samples = match sampler::sample_states(
            task,
            config.num_samples as usize,
            h0.value().unwrap_or(0),
            avg_cost,
            &dead_ends,
            &countdown,
            rng,
        ) {
            crate::errors::SamplingOutcome::Completed(s) => s,
            crate::errors::SamplingOutcome::Timeout(s) => {
                tracing::info!("sampling timed out, stopping hill climbing");
                for (pattern, pdb) in candidate_pool.iter().flatten() {
                    tracing::debug!(pattern = %pattern, size = pdb.size(), "candidate discarded on timeout");
                }
                let _ = s;
                break;
            }
        };

        let mut best: Option<(usize, u32)> = None;
        let mut expired_mid_evaluation = false;
        for (index, slot) in candidate_pool.iter_mut().enumerate() {
            if countdown.expired() {
                expired_mid_evaluation = true;
                break;
            }
            let Some((pattern, pdb)) = slot else { continue };
            if collection.get_size() + pdb.size() > config.collection_max_size {
                tracing::debug!(pattern = %pattern, "candidate discarded, would exceed collection_max_size");
                *slot = None;
                continue;
            }
            let candidate_subsets = collection.max_additive_subsets_for_candidate(pattern);
            let count = samples.iter().filter(|s| improves(pdb, &candidate_subsets, &collection, s)).count() as u32;
            let is_better = match best {
                Some((_, best_count)) => count > best_count,
                None => true,
            };
            if is_better {
                best = Some((index, count));
            }
        }

        if expired_mid_evaluation {
            tracing::info!("time limit reached while evaluating candidates, stopping hill climbing");
            break;
        }

        iteration += 1;
        match best {
            Some((index, count)) if count >= config.min_improvement => {
                let (pattern, _pdb) = candidate_pool[index].take().expect("best index refers to a live slot");
                tracing::debug!(iteration, pattern = %pattern, improvement = count, "adopting pattern");
                collection.add_pattern(pattern.clone(), config.pdb_max_size)?;
                frontier = vec![pattern];
            }
            _ => {
                tracing::debug!(iteration, "no candidate reached min_improvement, stopping");
                break;
            }
        }
    }

    tracing::info!(
        iterations = iteration,
        patterns = collection.patterns().len(),
        generated = generated.len(),
        total_size = collection.get_size(),
        max_pdb_size = collection.pdbs().iter().map(Pdb::size).max().unwrap_or(0),
        rejected = num_rejected,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "hill climbing finished"
    );

    Ok(finish(task, collection))
}

fn finish<'t>(task: &'t dyn Task, collection: IncrementalCanonicalPdbs<'t>) -> PatternCollectionInformation<'t> {
    PatternCollectionInformation {
        task,
        patterns: collection.patterns().to_vec(),
        max_additive_subsets: collection.subsets().to_vec(),
        pdbs: collection.pdbs().to_vec(),
    }
}

fn average_operator_cost(task: &dyn Task) -> f64 {
    let ops = task.operators();
    if ops.is_empty() {
        1.0
    } else {
        ops.iter().map(|o| o.cost as f64).sum::<f64>() / ops.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ExplicitTask, Fact, Operator};
    use rand::SeedableRng;

    fn v(i: usize) -> VarId {
        VarId::new(i)
    }

    #[test]
    fn config_rejects_min_improvement_over_num_samples() {
        let config = HillClimbingConfig {
            min_improvement: 20,
            num_samples: 10,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinImprovementExceedsSamples {
                min_improvement: 20,
                num_samples: 10
            })
        );
    }

    #[test]
    fn zero_max_time_skips_hill_climbing() {
        let op0 = Operator::new("set-v0", vec![Fact::new(v(0), 0)], vec![Fact::new(v(0), 1)], 1);
        let op1 = Operator::new("set-v1", vec![Fact::new(v(1), 0)], vec![Fact::new(v(1), 1)], 1);
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![op0, op1],
            vec![Fact::new(v(0), 1), Fact::new(v(1), 1)],
            State::new(vec![0, 0]),
        );
        let config = HillClimbingConfig {
            max_time: Some(Duration::ZERO),
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let result = generate(&task, &config, &mut rng).unwrap();
        assert_eq!(result.patterns.len(), 2);
    }

    #[test]
    fn scenario_dead_end_stops_immediately() {
        // Goal v0=1 is unreachable: the only operator requires v0=1 as a
        // precondition to set it, so the initial state v0=0 is a dead end.
        let op = Operator::new("impossible", vec![Fact::new(v(0), 1)], vec![Fact::new(v(0), 0)], 1);
        let task = ExplicitTask::new(vec![2], vec![op], vec![Fact::new(v(0), 1)], State::new(vec![0]));
        let config = HillClimbingConfig::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let result = generate(&task, &config, &mut rng).unwrap();
        assert_eq!(result.patterns.len(), 1);
    }

    #[test]
    fn scenario_interacting_variables_selects_joint_pattern() {
        // v2 must be set before either v0 or v1 can be set.
        let op_v2 = Operator::new("set-v2", vec![Fact::new(v(2), 0)], vec![Fact::new(v(2), 1)], 1);
        let op_v0 = Operator::new("set-v0", vec![Fact::new(v(2), 1)], vec![Fact::new(v(0), 1)], 1);
        let op_v1 = Operator::new("set-v1", vec![Fact::new(v(2), 1)], vec![Fact::new(v(1), 1)], 1);
        let task = ExplicitTask::new(
            vec![2, 2, 2],
            vec![op_v2, op_v0, op_v1],
            vec![Fact::new(v(0), 1), Fact::new(v(1), 1)],
            State::new(vec![0, 0, 0]),
        );
        let config = HillClimbingConfig {
            num_samples: 200,
            min_improvement: 1,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let result = generate(&task, &config, &mut rng).unwrap();
        assert!(result.patterns.iter().any(|p| p.len() > 1));
    }
}
