//! Pattern-database heuristics for domain-independent classical planning.
//!
//! This crate builds admissible, consistent canonical heuristics out of
//! pattern databases (PDBs): per-variable-subset abstractions whose exact
//! goal distances can be summed, without double-counting operator cost,
//! over pairwise-additive subsets of a collection. Two generators grow such
//! collections: [`hillclimbing`]'s greedy, sample-driven search (iPDB) and
//! [`systematic`]'s exhaustive enumeration of causally "interesting"
//! patterns.
//!
//! Callers provide a [`task::Task`] implementation (or the bundled
//! [`task::ExplicitTask`]) and drive either generator to obtain a
//! [`hillclimbing::PatternCollectionInformation`], then query the resulting
//! collection through [`canonical`]'s `canonical_value`/`is_dead_end`.

pub mod additive;
pub mod canonical;
pub mod cost;
pub mod errors;
pub mod hillclimbing;
pub mod incremental;
pub mod pattern;
pub mod pdb;
pub mod sampler;
pub mod systematic;
pub mod task;

pub use additive::AdditiveSubset;
pub use cost::Cost;
pub use errors::{ConfigError, PdbError, SamplingOutcome};
pub use hillclimbing::{HillClimbingConfig, HillClimbingError, PatternCollectionInformation};
pub use incremental::IncrementalCanonicalPdbs;
pub use pattern::Pattern;
pub use pdb::Pdb;
pub use systematic::{SystematicConfig, SystematicError};
pub use task::{CausalGraph, ExplicitTask, Fact, Operator, State, Task, VarId};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn v(i: usize) -> VarId {
        VarId::new(i)
    }

    /// Scenario 1 from the generator's test matrix: two independent
    /// variables, no candidate ever improves on the singleton collection.
    #[test]
    fn trivial_two_variable_task_end_to_end() {
        let op0 = Operator::new("set-v0", vec![Fact::new(v(0), 0)], vec![Fact::new(v(0), 1)], 1);
        let op1 = Operator::new("set-v1", vec![Fact::new(v(1), 0)], vec![Fact::new(v(1), 1)], 1);
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![op0, op1],
            vec![Fact::new(v(0), 1), Fact::new(v(1), 1)],
            State::new(vec![0, 0]),
        );

        let config = HillClimbingConfig::default();
        let mut rng = SmallRng::seed_from_u64(0);
        let result = hillclimbing::generate(&task, &config, &mut rng).unwrap();

        assert_eq!(result.patterns.len(), 2);
        let h = canonical::canonical_value(&result.pdbs, &result.max_additive_subsets, task.initial_state());
        assert_eq!(h.value(), Some(2));
    }

    #[test]
    fn systematic_naive_matches_scenario_five() {
        let op = Operator::new("noop", vec![], vec![Fact::new(v(0), 1)], 1);
        let task = ExplicitTask::new(vec![2, 2, 2], vec![op], vec![Fact::new(v(0), 1)], State::new(vec![0, 0, 0]));
        let config = SystematicConfig {
            pattern_max_size: 2,
            only_interesting_patterns: false,
            dominance_pruning: false,
        };
        let patterns = systematic::generate(&task, &config).unwrap();
        let rendered: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["{v0}", "{v0,v1}", "{v0,v2}", "{v1}", "{v1,v2}", "{v2}"]);
    }
}
