//! The canonical pattern-database heuristic: the maximum, over a family of
//! additive subsets, of the sum of the member PDBs' values.

use crate::additive::AdditiveSubset;
use crate::cost::Cost;
use crate::pdb::Pdb;
use crate::task::State;

/// Sums the PDBs named by `subset` at `state`, short-circuiting on ∞.
pub fn subset_value(pdbs: &[Pdb], subset: &AdditiveSubset, state: &State) -> Cost {
    subset.members().iter().fold(Cost::ZERO, |acc, &i| acc + pdbs[i].get_value(state))
}

/// `H(s) = max over additive subsets of the sum of member PDB values`.
/// Returns `Cost::INFINITE` when every subset sums to infinity, i.e. `s` is
/// a dead end under the whole collection.
pub fn canonical_value(pdbs: &[Pdb], subsets: &[AdditiveSubset], state: &State) -> Cost {
    subsets
        .iter()
        .map(|s| subset_value(pdbs, s, state))
        .max()
        .unwrap_or(Cost::ZERO)
}

pub fn is_dead_end(pdbs: &[Pdb], subsets: &[AdditiveSubset], state: &State) -> bool {
    canonical_value(pdbs, subsets, state).is_infinite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::task::{ExplicitTask, Fact, Task, VarId};

    fn v(i: usize) -> VarId {
        VarId::new(i)
    }

    #[test]
    fn sums_single_subset_with_both_pdbs() {
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![
                crate::task::Operator::new("a", vec![Fact::new(v(0), 0)], vec![Fact::new(v(0), 1)], 1),
                crate::task::Operator::new("b", vec![Fact::new(v(1), 0)], vec![Fact::new(v(1), 1)], 1),
            ],
            vec![Fact::new(v(0), 1), Fact::new(v(1), 1)],
            crate::task::State::new(vec![0, 0]),
        );
        let pdb0 = Pdb::build(&task, Pattern::singleton(v(0)), 100).unwrap();
        let pdb1 = Pdb::build(&task, Pattern::singleton(v(1)), 100).unwrap();
        let subsets = vec![AdditiveSubset::new(vec![0, 1])];

        let h = canonical_value(&[pdb0, pdb1], &subsets, task.initial_state());
        assert_eq!(h.value(), Some(2));
    }

    #[test]
    fn dead_end_iff_all_subsets_infinite() {
        let task = ExplicitTask::new(
            vec![2],
            vec![crate::task::Operator::new(
                "never-applicable",
                vec![Fact::new(v(0), 1)],
                vec![Fact::new(v(0), 0)],
                1,
            )],
            vec![Fact::new(v(0), 0)],
            crate::task::State::new(vec![1]),
        );
        let pdb = Pdb::build(&task, Pattern::singleton(v(0)), 100).unwrap();
        let subsets = vec![AdditiveSubset::new(vec![0])];
        assert!(is_dead_end(&[pdb], &subsets, task.initial_state()));
    }
}
