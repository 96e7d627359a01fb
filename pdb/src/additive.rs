//! Additive-subset computation: given a collection of PDBs, determine which
//! groups may have their values summed without double-counting operator
//! cost, via maximal-clique enumeration over the pairwise-additivity graph.

use crate::pattern::Pattern;
use crate::task::{Operator, Task};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Two patterns are additive iff no operator has a non-zero-cost effect
/// charged to both, under the standard "disjoint effect variables" cost
/// partition: an operator's full cost is attributed to each pattern whose
/// variables it affects, so two patterns conflict only if some operator
/// has an effect on a variable of each and that operator's cost is
/// nonzero. See `DESIGN.md` for why this partition was chosen over
/// alternatives.
pub fn are_additive(a: &Pattern, b: &Pattern, operators: &[Operator]) -> bool {
    operators.iter().all(|op| {
        if op.cost == 0 {
            return true;
        }
        let touches_a = op.effects().iter().any(|f| a.contains(f.var));
        let touches_b = op.effects().iter().any(|f| b.contains(f.var));
        !(touches_a && touches_b)
    })
}

/// Dense adjacency-matrix representation of the pairwise-additivity graph
/// over a fixed collection of patterns, indexed by their position.
#[derive(Debug, Clone)]
pub struct AdditivityGraph {
    adjacency: Vec<Vec<bool>>,
}

impl AdditivityGraph {
    pub fn compute(patterns: &[Pattern], task: &dyn Task) -> AdditivityGraph {
        let n = patterns.len();
        let mut adjacency = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let additive = are_additive(&patterns[i], &patterns[j], task.operators());
                adjacency[i][j] = additive;
                adjacency[j][i] = additive;
            }
        }
        AdditivityGraph { adjacency }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn are_adjacent(&self, i: usize, j: usize) -> bool {
        self.adjacency[i][j]
    }

    fn neighbors(&self, i: usize) -> BTreeSet<usize> {
        self.adjacency[i]
            .iter()
            .enumerate()
            .filter_map(|(j, &adj)| adj.then_some(j))
            .collect()
    }
}

/// One maximal additive subset, stored as the sorted indices of the PDBs it
/// contains within the collection it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdditiveSubset(Vec<usize>);

impl AdditiveSubset {
    pub(crate) fn new(mut members: Vec<usize>) -> AdditiveSubset {
        members.sort();
        members.dedup();
        AdditiveSubset(members)
    }

    pub fn members(&self) -> &[usize] {
        &self.0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    pub fn is_subset_of(&self, other: &AdditiveSubset) -> bool {
        self.0.iter().all(|i| other.contains(*i))
    }
}

/// Enumerates all maximal cliques of `graph` via Bron-Kerbosch with pivoting.
pub fn maximal_cliques(graph: &AdditivityGraph) -> Vec<AdditiveSubset> {
    let mut cliques = Vec::new();
    if graph.is_empty() {
        return cliques;
    }
    let all: BTreeSet<usize> = (0..graph.len()).collect();
    bron_kerbosch(graph, BTreeSet::new(), all, BTreeSet::new(), &mut cliques);
    cliques.sort();
    cliques
}

fn bron_kerbosch(
    graph: &AdditivityGraph,
    r: BTreeSet<usize>,
    mut p: BTreeSet<usize>,
    mut x: BTreeSet<usize>,
    out: &mut Vec<AdditiveSubset>,
) {
    if p.is_empty() && x.is_empty() {
        out.push(AdditiveSubset(r.into_iter().collect()));
        return;
    }

    let pivot = p.union(&x).max_by_key(|&&v| graph.neighbors(v).len()).copied();
    let candidates: Vec<usize> = match pivot {
        Some(pivot) => p.difference(&graph.neighbors(pivot)).copied().collect(),
        None => p.iter().copied().collect(),
    };

    for v in candidates {
        let neighbors = graph.neighbors(v);
        let mut r_next = r.clone();
        r_next.insert(v);
        let p_next = p.intersection(&neighbors).copied().collect();
        let x_next = x.intersection(&neighbors).copied().collect();
        bron_kerbosch(graph, r_next, p_next, x_next, out);
        p.remove(&v);
        x.insert(v);
    }
}

/// Removes additive subsets dominated by another (subset-of-subset rule),
/// then drops PDBs that no longer appear in any surviving subset.
pub fn prune_dominated(subsets: Vec<AdditiveSubset>) -> Vec<AdditiveSubset> {
    let survivors: Vec<AdditiveSubset> = subsets
        .iter()
        .enumerate()
        .filter(|(i, s)| {
            !subsets
                .iter()
                .enumerate()
                .any(|(j, other)| *i != j && s.is_subset_of(other) && s != other)
        })
        .map(|(_, s)| s.clone())
        .unique()
        .collect();
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ExplicitTask, Fact, State, VarId};

    fn v(i: usize) -> VarId {
        VarId::new(i)
    }

    #[test]
    fn additive_iff_no_shared_costly_effect() {
        let op_a = Operator::new("a", vec![], vec![Fact::new(v(0), 1)], 1);
        let op_b = Operator::new("b", vec![], vec![Fact::new(v(1), 1)], 1);
        let a = Pattern::singleton(v(0));
        let b = Pattern::singleton(v(1));
        assert!(are_additive(&a, &b, &[op_a.clone(), op_b.clone()]));

        let op_both = Operator::new("both", vec![], vec![Fact::new(v(0), 1), Fact::new(v(1), 1)], 1);
        assert!(!are_additive(&a, &b, &[op_both]));
    }

    #[test]
    fn zero_edge_graph_yields_singleton_subsets() {
        let op_both = Operator::new("both", vec![], vec![Fact::new(v(0), 1), Fact::new(v(1), 1)], 1);
        let task = ExplicitTask::new(vec![2, 2], vec![op_both], vec![], State::new(vec![0, 0]));
        let patterns = vec![Pattern::singleton(v(0)), Pattern::singleton(v(1))];
        let graph = AdditivityGraph::compute(&patterns, &task);
        let cliques = maximal_cliques(&graph);
        assert_eq!(cliques.len(), 2);
        assert!(cliques.iter().all(|c| c.members().len() == 1));
    }

    #[test]
    fn complete_graph_yields_one_subset_with_all_pdbs() {
        let op_a = Operator::new("a", vec![], vec![Fact::new(v(0), 1)], 1);
        let task = ExplicitTask::new(vec![2, 2, 2], vec![op_a], vec![], State::new(vec![0, 0, 0]));
        let patterns = vec![
            Pattern::singleton(v(0)),
            Pattern::singleton(v(1)),
            Pattern::singleton(v(2)),
        ];
        let graph = AdditivityGraph::compute(&patterns, &task);
        let cliques = maximal_cliques(&graph);
        assert_eq!(cliques.len(), 1);
        assert_eq!(cliques[0].members(), &[0, 1, 2]);
    }

    #[test]
    fn prune_dominated_removes_subset_relations() {
        let small = AdditiveSubset(vec![0]);
        let big = AdditiveSubset(vec![0, 1]);
        let survivors = prune_dominated(vec![small, big.clone()]);
        assert_eq!(survivors, vec![big]);
    }
}
