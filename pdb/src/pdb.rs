//! Pattern databases: exact goal-distances over a projected abstract state
//! space, computed by regression search from the abstract goal.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::cost::Cost;
use crate::errors::PdbError;
use crate::pattern::Pattern;
use crate::task::{Fact, Operator, Task, VarId};

/// An operator projected onto a pattern: preconditions and effects outside
/// the pattern are dropped. Operators whose abstract effect becomes empty
/// carry no information for this pattern and are discarded by the caller.
#[derive(Debug, Clone)]
struct AbstractOperator {
    precond: Vec<Fact>,
    effects: Vec<Fact>,
    cost: u32,
}

fn project(op: &Operator, pattern: &Pattern) -> Option<AbstractOperator> {
    let precond: Vec<Fact> = op.precond().iter().copied().filter(|f| pattern.contains(f.var)).collect();
    let effects: Vec<Fact> = op.effects().iter().copied().filter(|f| pattern.contains(f.var)).collect();
    if effects.is_empty() {
        None
    } else {
        Some(AbstractOperator {
            precond,
            effects,
            cost: op.cost,
        })
    }
}

/// Multipliers for hashing an abstract state (values ordered as `pattern`'s
/// variables) into a dense array index: `idx = Σ m[i] * value_of(pattern[i])`.
fn multipliers(task: &dyn Task, pattern: &Pattern) -> Vec<usize> {
    let mut m = Vec::with_capacity(pattern.len());
    let mut acc = 1usize;
    for &v in pattern.vars() {
        m.push(acc);
        acc *= task.domain_size(v) as usize;
    }
    m
}

fn index_of(pattern_values: &[u16], multipliers: &[usize]) -> usize {
    pattern_values
        .iter()
        .zip(multipliers)
        .map(|(&val, &m)| val as usize * m)
        .sum()
}

fn unrank(mut index: usize, task: &dyn Task, pattern: &Pattern) -> Vec<u16> {
    let mut values = vec![0u16; pattern.len()];
    for (i, &v) in pattern.vars().iter().enumerate() {
        let dom = task.domain_size(v) as usize;
        values[i] = (index % dom) as u16;
        index /= dom;
    }
    values
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapElem {
    cost: u32,
    index: usize,
}

impl Ord for HeapElem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.cost.cmp(&other.cost).then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for HeapElem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A pattern database: a dense table of exact goal-distances for every
/// abstract state of `pattern`, plus the multipliers needed to hash a
/// concrete state into a table index.
#[derive(Clone)]
pub struct Pdb {
    pattern: Pattern,
    multipliers: Vec<usize>,
    table: Vec<Cost>,
}

impl fmt::Debug for Pdb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdb")
            .field("pattern", &self.pattern)
            .field("size", &self.table.len())
            .finish()
    }
}

impl Pdb {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Builds the pattern database for `pattern` over `task`, failing
    /// without doing any work if the abstract state space exceeds `max_size`.
    pub fn build(task: &dyn Task, pattern: Pattern, max_size: usize) -> Result<Pdb, PdbError> {
        let pattern_size = pattern.size(task).unwrap_or(usize::MAX);
        if pattern_size > max_size {
            return Err(PdbError::PatternTooLarge {
                pattern: pattern.clone(),
                pattern_size,
                limit: max_size,
            });
        }

        let multipliers = multipliers(task, &pattern);
        let abstract_ops: Vec<AbstractOperator> = task.operators().iter().filter_map(|o| project(o, &pattern)).collect();

        let mut table = vec![Cost::INFINITE; pattern_size];
        let mut heap: BinaryHeap<Reverse<HeapElem>> = BinaryHeap::new();

        let goal_partial: Vec<Fact> = task.goal().iter().copied().filter(|f| pattern.contains(f.var)).collect();
        for index in 0..pattern_size {
            let values = unrank(index, task, &pattern);
            let matches_goal = goal_partial.iter().all(|f| {
                let pos = pattern.vars().binary_search(&f.var).expect("goal var in pattern");
                values[pos] == f.value
            });
            if matches_goal {
                table[index] = Cost::ZERO;
                heap.push(Reverse(HeapElem { cost: 0, index }));
            }
        }

        while let Some(Reverse(HeapElem { cost, index })) = heap.pop() {
            if Cost::finite(cost) != table[index] {
                continue;
            }
            let values = unrank(index, task, &pattern);

            for op in &abstract_ops {
                for predecessor in regress(task, &values, &pattern, op) {
                    let pred_index = index_of(&predecessor, &multipliers);
                    let new_cost = cost.saturating_add(op.cost);
                    if Cost::finite(new_cost) < table[pred_index] {
                        table[pred_index] = Cost::finite(new_cost);
                        heap.push(Reverse(HeapElem {
                            cost: new_cost,
                            index: pred_index,
                        }));
                    }
                }
            }
        }

        tracing::debug!(pattern = %pattern, size = pattern_size, "built pattern database");
        Ok(Pdb { pattern, multipliers, table })
    }

    /// Reads the table entry for the abstract state induced by `state`.
    pub fn get_value(&self, state: &crate::task::State) -> Cost {
        let values: Vec<u16> = self.pattern.vars().iter().map(|&v| state.value(v)).collect();
        let index = index_of(&values, &self.multipliers);
        self.table[index]
    }

    pub fn get_value_at_index(&self, index: usize) -> Cost {
        self.table[index]
    }
}

/// Enumerates all abstract predecessor states of `successor` under `op`,
/// i.e. all abstract states s such that applying `op` to s yields exactly
/// `successor` (restricted to the pattern's variables).
///
/// Effect variables carrying a precondition are fixed to that precondition's
/// value; effect variables without one range over their full domain, since
/// regression cannot determine what value they held before the operator
/// fired. Non-effect precondition variables must already match `successor`
/// or `op` could never have produced it.
fn regress(task: &dyn Task, successor: &[u16], pattern: &Pattern, op: &AbstractOperator) -> Vec<Vec<u16>> {
    for pre in &op.precond {
        let is_effect_var = op.effects.iter().any(|e| e.var == pre.var);
        if !is_effect_var {
            let pos = pattern.vars().binary_search(&pre.var).expect("precond var in pattern");
            if successor[pos] != pre.value {
                return Vec::new();
            }
        }
    }

    let mut free_positions = Vec::new();
    let mut base = successor.to_vec();

    for eff in &op.effects {
        let pos = pattern.vars().binary_search(&eff.var).expect("effect var in pattern");
        if successor[pos] != eff.value {
            return Vec::new();
        }
        match op.precond.iter().find(|p| p.var == eff.var) {
            Some(pre) => base[pos] = pre.value,
            None => free_positions.push(pos),
        }
    }

    if free_positions.is_empty() {
        return vec![base];
    }

    // Cartesian product over the free (precondition-less effect) variables.
    let domains: Vec<usize> = free_positions
        .iter()
        .map(|&pos| task.domain_size(pattern.vars()[pos]) as usize)
        .collect();

    let mut results = Vec::new();
    let mut counters = vec![0usize; free_positions.len()];
    loop {
        let mut state = base.clone();
        for (i, &pos) in free_positions.iter().enumerate() {
            state[pos] = counters[i] as u16;
        }
        results.push(state);

        let mut carry = 0;
        while carry < counters.len() {
            counters[carry] += 1;
            if counters[carry] < domains[carry] {
                break;
            }
            counters[carry] = 0;
            carry += 1;
        }
        if carry == counters.len() {
            break;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ExplicitTask, State};

    fn v(i: usize) -> VarId {
        VarId::new(i)
    }

    fn two_var_task() -> ExplicitTask {
        let op0 = Operator::new("set-v0", vec![Fact::new(v(0), 0)], vec![Fact::new(v(0), 1)], 1);
        let op1 = Operator::new("set-v1", vec![Fact::new(v(1), 0)], vec![Fact::new(v(1), 1)], 1);
        ExplicitTask::new(
            vec![2, 2],
            vec![op0, op1],
            vec![Fact::new(v(0), 1), Fact::new(v(1), 1)],
            State::new(vec![0, 0]),
        )
    }

    #[test]
    fn singleton_pdb_has_expected_distances() {
        let task = two_var_task();
        let pdb = Pdb::build(&task, Pattern::singleton(v(0)), 100).unwrap();
        assert_eq!(pdb.get_value(task.initial_state()).value(), Some(1));
        let goal_state = State::new(vec![1, 0]);
        assert_eq!(pdb.get_value(&goal_state).value(), Some(0));
    }

    #[test]
    fn oversized_pattern_is_rejected() {
        let task = two_var_task();
        let err = Pdb::build(&task, Pattern::new(vec![v(0), v(1)]), 2).unwrap_err();
        assert!(matches!(err, PdbError::PatternTooLarge { limit: 2, .. }));
    }

    #[test]
    fn build_is_deterministic() {
        let task = two_var_task();
        let a = Pdb::build(&task, Pattern::singleton(v(0)), 100).unwrap();
        let b = Pdb::build(&task, Pattern::singleton(v(0)), 100).unwrap();
        assert_eq!(a.table, b.table);
    }
}
