//! Systematic pattern generation: enumerate patterns up to a size bound,
//! either exhaustively or restricted to "interesting" patterns reachable
//! from goal variables through the causal graph.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::errors::ConfigError;
use crate::pattern::Pattern;
use crate::task::{Task, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystematicConfig {
    pub pattern_max_size: usize,
    pub only_interesting_patterns: bool,
    pub dominance_pruning: bool,
}

impl Default for SystematicConfig {
    fn default() -> Self {
        SystematicConfig {
            pattern_max_size: 2,
            only_interesting_patterns: true,
            dominance_pruning: false,
        }
    }
}

impl SystematicConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pattern_max_size == 0 {
            return Err(ConfigError::ZeroPatternMaxSize);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SystematicError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// All patterns of size ≤ `max_size` over `num_vars` variables, built by
/// extending each pattern with variable ids strictly greater than its
/// current maximum, in lexicographic order.
fn naive(num_vars: usize, max_size: usize) -> Vec<Pattern> {
    fn extend(prefix: &[u32], num_vars: usize, max_size: usize, out: &mut Vec<Pattern>) {
        out.push(Pattern::new(prefix.iter().map(|&v| VarId::new(v as usize)).collect()));
        if prefix.len() == max_size {
            return;
        }
        let start = *prefix.last().unwrap() + 1;
        for next in start..num_vars as u32 {
            let child = [prefix, &[next]].concat();
            extend(&child, num_vars, max_size, out);
        }
    }

    let mut out = Vec::new();
    for first in 0..num_vars as u32 {
        extend(&[first], num_vars, max_size, &mut out);
    }
    out
}

fn eff_to_pre_union(task: &dyn Task, pattern: &Pattern) -> BTreeSet<VarId> {
    pattern
        .vars()
        .iter()
        .flat_map(|&v| task.causal_graph().eff_to_pre(v).iter().copied())
        .collect()
}

/// Phase 1: single-goal-ancestor patterns, built by BFS-like expansion from
/// each goal variable's singleton, one new variable per step. Because every
/// expansion adds exactly one variable, the returned order is non-decreasing
/// in pattern size, an invariant phase 2 depends on.
fn sga_patterns(task: &dyn Task, max_size: usize) -> Vec<Pattern> {
    let mut queue: Vec<Pattern> = task.goal().iter().map(|f| Pattern::singleton(f.var)).collect();
    let mut seen: BTreeSet<Pattern> = queue.iter().cloned().collect();
    let mut out = Vec::new();

    let mut i = 0;
    while i < queue.len() {
        let current = queue[i].clone();
        i += 1;
        out.push(current.clone());
        if current.len() == max_size {
            continue;
        }
        for v in eff_to_pre_union(task, &current) {
            if current.contains(v) {
                continue;
            }
            let grown = current.union(&Pattern::singleton(v));
            if seen.insert(grown.clone()) {
                queue.push(grown);
            }
        }
    }
    out
}

/// Phase 2: disjoint unions of two SGA patterns joined through a connection
/// point, repeated until no new pattern is found.
fn interesting_unions(task: &dyn Task, sga: &[Pattern], max_size: usize) -> Vec<Pattern> {
    let mut by_var: std::collections::BTreeMap<VarId, Vec<Pattern>> = Default::default();
    for p in sga {
        for &v in p.vars() {
            by_var.entry(v).or_default().push(p.clone());
        }
    }
    // Phase 1 emits patterns in non-decreasing size order, and `sga` already
    // carries that order, so each per-variable bucket is also size-sorted.

    let mut seen: BTreeSet<Pattern> = sga.iter().cloned().collect();
    let mut out: Vec<Pattern> = Vec::new();
    let mut queue: Vec<Pattern> = sga.to_vec();

    let mut i = 0;
    while i < queue.len() {
        let p1 = queue[i].clone();
        i += 1;

        let eff_pre_image: BTreeSet<VarId> = eff_to_pre_union(task, &p1);
        let connection_points: Vec<VarId> = p1
            .vars()
            .iter()
            .flat_map(|&v| task.causal_graph().predecessors(v).iter().copied())
            .filter(|v| !p1.contains(*v) && !eff_pre_image.contains(v))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for cp in connection_points {
            let Some(candidates) = by_var.get(&cp) else { continue };
            for p2 in candidates {
                if p1.len() + p2.len() > max_size {
                    break;
                }
                if !p1.is_disjoint(p2) {
                    continue;
                }
                let union = p1.union(p2);
                if seen.insert(union.clone()) {
                    out.push(union.clone());
                    queue.push(union);
                }
            }
        }
    }
    out
}

/// Generates the pattern collection described by `config` for `task`.
pub fn generate(task: &dyn Task, config: &SystematicConfig) -> Result<Vec<Pattern>, SystematicError> {
    config.validate()?;

    if !config.only_interesting_patterns {
        return Ok(naive(task.num_variables(), config.pattern_max_size));
    }

    let sga = sga_patterns(task, config.pattern_max_size);
    let mut out = sga.clone();
    out.extend(interesting_unions(task, &sga, config.pattern_max_size));
    Ok(out)
}
