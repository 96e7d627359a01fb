//! The incremental canonical PDB structure: the mutable collection hill
//! climbing grows one pattern at a time, with its derived additive-subset
//! structure recomputed on every mutation.

use crate::additive::{self, AdditiveSubset, AdditivityGraph};
use crate::cost::Cost;
use crate::errors::PdbError;
use crate::pattern::Pattern;
use crate::pdb::Pdb;
use crate::task::{Fact, State, Task};

/// Owns a pattern collection, its built PDBs, and the additive-subset
/// family derived from them. The only mutator is [`add_pattern`], which
/// appends a PDB and recomputes the additive-subset structure from scratch;
/// recomputation is cheap relative to the PDB construction it follows.
pub struct IncrementalCanonicalPdbs<'t> {
    task: &'t dyn Task,
    patterns: Vec<Pattern>,
    pdbs: Vec<Pdb>,
    subsets: Vec<AdditiveSubset>,
    dominance_pruning: bool,
}

impl<'t> IncrementalCanonicalPdbs<'t> {
    /// Builds the initial collection: one pattern per goal variable, per the
    /// fixed starting point of hill climbing.
    pub fn new(task: &'t dyn Task, pdb_max_size: usize, dominance_pruning: bool) -> Result<Self, PdbError> {
        let goal_patterns: Vec<Pattern> = task.goal().iter().map(|f: &Fact| Pattern::singleton(f.var)).collect();
        let mut me = IncrementalCanonicalPdbs {
            task,
            patterns: Vec::new(),
            pdbs: Vec::new(),
            subsets: Vec::new(),
            dominance_pruning,
        };
        for p in goal_patterns {
            let pdb = Pdb::build(task, p.clone(), pdb_max_size.max(p.size(task).unwrap_or(usize::MAX)))?;
            me.patterns.push(p);
            me.pdbs.push(pdb);
        }
        me.recompute_subsets();
        Ok(me)
    }

    fn recompute_subsets(&mut self) {
        let graph = AdditivityGraph::compute(&self.patterns, self.task);
        let cliques = additive::maximal_cliques(&graph);
        self.subsets = if self.dominance_pruning {
            additive::prune_dominated(cliques)
        } else {
            cliques
        };
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pdbs(&self) -> &[Pdb] {
        &self.pdbs
    }

    pub fn subsets(&self) -> &[AdditiveSubset] {
        &self.subsets
    }

    pub fn get_size(&self) -> usize {
        self.pdbs.iter().map(Pdb::size).sum()
    }

    pub fn get_value(&self, state: &State) -> Cost {
        crate::canonical::canonical_value(&self.pdbs, &self.subsets, state)
    }

    pub fn is_dead_end(&self, state: &State) -> bool {
        crate::canonical::is_dead_end(&self.pdbs, &self.subsets, state)
    }

    /// Builds a PDB for `pattern` and appends it to the collection,
    /// recomputing the additive-subset structure afterward.
    pub fn add_pattern(&mut self, pattern: Pattern, pdb_max_size: usize) -> Result<(), PdbError> {
        let pdb = Pdb::build(self.task, pattern.clone(), pdb_max_size)?;
        tracing::debug!(pattern = %pattern, collection_size = self.patterns.len() + 1, "added pattern to collection");
        self.patterns.push(pattern);
        self.pdbs.push(pdb);
        self.recompute_subsets();
        Ok(())
    }

    /// The additive-subset structure restricted to PDBs additive with a
    /// *candidate* pattern `q`, not yet part of the collection. Used by the
    /// hill-climbing improvement test without mutating `self`.
    pub fn max_additive_subsets_for_candidate(&self, q: &Pattern) -> Vec<AdditiveSubset> {
        let restricted_indices: Vec<usize> = (0..self.patterns.len())
            .filter(|&i| crate::additive::are_additive(&self.patterns[i], q, self.task.operators()))
            .collect();

        if restricted_indices.is_empty() {
            return Vec::new();
        }

        let restricted_patterns: Vec<Pattern> = restricted_indices.iter().map(|&i| self.patterns[i].clone()).collect();
        let graph = AdditivityGraph::compute(&restricted_patterns, self.task);
        let local_cliques = additive::maximal_cliques(&graph);

        let remapped: Vec<AdditiveSubset> = local_cliques
            .into_iter()
            .map(|clique| {
                let members: Vec<usize> = clique.members().iter().map(|&local| restricted_indices[local]).collect();
                AdditiveSubset::new(members)
            })
            .collect();

        if self.dominance_pruning {
            additive::prune_dominated(remapped)
        } else {
            remapped
        }
    }
}
