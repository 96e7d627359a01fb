//! Read-only view of a planning task: variables, operators, goal, initial
//! state and causal graph. Everything here is consumed by the core but
//! produced by an embedder; [`ExplicitTask`] is the concrete, in-memory
//! implementation used by the tests and by callers that have no richer task
//! representation of their own.

use std::fmt;

/// Compact, numeric reference to a finite-domain variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u32);

impl VarId {
    pub fn new(index: usize) -> VarId {
        VarId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for VarId {
    fn from(index: usize) -> Self {
        VarId::new(index)
    }
}

impl From<VarId> for usize {
    fn from(v: VarId) -> Self {
        v.index()
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Assignment of a single value to a single variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fact {
    pub var: VarId,
    pub value: u16,
}

impl Fact {
    pub fn new(var: VarId, value: u16) -> Fact {
        Fact { var, value }
    }
}

fn sort_facts(mut facts: Vec<Fact>) -> Vec<Fact> {
    facts.sort_by_key(|f| f.var);
    debug_assert!(
        facts.windows(2).all(|w| w[0].var != w[1].var),
        "at most one fact per variable is allowed"
    );
    facts
}

/// A STRIPS/SAS+-style operator: preconditions and effects are each at most
/// one fact per variable, sorted ascending by variable id.
#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    precond: Vec<Fact>,
    effects: Vec<Fact>,
    pub cost: u32,
}

impl Operator {
    pub fn new(name: impl Into<String>, precond: Vec<Fact>, effects: Vec<Fact>, cost: u32) -> Operator {
        Operator {
            name: name.into(),
            precond: sort_facts(precond),
            effects: sort_facts(effects),
            cost,
        }
    }

    pub fn precond(&self) -> &[Fact] {
        &self.precond
    }

    pub fn effects(&self) -> &[Fact] {
        &self.effects
    }

    pub fn is_applicable(&self, state: &State) -> bool {
        state.entails_all(&self.precond)
    }
}

/// A complete assignment of values to all variables of a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State(Vec<u16>);

impl State {
    pub fn new(values: Vec<u16>) -> State {
        State(values)
    }

    pub fn num_variables(&self) -> usize {
        self.0.len()
    }

    pub fn value(&self, var: VarId) -> u16 {
        self.0[var.index()]
    }

    pub fn set(&mut self, fact: Fact) {
        self.0[fact.var.index()] = fact.value;
    }

    pub fn set_all(&mut self, facts: &[Fact]) {
        facts.iter().for_each(|&f| self.set(f));
    }

    pub fn entails(&self, fact: Fact) -> bool {
        self.value(fact.var) == fact.value
    }

    pub fn entails_all(&self, facts: &[Fact]) -> bool {
        facts.iter().all(|&f| self.entails(f))
    }

    /// Returns the state reached by applying `op`'s effects to this state.
    /// Does not check applicability: the caller is expected to have done so.
    pub fn successor(&self, op: &Operator) -> State {
        let mut next = self.clone();
        next.set_all(op.effects());
        next
    }
}

/// Causal dependencies between variables, derived from an operator set.
///
/// `eff_to_pre(v)` lists the variables that appear in the precondition of
/// some operator which also has `v` in its effects. `predecessors(v)` is the
/// superset obtained by also including variables that co-occur with `v` in
/// the effects of a single operator (effect-to-effect arcs).
#[derive(Debug, Clone)]
pub struct CausalGraph {
    eff_to_pre: Vec<Vec<VarId>>,
    predecessors: Vec<Vec<VarId>>,
}

impl CausalGraph {
    pub fn compute(num_variables: usize, operators: &[Operator]) -> CausalGraph {
        let mut eff_to_pre: Vec<std::collections::BTreeSet<VarId>> = vec![Default::default(); num_variables];
        let mut predecessors: Vec<std::collections::BTreeSet<VarId>> = vec![Default::default(); num_variables];

        for op in operators {
            for &eff in op.effects() {
                for &pre in op.precond() {
                    if pre.var != eff.var {
                        eff_to_pre[eff.var.index()].insert(pre.var);
                        predecessors[eff.var.index()].insert(pre.var);
                    }
                }
                for &other_eff in op.effects() {
                    if other_eff.var != eff.var {
                        predecessors[eff.var.index()].insert(other_eff.var);
                    }
                }
            }
        }

        CausalGraph {
            eff_to_pre: eff_to_pre.into_iter().map(|s| s.into_iter().collect()).collect(),
            predecessors: predecessors.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    pub fn eff_to_pre(&self, var: VarId) -> &[VarId] {
        &self.eff_to_pre[var.index()]
    }

    pub fn predecessors(&self, var: VarId) -> &[VarId] {
        &self.predecessors[var.index()]
    }
}

/// Read-only view of a classical planning task, consumed by the core.
///
/// Implementations must return stable results across calls; all fact and
/// operator lists must be sorted ascending by variable id.
pub trait Task {
    fn num_variables(&self) -> usize;
    fn domain_size(&self, var: VarId) -> u16;
    fn operators(&self) -> &[Operator];
    fn goal(&self) -> &[Fact];
    fn initial_state(&self) -> &State;
    fn causal_graph(&self) -> &CausalGraph;

    fn variables(&self) -> std::ops::Range<u32> {
        0..self.num_variables() as u32
    }
}

/// A planning task stored directly as its constituent vectors. The default
/// `Task` implementation for embedders that have no richer representation,
/// and the one used throughout this crate's own tests.
#[derive(Debug, Clone)]
pub struct ExplicitTask {
    domains: Vec<u16>,
    operators: Vec<Operator>,
    goal: Vec<Fact>,
    initial_state: State,
    causal_graph: CausalGraph,
}

impl ExplicitTask {
    pub fn new(domains: Vec<u16>, operators: Vec<Operator>, goal: Vec<Fact>, initial_state: State) -> ExplicitTask {
        assert_eq!(domains.len(), initial_state.num_variables());
        let causal_graph = CausalGraph::compute(domains.len(), &operators);
        ExplicitTask {
            domains,
            operators,
            goal: sort_facts(goal),
            initial_state,
            causal_graph,
        }
    }
}

impl Task for ExplicitTask {
    fn num_variables(&self) -> usize {
        self.domains.len()
    }

    fn domain_size(&self, var: VarId) -> u16 {
        self.domains[var.index()]
    }

    fn operators(&self) -> &[Operator] {
        &self.operators
    }

    fn goal(&self) -> &[Fact] {
        &self.goal
    }

    fn initial_state(&self) -> &State {
        &self.initial_state
    }

    fn causal_graph(&self) -> &CausalGraph {
        &self.causal_graph
    }
}
