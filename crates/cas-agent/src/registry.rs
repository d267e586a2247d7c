//! `AgentRegistry` — canonical arena of behaviors and actions.
//!
//! Behaviors and actions get dense, sequential ids at registration and are
//! never removed, so every other structure (states, matrices, trajectories)
//! refers to them by index.  The registry is built mutably by the model
//! definition and then shared read-only, typically as `Arc<AgentRegistry>`.

use std::sync::Arc;

use cas_core::{ActionId, BehaviorId};
use cas_prob::{ProbResult, ProbabilityMatrix, ProbabilityVector};
use rustc_hash::FxHashMap;

use crate::{
    Action, AgentName, Behavior, Measure, PopulationView, RegistryError, RegistryResult,
};

/// State-dependent probability that an action fires in one step.
pub type ActionProbabilityFn = Arc<dyn Fn(&dyn PopulationView) -> f64 + Send + Sync>;

#[derive(Default)]
pub struct AgentRegistry {
    behaviors:       Vec<Behavior>,
    actions:         Vec<Action>,
    /// Parallel to `actions`, indexed by `ActionId`.
    probability_fns: Vec<ActionProbabilityFn>,
    behavior_ids:    FxHashMap<AgentName, BehaviorId>,
    action_ids:      FxHashMap<String, ActionId>,
    /// Number of indexes per agent family.
    arity:           FxHashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Behaviors ─────────────────────────────────────────────────────────

    /// Register `family[indexes]`, or return the existing id.
    pub fn add_agent(&mut self, family: &str, indexes: &[i64]) -> RegistryResult<BehaviorId> {
        self.add_agent_name(AgentName::new(family, indexes))
    }

    /// Register `name`, or return the existing id.
    ///
    /// Fails with [`RegistryError::InconsistentArity`] when the family is
    /// already known with a different number of indexes.  Nothing is
    /// recorded on failure.
    pub fn add_agent_name(&mut self, name: AgentName) -> RegistryResult<BehaviorId> {
        if let Some(&id) = self.behavior_ids.get(&name) {
            return Ok(id);
        }
        if let Some(&expected) = self.arity.get(&name.family) {
            let found = name.arity();
            if expected != found {
                return Err(RegistryError::InconsistentArity {
                    family: name.family,
                    expected,
                    found,
                });
            }
        }
        let id = BehaviorId(self.behaviors.len() as u32);
        self.arity.insert(name.family.clone(), name.arity());
        self.behavior_ids.insert(name.clone(), id);
        self.behaviors.push(Behavior::new(name, id));
        Ok(id)
    }

    #[inline]
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    #[inline]
    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    #[inline]
    pub fn behavior(&self, id: BehaviorId) -> Option<&Behavior> {
        self.behaviors.get(id.index())
    }

    pub fn agent(&self, name: &AgentName) -> Option<&Behavior> {
        self.agent_id(name).and_then(|id| self.behavior(id))
    }

    pub fn agent_id(&self, name: &AgentName) -> Option<BehaviorId> {
        self.behavior_ids.get(name).copied()
    }

    /// Id of `family[indexes]`, if registered.
    pub fn agent_index(&self, family: &str, indexes: &[i64]) -> Option<BehaviorId> {
        self.agent_id(&AgentName::new(family, indexes))
    }

    /// Number of indexes used by `family`, if any instance is registered.
    pub fn arity(&self, family: &str) -> Option<usize> {
        self.arity.get(family).copied()
    }

    /// Ids of the behaviors whose name satisfies `pred`, in id order.
    pub fn behaviors_where<F>(&self, pred: F) -> Vec<BehaviorId>
    where
        F: Fn(&AgentName) -> bool,
    {
        self.behaviors.iter().filter(|b| pred(&b.name)).map(|b| b.id).collect()
    }

    // ── Actions ───────────────────────────────────────────────────────────

    /// Register an action with its probability function, or return the
    /// existing id (the first function is kept).
    pub fn add_action<F>(&mut self, name: &str, probability: F) -> ActionId
    where
        F: Fn(&dyn PopulationView) -> f64 + Send + Sync + 'static,
    {
        if let Some(&id) = self.action_ids.get(name) {
            return id;
        }
        let id = ActionId(self.actions.len() as u32);
        self.action_ids.insert(name.to_string(), id);
        self.actions.push(Action { name: name.to_string(), id });
        self.probability_fns.push(Arc::new(probability));
        id
    }

    /// Register an action that never fires until a probability is set.
    pub fn declare_action(&mut self, name: &str) -> ActionId {
        self.add_action(name, |_| 0.0)
    }

    pub fn set_action_probability<F>(&mut self, name: &str, probability: F) -> RegistryResult<()>
    where
        F: Fn(&dyn PopulationView) -> f64 + Send + Sync + 'static,
    {
        let id = self
            .action_ids
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownAction(name.to_string()))?;
        self.probability_fns[id.index()] = Arc::new(probability);
        Ok(())
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.action_ids.get(name).map(|id| &self.actions[id.index()])
    }

    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// `from --action--> to`.
    pub fn add_transition(
        &mut self,
        from:   BehaviorId,
        action: ActionId,
        to:     BehaviorId,
    ) -> RegistryResult<()> {
        if action.index() >= self.actions.len() {
            return Err(RegistryError::UnknownAction(action.to_string()));
        }
        if to.index() >= self.behaviors.len() {
            return Err(RegistryError::UnknownAgent(to.to_string()));
        }
        let behavior = self
            .behaviors
            .get_mut(from.index())
            .ok_or_else(|| RegistryError::UnknownAgent(from.to_string()))?;
        behavior.transitions.push((action, to));
        Ok(())
    }

    /// Add `action` to every instance of `family` whose indexes satisfy
    /// `guard`; the target is the agent named by `step(indexes)`.
    ///
    /// Targets are resolved before anything is added, so an unknown target
    /// leaves the registry unchanged.
    pub fn add_agent_step<G, S>(
        &mut self,
        family: &str,
        guard:  G,
        action: ActionId,
        step:   S,
    ) -> RegistryResult<usize>
    where
        G: Fn(&[i64]) -> bool,
        S: Fn(&[i64]) -> AgentName,
    {
        let mut planned = Vec::new();
        for behavior in &self.behaviors {
            if behavior.name.family == family && guard(&behavior.name.indexes) {
                let target_name = step(&behavior.name.indexes);
                let target = self
                    .agent_id(&target_name)
                    .ok_or_else(|| RegistryError::UnknownAgent(target_name.to_string()))?;
                planned.push((behavior.id, target));
            }
        }
        for &(from, to) in &planned {
            self.add_transition(from, action, to)?;
        }
        Ok(planned.len())
    }

    // ── Per-step probabilities ────────────────────────────────────────────

    /// Evaluate every action probability function against `state`.
    ///
    /// Called once per step; results are never cached across steps.
    pub fn action_probabilities(&self, state: &dyn PopulationView) -> Vec<f64> {
        self.probability_fns.iter().map(|f| f(state)).collect()
    }

    /// Lazy agent transition matrix for `state`.
    ///
    /// Action probabilities are evaluated eagerly (once); rows are built on
    /// demand.  An id outside the registry maps to a self-loop.
    pub fn agent_probability_matrix(&self, state: &dyn PopulationView) -> ProbabilityMatrix<'_, BehaviorId> {
        let probabilities = self.action_probabilities(state);
        ProbabilityMatrix::new(move |&b: &BehaviorId| self.behavior_row(b, &probabilities))
    }

    fn behavior_row(&self, b: BehaviorId, probabilities: &[f64]) -> ProbResult<ProbabilityVector<BehaviorId>> {
        match self.behavior(b) {
            Some(behavior) => behavior.probability_vector(probabilities),
            None => Ok(ProbabilityVector::dirac(b)),
        }
    }

    // ── Population helpers ────────────────────────────────────────────────

    /// Count per behavior of `agents`.  Ids outside the registry are ignored.
    pub fn multiplicity(&self, agents: &[BehaviorId]) -> Vec<u32> {
        let mut counts = vec![0u32; self.behavior_count()];
        for b in agents {
            if let Some(c) = counts.get_mut(b.index()) {
                *c += 1;
            }
        }
        counts
    }

    /// `fraction_of` every behavior, in id order.
    pub fn fractions_of(&self, state: &dyn PopulationView) -> Vec<f64> {
        self.behaviors.iter().map(|b| state.fraction_of(b.id)).collect()
    }

    /// One `%name` fraction measure per behavior.
    pub fn measures(&self) -> Vec<Measure> {
        self.behaviors
            .iter()
            .map(|b| Measure::fraction(format!("%{}", b.name), b.id))
            .collect()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("behaviors", &self.behaviors.len())
            .field("actions", &self.actions.len())
            .finish()
    }
}
