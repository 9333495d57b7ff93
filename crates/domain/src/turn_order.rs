//! Turn-order construction
//!
//! Combatants are prepared against the encounter context and sorted. The
//! comparator is pluggable, but combatants without initiative always sort
//! after those with one, whatever comparator is installed.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::entities::{Combatant, CombatantSource, EncounterContext};

/// Ordering policy for rolled combatants.
pub trait CombatantComparator: Send + Sync {
    fn compare(&self, a: &Combatant, b: &Combatant) -> Ordering;
}

/// Default policy: initiative descending, then name, then token id.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitiativeOrder;

impl CombatantComparator for InitiativeOrder {
    fn compare(&self, a: &Combatant, b: &Combatant) -> Ordering {
        let by_initiative = match (a.initiative, b.initiative) {
            (Some(ia), Some(ib)) => ib.total_cmp(&ia),
            _ => Ordering::Equal,
        };
        by_initiative
            .then_with(|| compare_names(&a.name, &b.name))
            .then_with(|| a.token_id.cmp(&b.token_id))
    }
}

/// Case-insensitive first so "bandit" and "Bandit" sit together, then exact.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

struct FnComparator<F>(F);

impl<F> CombatantComparator for FnComparator<F>
where
    F: Fn(&Combatant, &Combatant) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &Combatant, b: &Combatant) -> Ordering {
        (self.0)(a, b)
    }
}

/// Builds the sorted turn order from stored combatants.
#[derive(Clone)]
pub struct TurnOrderBuilder {
    comparator: Arc<dyn CombatantComparator>,
}

impl TurnOrderBuilder {
    pub fn new(comparator: impl CombatantComparator + 'static) -> Self {
        Self {
            comparator: Arc::new(comparator),
        }
    }

    /// Use a closure as the ordering policy.
    pub fn from_fn<F>(compare: F) -> Self
    where
        F: Fn(&Combatant, &Combatant) -> Ordering + Send + Sync + 'static,
    {
        Self::new(FnComparator(compare))
    }

    /// Compare two prepared combatants, unrolled ones last.
    pub fn compare(&self, a: &Combatant, b: &Combatant) -> Ordering {
        match (a.has_rolled(), b.has_rolled()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.comparator.compare(a, b),
        }
    }

    /// Prepare and sort `sources`. Combatants whose token is not in the scene are left out.
    pub fn build(&self, sources: &[CombatantSource], ctx: &EncounterContext<'_>) -> Vec<Combatant> {
        let mut turns: Vec<Combatant> = sources
            .iter()
            .filter_map(|source| Combatant::prepare(source, ctx))
            .collect();
        turns.sort_by(|a, b| self.compare(a, b));
        turns
    }
}

impl Default for TurnOrderBuilder {
    fn default() -> Self {
        Self::new(InitiativeOrder)
    }
}

impl fmt::Debug for TurnOrderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnOrderBuilder").finish_non_exhaustive()
    }
}
