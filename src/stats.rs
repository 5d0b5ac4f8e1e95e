//! Plain diagnostic counters exposed by [`crate::orchestrator::Orchestrator::statistics`].
//!
//! This is the only structured-diagnostics surface the core exposes
//! publicly: which constraint failed or which path exploded is a
//! collaborator concern, but *that* a rejection happened, and roughly why
//! (infeasible vs. explosion vs. solver error), is retrievable here.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub transactions_validated: u64,
    pub transactions_rejected: u64,
    pub warm_starts: u64,
    pub cold_starts: u64,
    pub cross_validations: u64,
    pub path_explosions: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accept(&mut self) {
        self.transactions_validated += 1;
    }

    pub(crate) fn record_reject(&mut self) {
        self.transactions_rejected += 1;
    }

    pub(crate) fn record_path_explosion(&mut self) {
        self.path_explosions += 1;
    }

    pub(crate) fn record_solve_path(&mut self, path_taken: crate::simplex::SolvePath) {
        match path_taken {
            crate::simplex::SolvePath::WarmStart => self.warm_starts += 1,
            crate::simplex::SolvePath::ColdStart => self.cold_starts += 1,
            crate::simplex::SolvePath::CrossValidated => self.cross_validations += 1,
        }
    }
}
