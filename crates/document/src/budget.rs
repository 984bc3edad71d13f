use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_BUDGET_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug)]
struct BudgetState {
    ceiling: AtomicUsize,
    open_documents: AtomicUsize,
}

/// Global undo memory ceiling, shared evenly by every open document.
#[derive(Debug, Clone)]
pub struct UndoBudget {
    state: Arc<BudgetState>,
}

impl UndoBudget {
    pub fn new(ceiling: usize) -> Self {
        Self {
            state: Arc::new(BudgetState {
                ceiling: AtomicUsize::new(ceiling),
                open_documents: AtomicUsize::new(0),
            }),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.state.ceiling.load(Ordering::Relaxed)
    }

    pub fn set_ceiling(&self, bytes: usize) {
        self.state.ceiling.store(bytes, Ordering::Relaxed);
    }

    pub fn open_documents(&self) -> usize {
        self.state.open_documents.load(Ordering::Relaxed)
    }

    pub fn per_document_limit(&self) -> usize {
        self.ceiling() / self.open_documents().max(1)
    }

    /// Registers one more document against the ceiling until the lease drops.
    pub fn lease(&self) -> BudgetLease {
        self.state.open_documents.fetch_add(1, Ordering::Relaxed);
        BudgetLease {
            budget: self.clone(),
        }
    }
}

impl Default for UndoBudget {
    fn default() -> Self {
        Self::new(DEFAULT_BUDGET_BYTES)
    }
}

#[derive(Debug)]
pub struct BudgetLease {
    budget: UndoBudget,
}

impl BudgetLease {
    pub fn limit(&self) -> usize {
        self.budget.per_document_limit()
    }

    pub fn budget(&self) -> &UndoBudget {
        &self.budget
    }
}

impl Drop for BudgetLease {
    fn drop(&mut self) {
        self.budget
            .state
            .open_documents
            .fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leases_split_the_ceiling() {
        let budget = UndoBudget::new(1200);
        assert_eq!(budget.per_document_limit(), 1200);

        let first = budget.lease();
        let second = budget.lease();
        let third = budget.lease();
        assert_eq!(first.limit(), 400);

        drop(third);
        assert_eq!(second.limit(), 600);
        budget.set_ceiling(60);
        assert_eq!(first.limit(), 30);

        drop(first);
        drop(second);
        assert_eq!(budget.open_documents(), 0);
    }
}
