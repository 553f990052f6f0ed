//! Per-worker call budgets.
//!
//! A budget is created for one worker run and discarded with it. Counters
//! are incremented before the call they account for, so an exhausted budget
//! denies the call rather than auditing it afterwards.

/// What happens when a ceiling is exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExhaustedAction {
    /// Stop the worker run immediately, keeping any partial result.
    Halt,
    /// Suppress further calls of this kind but let the run finish.
    Continue,
}

/// Which counter was exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetKind {
    /// Generation calls.
    Model,
    /// Tool dispatches.
    Tool,
}

/// A denied call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?} call budget exhausted (limit {limit})")]
pub struct BudgetExceeded {
    /// Exhausted counter.
    pub kind: BudgetKind,
    /// Configured ceiling.
    pub limit: u32,
    /// Configured action.
    pub action: ExhaustedAction,
}

/// Call ceilings for one worker run.
#[derive(Clone, Debug)]
pub struct Budget {
    max_model_calls: u32,
    max_tool_calls: u32,
    on_model_exhausted: ExhaustedAction,
    on_tool_exhausted: ExhaustedAction,
    consumed_model: u32,
    consumed_tool: u32,
}

impl Budget {
    /// Build a budget with explicit ceilings and actions.
    #[must_use]
    pub fn new(
        max_model_calls: u32,
        on_model_exhausted: ExhaustedAction,
        max_tool_calls: u32,
        on_tool_exhausted: ExhaustedAction,
    ) -> Self {
        Self {
            max_model_calls,
            max_tool_calls,
            on_model_exhausted,
            on_tool_exhausted,
            consumed_model: 0,
            consumed_tool: 0,
        }
    }

    /// The standard worker budget: 10 model calls ending the run on
    /// exhaustion, 3 tool calls with graceful continuation.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(10, ExhaustedAction::Halt, 3, ExhaustedAction::Continue)
    }

    /// Account for a generation call. Denies the call once the ceiling
    /// is passed.
    pub fn consume_model(&mut self) -> Result<(), BudgetExceeded> {
        self.consumed_model += 1;
        if self.consumed_model > self.max_model_calls {
            return Err(BudgetExceeded {
                kind: BudgetKind::Model,
                limit: self.max_model_calls,
                action: self.on_model_exhausted,
            });
        }
        Ok(())
    }

    /// Account for a tool dispatch. Denies the dispatch once the ceiling
    /// is passed.
    pub fn consume_tool(&mut self) -> Result<(), BudgetExceeded> {
        self.consumed_tool += 1;
        if self.consumed_tool > self.max_tool_calls {
            return Err(BudgetExceeded {
                kind: BudgetKind::Tool,
                limit: self.max_tool_calls,
                action: self.on_tool_exhausted,
            });
        }
        Ok(())
    }

    /// Generation calls actually admitted.
    #[must_use]
    pub fn model_calls(&self) -> u32 {
        self.consumed_model.min(self.max_model_calls)
    }

    /// Tool dispatches actually admitted.
    #[must_use]
    pub fn tool_calls(&self) -> u32 {
        self.consumed_tool.min(self.max_tool_calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_ceiling() {
        let mut b = Budget::new(2, ExhaustedAction::Halt, 1, ExhaustedAction::Continue);
        assert!(b.consume_model().is_ok());
        assert!(b.consume_model().is_ok());
        let err = b.consume_model().unwrap_err();
        assert_eq!(err.kind, BudgetKind::Model);
        assert_eq!(err.action, ExhaustedAction::Halt);
        assert_eq!(b.model_calls(), 2);
    }

    #[test]
    fn tool_exhaustion_carries_continue_action() {
        let mut b = Budget::standard();
        for _ in 0..3 {
            assert!(b.consume_tool().is_ok());
        }
        let err = b.consume_tool().unwrap_err();
        assert_eq!(err.kind, BudgetKind::Tool);
        assert_eq!(err.action, ExhaustedAction::Continue);
        assert_eq!(b.tool_calls(), 3);
    }

    #[test]
    fn standard_ceilings() {
        let mut b = Budget::standard();
        for _ in 0..10 {
            assert!(b.consume_model().is_ok());
        }
        assert!(b.consume_model().is_err());
    }

    #[test]
    fn denial_is_repeatable() {
        let mut b = Budget::new(0, ExhaustedAction::Halt, 0, ExhaustedAction::Continue);
        assert!(b.consume_model().is_err());
        assert!(b.consume_model().is_err());
        assert_eq!(b.model_calls(), 0);
    }
}
