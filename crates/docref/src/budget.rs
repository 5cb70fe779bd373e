//! Token estimation and the crawl's global budget ledger

/// Fraction of the ceiling past which frontier expansion stops
const SOFT_STOP_FRACTION: f64 = 0.9;

/// Estimate the token cost of a piece of text
///
/// A budgeting heuristic, not a tokenizer: the average of
/// character-count/4 and word-count/0.75, rounded up. Deterministic
/// and monotonic in text length, which is all budgeting needs.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let char_count = text.chars().count() as f64;
    let word_count = text.split_whitespace().count().max(1) as f64;
    ((char_count / 4.0 + word_count / 0.75) / 2.0).ceil() as usize
}

/// Would adding `to_add` tokens push `spent` past `ceiling`?
pub fn would_exceed(spent: usize, to_add: usize, ceiling: usize) -> bool {
    spent + to_add > ceiling
}

/// Running token ledger for one crawl
///
/// All mutation happens on the orchestrator's coordinating task, which
/// applies worker results sequentially, so the check-then-commit in
/// [`try_charge`](Self::try_charge) is atomic per page and the spent
/// total never passes the ceiling.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    spent: usize,
    ceiling: usize,
}

impl TokenLedger {
    /// Create a ledger with the given ceiling and nothing spent
    pub fn new(ceiling: usize) -> Self {
        Self { spent: 0, ceiling }
    }

    /// Tokens spent so far
    pub fn spent(&self) -> usize {
        self.spent
    }

    /// The global ceiling
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Record a spend unconditionally
    pub fn record(&mut self, delta: usize) {
        self.spent += delta;
    }

    /// Charge `tokens` if it fits under the ceiling
    ///
    /// Returns false and leaves the ledger untouched when the charge
    /// would exceed the budget.
    pub fn try_charge(&mut self, tokens: usize) -> bool {
        if would_exceed(self.spent, tokens, self.ceiling) {
            return false;
        }
        self.spent += tokens;
        true
    }

    /// True once spending has crossed 90% of the ceiling
    ///
    /// The orchestrator stops expanding the frontier here; pages
    /// already accepted stand.
    pub fn soft_stop(&self) -> bool {
        self.spent as f64 > self.ceiling as f64 * SOFT_STOP_FRACTION
    }
}
