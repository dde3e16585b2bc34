/// Outcome of one word's speak/type/score cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub target: String,
    pub typed: String,
    pub correct: bool,
    pub retries: usize,
}

impl RoundResult {
    /// Score a round. Comparison is exact and case-sensitive.
    pub fn new(target: impl Into<String>, typed: impl Into<String>, retries: usize) -> Self {
        let target = target.into();
        let typed = typed.into();
        let correct = is_correct(&target, &typed);
        Self {
            target,
            typed,
            correct,
            retries,
        }
    }
}

pub fn is_correct(target: &str, typed: &str) -> bool {
    typed == target
}

/// Running tally for one session; lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub rounds: Vec<RoundResult>,
    pub score: usize,
    pub total_retries: usize,
}

impl SessionState {
    pub fn record(&mut self, round: RoundResult) -> &RoundResult {
        if round.correct {
            self.score += 1;
        }
        self.total_retries += round.retries;
        self.rounds.push(round);
        &self.rounds[self.rounds.len() - 1]
    }

    pub fn rounds_played(&self) -> usize {
        self.rounds.len()
    }
}
