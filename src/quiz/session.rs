use rand::Rng;

use super::config::DrillConfig;
use super::{generate, Module, Question, Verdict};

/// Running totals; both only ever go up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    pub total_attempted: u64,
    pub total_correct: u64,
}

impl Stats {
    pub fn record(&mut self, correct: bool) {
        self.total_attempted += 1;
        if correct {
            self.total_correct += 1;
        }
    }

    pub fn accuracy_percent(&self) -> u64 {
        if self.total_attempted == 0 {
            return 0;
        }
        (self.total_correct as f64 / self.total_attempted as f64 * 100.0).round() as u64
    }

    pub fn summary(&self) -> String {
        format!(
            "Answered: {} · Correct: {} · Accuracy: {}%",
            self.total_attempted,
            self.total_correct,
            self.accuracy_percent()
        )
    }
}

/// Everything that survives between two messages of one user.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub stats: Stats,
    pub config: DrillConfig,
    pub current: Option<Question>,
    question_seq: u64,
}

impl Session {
    pub fn next_question(&mut self, module: Module) -> &Question {
        self.next_question_with(module, &mut rand::thread_rng())
    }

    /// Replaces the current question with a new one carrying the next id.
    pub fn next_question_with<R: Rng + ?Sized>(&mut self, module: Module, rng: &mut R) -> &Question {
        let mut question = generate(module, &mut self.config, rng);
        self.question_seq += 1;
        question.id = self.question_seq;
        log::debug!(
            "Question #{} ({}): {} [answer: {}]",
            question.id,
            module.label(),
            question.text,
            question.answer
        );
        self.current.insert(question)
    }

    /// Checks an answer against the current question and counts the attempt.
    /// Returns `None` when there is no question to answer.
    pub fn submit(&mut self, answer: &str) -> Option<Verdict> {
        let question = self.current.as_ref()?;
        let verdict = question.check(answer);
        self.stats.record(verdict.correct);
        log::debug!(
            "Question #{}: {:?} judged {}",
            question.id,
            answer,
            if verdict.correct { "correct" } else { "incorrect" }
        );
        Some(verdict)
    }

    pub fn module(&self) -> Option<Module> {
        self.current.as_ref().map(|question| question.module)
    }

    pub fn is_current(&self, question_id: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|question| question.id == question_id)
    }

    pub fn advance_if_current(&mut self, question_id: u64) -> bool {
        self.advance_if_current_with(question_id, &mut rand::thread_rng())
    }

    /// Moves on from `question_id` in the same module. Does nothing once that
    /// question has been replaced or there is none.
    pub fn advance_if_current_with<R: Rng + ?Sized>(
        &mut self,
        question_id: u64,
        rng: &mut R,
    ) -> bool {
        let Some(module) = self.module().filter(|_| self.is_current(question_id)) else {
            log::debug!("Question #{} was already replaced, not advancing", question_id);
            return false;
        };
        self.next_question_with(module, rng);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::arithmetic::Operation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn five_plus_five() -> Session {
        let mut session = Session::default();
        session.config.arithmetic.min = 5;
        session.config.arithmetic.max = 5;
        session.config.arithmetic.operators = [Operation::Addition].into_iter().collect();
        session
    }

    #[test]
    fn test_stats_accuracy() {
        let mut stats = Stats::default();
        assert_eq!(stats.accuracy_percent(), 0);
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats, Stats { total_attempted: 3, total_correct: 2 });
        assert_eq!(stats.accuracy_percent(), 67);
        assert_eq!(stats.summary(), "Answered: 3 · Correct: 2 · Accuracy: 67%");
    }

    #[test]
    fn test_submit_updates_counters() {
        let mut rng = StdRng::seed_from_u64(41);
        let mut session = five_plus_five();
        assert_eq!(session.submit("10"), None);

        session.next_question_with(Module::Arithmetic, &mut rng);
        assert!(session.submit("10").unwrap().correct);
        let verdict = session.submit("11").unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.message(), "Incorrect. The answer is 10.");
        assert_eq!(session.stats, Stats { total_attempted: 2, total_correct: 1 });
    }

    #[test]
    fn test_new_question_supersedes_the_previous_one() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut session = five_plus_five();
        let first = session.next_question_with(Module::Arithmetic, &mut rng).id;
        let second = session.next_question_with(Module::Factoring, &mut rng).id;
        assert!(second > first);
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert_eq!(session.module(), Some(Module::Factoring));
    }

    #[test]
    fn test_advance_only_from_the_current_question() {
        let mut rng = StdRng::seed_from_u64(44);
        let mut session = five_plus_five();
        assert!(!session.advance_if_current_with(1, &mut rng));

        let answered = session.next_question_with(Module::Arithmetic, &mut rng).id;
        session.submit("10");
        let replaced = session.next_question_with(Module::Arithmetic, &mut rng).id;

        assert!(!session.advance_if_current_with(answered, &mut rng));
        assert!(session.is_current(replaced));

        assert!(session.advance_if_current_with(replaced, &mut rng));
        assert!(!session.is_current(replaced));
        assert_eq!(session.module(), Some(Module::Arithmetic));
        assert_eq!(session.stats, Stats { total_attempted: 1, total_correct: 1 });
    }

    #[test]
    fn test_advancing_a_fresh_copy_keeps_later_answers() {
        let mut rng = StdRng::seed_from_u64(45);
        let mut stored = five_plus_five();
        let id = stored.next_question_with(Module::Arithmetic, &mut rng).id;
        stored.submit("10");

        // a second correct tap lands before the delayed advance runs
        stored.submit("10");
        let mut reloaded = stored.clone();
        assert!(reloaded.advance_if_current_with(id, &mut rng));
        assert_eq!(reloaded.stats, Stats { total_attempted: 2, total_correct: 2 });
    }

    #[test]
    fn test_session_survives_json_round_trip() {
        let mut rng = StdRng::seed_from_u64(43);
        let mut session = five_plus_five();
        session.next_question_with(Module::UnitCircle, &mut rng);
        session.submit("whatever");

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.stats, session.stats);
        assert_eq!(restored.current, session.current);
        assert_eq!(restored.config, session.config);
    }
}
