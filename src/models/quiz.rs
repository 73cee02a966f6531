use super::question::Question;

/// The ordered questions of one session. Every question is stamped
/// with a committed index at append time, and that index is what
/// clients see and quote back; it survives removals. The cursor walks
/// vector positions internally, but every lookup by index resolves
/// the committed `Question.index`, never the raw position.
#[derive(Debug, Default)]
pub struct Quiz {
    questions: Vec<Question>,
    // Position of the current question in `questions`, -1 before the
    // first reveal. Not the committed index: positions shift when an
    // earlier question is removed.
    current_pos: i64,
}

impl Quiz {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            current_pos: -1,
        }
    }

    /// Appends and stamps the question. Indices are assigned at append
    /// time and are not reassigned by removals.
    pub fn add_question(&mut self, mut question: Question) -> i64 {
        let index = self.questions.len() as i64;
        question.index = index;
        self.questions.push(question);
        index
    }

    pub fn num_questions(&self) -> usize {
        self.questions.len()
    }

    fn position_of(&self, index: i64) -> Option<usize> {
        self.questions
            .iter()
            .position(|question| question.index == index)
    }

    /// Committed index of the current question, -1 when none is
    /// revealed. This is the value request indices are checked
    /// against.
    pub fn current_index(&self) -> i64 {
        self.current_question()
            .map(|question| question.index)
            .unwrap_or(-1)
    }

    pub fn question_at(&self, index: i64) -> Option<&Question> {
        self.position_of(index).map(|p| &self.questions[p])
    }

    pub fn question_at_mut(&mut self, index: i64) -> Option<&mut Question> {
        let position = self.position_of(index)?;
        Some(&mut self.questions[position])
    }

    pub fn current_question(&self) -> Option<&Question> {
        usize::try_from(self.current_pos)
            .ok()
            .and_then(|p| self.questions.get(p))
    }

    pub fn current_question_mut(&mut self) -> Option<&mut Question> {
        let position = usize::try_from(self.current_pos).ok()?;
        self.questions.get_mut(position)
    }

    /// Moves to the next question and starts it, or returns None
    /// without mutating anything when the quiz is exhausted.
    pub fn advance_to_next_question(&mut self) -> Option<&mut Question> {
        let next = self.current_pos + 1;
        if next >= self.questions.len() as i64 {
            return None;
        }
        self.current_pos = next;
        let question = self
            .current_question_mut()
            .expect("advanced position is in bounds");
        question.start();
        Some(question)
    }

    /// Removes the question with the given committed index. The
    /// cursor is pulled back when an earlier question disappears so it
    /// keeps pointing at the same current question.
    pub fn remove_question(&mut self, index: i64) -> Option<Question> {
        let position = self.position_of(index)?;
        let removed = self.questions.remove(position);
        if (position as i64) <= self.current_pos {
            self.current_pos -= 1;
        }
        Some(removed)
    }

    /// Replaces in place; only a question of the same body kind may
    /// stand in. The replacement inherits the slot's committed index.
    pub fn replace_question(&mut self, index: i64, mut replacement: Question) -> bool {
        let Some(position) = self.position_of(index) else {
            return false;
        };
        let old = &self.questions[position];
        if old.body.kind() != replacement.body.kind() {
            return false;
        }
        replacement.index = old.index;
        self.questions[position] = replacement;
        true
    }

    /// Deep copy without live timer state.
    pub fn snapshot(&self) -> Quiz {
        Quiz {
            questions: self.questions.iter().map(Question::snapshot).collect(),
            current_pos: self.current_pos,
        }
    }
}
