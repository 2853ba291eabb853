use crate::llm::{Role, Turn};

/// Append-only record of a conversation. Turns are only added in
/// user/model pairs, so the roles always alternate starting with `User`.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a completed exchange: the prompting turn and its reply.
    pub fn push_exchange(&mut self, user: Turn, reply: Turn) {
        debug_assert_eq!(user.role, Role::User);
        debug_assert_eq!(reply.role, Role::Model);
        self.turns.push(user);
        self.turns.push(reply);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

}
