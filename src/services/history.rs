// src/services/history.rs
use crate::models::chat::Turn;
use std::collections::VecDeque;

/// Fixed-capacity conversation history. Appending past capacity drops the
/// oldest turns first.
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    turns: VecDeque<Turn>,
    capacity: usize,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a user turn followed by its assistant turn. Returns how many
    /// old turns were evicted.
    pub fn push_exchange(&mut self, user: Turn, assistant: Turn) -> usize {
        self.turns.push_back(user);
        self.turns.push_back(assistant);

        let mut evicted = 0;
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Speaker;

    #[test]
    fn test_push_within_capacity_keeps_everything() {
        let mut history = BoundedHistory::new(4);
        assert_eq!(history.push_exchange(Turn::user("a"), Turn::assistant("b")), 0);
        assert_eq!(history.len(), 2);
        assert_eq!(history.to_vec(), vec![Turn::user("a"), Turn::assistant("b")]);
    }

    #[test]
    fn test_overflow_evicts_oldest_pair() {
        let mut history = BoundedHistory::new(4);
        history.push_exchange(Turn::user("q1"), Turn::assistant("a1"));
        history.push_exchange(Turn::user("q2"), Turn::assistant("a2"));
        let evicted = history.push_exchange(Turn::user("q3"), Turn::assistant("a3"));

        assert_eq!(evicted, 2);
        let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn test_odd_capacity_never_exceeded() {
        let mut history = BoundedHistory::new(3);
        for i in 0..5 {
            history.push_exchange(Turn::user(format!("q{i}")), Turn::assistant(format!("a{i}")));
            assert!(history.len() <= history.capacity());
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().last().map(|t| t.speaker), Some(Speaker::Assistant));
    }

    #[test]
    fn test_clear_empties_history() {
        let mut history = BoundedHistory::new(4);
        history.push_exchange(Turn::user("a"), Turn::assistant("b"));
        history.clear();
        assert!(history.is_empty());
        history.clear();
        assert!(history.is_empty());
    }
}
