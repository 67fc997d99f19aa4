//! Context Window Management
//!
//! Bounds the history handed to the model: the first system turn is kept
//! and the rest is the most recent tail.

use crate::models::{Message, Role};

/// History window for the transaction analyzer and the instrument picker
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// History window for the portfolio allocator
pub const ALLOCATOR_MAX_MESSAGES: usize = 15;

/// Keep the first system message (if any) plus the last `max_messages - 1` turns.
///
/// Histories already within the limit are returned whole.
pub fn prune_messages(messages: &[Message], max_messages: usize) -> Vec<Message> {
    if messages.len() <= max_messages {
        return messages.to_vec();
    }

    let tail_len = max_messages.saturating_sub(1);
    let tail_start = messages.len() - tail_len;
    let tail = &messages[tail_start..];

    let system = messages[..tail_start]
        .iter()
        .find(|m| m.role == Role::System);

    let mut context = Vec::with_capacity(max_messages);
    if let Some(system) = system {
        context.push(system.clone());
    }
    context.extend_from_slice(tail);
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(turns: usize) -> Vec<Message> {
        let mut messages = vec![Message::system("You are a financial analyst")];
        for i in 0..turns {
            messages.push(Message::human(format!("Question {}", i)));
        }
        messages
    }

    #[test]
    fn test_short_history_untouched() {
        let messages = history(3);
        let pruned = prune_messages(&messages, 20);
        assert_eq!(pruned, messages);
    }

    #[test]
    fn test_keeps_system_and_recent_tail() {
        let messages = history(30);
        let pruned = prune_messages(&messages, 15);

        assert_eq!(pruned.len(), 15);
        assert_eq!(pruned[0].role, Role::System);
        assert_eq!(pruned[1].content, "Question 16");
        assert_eq!(pruned.last().map(|m| m.content.as_str()), Some("Question 29"));
    }

    #[test]
    fn test_without_system_message() {
        let messages: Vec<Message> = (0..10)
            .map(|i| Message::human(format!("Q{}", i)))
            .collect();
        let pruned = prune_messages(&messages, 5);

        assert_eq!(pruned.len(), 4);
        assert_eq!(pruned[0].content, "Q6");
    }

    #[test]
    fn test_system_in_tail_not_duplicated() {
        let mut messages: Vec<Message> = (0..10)
            .map(|i| Message::human(format!("Q{}", i)))
            .collect();
        messages.push(Message::system("late instructions"));
        let pruned = prune_messages(&messages, 3);

        assert_eq!(pruned.len(), 2);
        assert_eq!(
            pruned.iter().filter(|m| m.role == Role::System).count(),
            1
        );
    }
}
