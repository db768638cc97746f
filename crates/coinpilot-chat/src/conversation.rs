//! Conversation memory: completed exchanges replayed into new requests.

use coinpilot_ai::ChatMessage;

use crate::exchange::Exchange;

/// Ordered history of completed exchanges.
///
/// Append-only for the life of a session. An optional replay limit bounds
/// how many of the most recent exchanges are sent with each request; stored
/// history is never truncated.
#[derive(Debug, Default, Clone)]
pub struct ConversationContext {
    exchanges: Vec<Exchange>,
    replay_limit: Option<usize>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay at most `limit` recent exchanges (`None` replays everything)
    pub fn with_replay_limit(limit: Option<usize>) -> Self {
        Self {
            exchanges: Vec::new(),
            replay_limit: limit,
        }
    }

    pub fn append(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    /// User/assistant message pairs, oldest first
    pub fn as_request_turns(&self) -> Vec<ChatMessage> {
        let skip = match self.replay_limit {
            Some(limit) => self.exchanges.len().saturating_sub(limit),
            None => 0,
        };

        self.exchanges[skip..]
            .iter()
            .flat_map(|exchange| {
                [
                    ChatMessage::user(exchange.user_text.clone()),
                    ChatMessage::assistant(exchange.response_text.clone()),
                ]
            })
            .collect()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn replay_limit(&self) -> Option<usize> {
        self.replay_limit
    }

    /// Forget everything (session reset)
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinpilot_ai::Role;

    fn completed(user: &str, reply: &str) -> Exchange {
        let mut exchange = Exchange::new(user, vec![]);
        exchange.response_text = reply.to_string();
        exchange.is_streaming = false;
        exchange
    }

    #[test]
    fn test_empty_context_has_no_turns() {
        let context = ConversationContext::new();
        assert!(context.is_empty());
        assert!(context.as_request_turns().is_empty());
    }

    #[test]
    fn test_replay_preserves_order() {
        let mut context = ConversationContext::new();
        context.append(completed("q1", "a1"));
        context.append(completed("q2", "a2"));
        context.append(completed("q3", "a3"));

        let turns = context.as_request_turns();
        assert_eq!(
            turns,
            vec![
                ChatMessage::user("q1"),
                ChatMessage::assistant("a1"),
                ChatMessage::user("q2"),
                ChatMessage::assistant("a2"),
                ChatMessage::user("q3"),
                ChatMessage::assistant("a3"),
            ]
        );
    }

    #[test]
    fn test_roles_alternate() {
        let mut context = ConversationContext::new();
        context.append(completed("q1", "a1"));
        context.append(completed("q2", "a2"));
        let roles: Vec<Role> = context.as_request_turns().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn test_replay_limit_windows_without_dropping() {
        let mut context = ConversationContext::with_replay_limit(Some(2));
        for i in 1..=4 {
            context.append(completed(&format!("q{}", i), &format!("a{}", i)));
        }

        assert_eq!(context.len(), 4);
        let turns = context.as_request_turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], ChatMessage::user("q3"));
        assert_eq!(turns[3], ChatMessage::assistant("a4"));
    }

    #[test]
    fn test_replay_limit_larger_than_history() {
        let mut context = ConversationContext::with_replay_limit(Some(10));
        context.append(completed("q1", "a1"));
        assert_eq!(context.as_request_turns().len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut context = ConversationContext::new();
        context.append(completed("q1", "a1"));
        context.clear();
        assert!(context.is_empty());
    }
}
