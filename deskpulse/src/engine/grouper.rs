use std::collections::HashMap;

use crate::store::Message;

/// All messages of one conversation, oldest first.
#[derive(Debug, Clone)]
pub struct Conversation<'a> {
    pub id: &'a str,
    pub messages: Vec<&'a Message>,
}

impl<'a> Conversation<'a> {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&'a Message> {
        self.messages.last().copied()
    }
}

/// Partitions a snapshot by conversation id.
///
/// Each conversation is stably sorted by timestamp, so equal timestamps keep
/// snapshot order. Conversations come back in order of first appearance.
pub fn group_conversations<'a, I>(messages: I) -> Vec<Conversation<'a>>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut conversations: Vec<Conversation<'a>> = Vec::new();

    for message in messages {
        let slot = *index
            .entry(message.conversation_id.as_str())
            .or_insert_with(|| {
                conversations.push(Conversation {
                    id: message.conversation_id.as_str(),
                    messages: Vec::new(),
                });
                conversations.len() - 1
            });
        conversations[slot].messages.push(message);
    }

    for conversation in &mut conversations {
        // sort_by_key is stable
        conversation.messages.sort_by_key(|m| m.timestamp);
    }
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{at, customer, team};

    #[test]
    fn test_groups_and_orders_by_timestamp() {
        let messages = vec![
            team("t1", "g1", at(10, 5)),
            customer("c1", "g2", at(9, 0), "oi"),
            customer("c2", "g1", at(10, 0), "preciso de ajuda"),
        ];

        let conversations = group_conversations(&messages);
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].id, "g1");
        assert_eq!(conversations[1].id, "g2");

        let ids: Vec<&str> = conversations[0]
            .messages
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c2", "t1"]);
    }

    #[test]
    fn test_equal_timestamps_keep_snapshot_order() {
        let messages = vec![
            customer("first", "g1", at(10, 0), "a"),
            team("second", "g1", at(10, 0)),
            customer("third", "g1", at(10, 0), "b"),
            customer("earlier", "g1", at(9, 59), "c"),
        ];

        let conversations = group_conversations(&messages);
        let ids: Vec<&str> = conversations[0]
            .messages
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["earlier", "first", "second", "third"]);
    }

    #[test]
    fn test_nothing_dropped_or_deduplicated() {
        let duplicate = customer("same", "g1", at(10, 0), "oi");
        let messages = vec![duplicate.clone(), duplicate];

        let conversations = group_conversations(&messages);
        assert_eq!(conversations[0].len(), 2);
        assert!(group_conversations(&Vec::<Message>::new()).is_empty());
    }
}
