use crate::openai_client::Message;

/// Ordered conversation history. The first message is always the system
/// prompt and survives every mutation, including [`clear`](Self::clear).
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// The full history plus the current user input, without committing
    /// anything. The pair is only committed once the round-trip succeeds.
    pub fn request_messages(&self, input: &str) -> Vec<Message> {
        let mut outgoing = self.messages.clone();
        outgoing.push(Message::user(input));
        outgoing
    }

    /// Append the user/assistant pair of a completed round-trip.
    pub fn commit_turn(&mut self, input: &str, reply: &str) {
        self.messages.push(Message::user(input));
        self.messages.push(Message::assistant(reply));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drop everything except the system message.
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai_client::Role;

    #[test]
    fn starts_with_only_the_system_message() {
        let state = ConversationState::new("be brief");
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::System);
        assert_eq!(state.messages()[0].content, "be brief");
    }

    #[test]
    fn request_messages_appends_user_without_committing() {
        let state = ConversationState::new("sys");

        let outgoing = state.request_messages("hello");
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].role, Role::System);
        assert_eq!(outgoing[1].role, Role::User);
        assert_eq!(outgoing[1].content, "hello");

        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn commit_turn_appends_pairs_in_order() {
        let mut state = ConversationState::new("sys");

        for turn in 0..3 {
            let input = format!("question {turn}");
            let reply = format!("answer {turn}");
            state.commit_turn(&input, &reply);
        }

        // system + 3 user/assistant pairs
        assert_eq!(state.messages().len(), 7);
        assert_eq!(state.messages()[0].role, Role::System);
        for turn in 0..3 {
            let user = &state.messages()[1 + turn * 2];
            let assistant = &state.messages()[2 + turn * 2];
            assert_eq!(user.role, Role::User);
            assert_eq!(user.content, format!("question {turn}"));
            assert_eq!(assistant.role, Role::Assistant);
            assert_eq!(assistant.content, format!("answer {turn}"));
        }
    }

    #[test]
    fn clear_keeps_the_system_message() {
        let mut state = ConversationState::new("sys");
        state.commit_turn("hello", "hi");
        assert_eq!(state.messages().len(), 3);

        state.clear();
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::System);
        assert_eq!(state.messages()[0].content, "sys");
    }
}
