//! Events produced by the decoder.

/// One classified piece of a chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A content fragment. Never empty.
    Token(String),
    /// The `[DONE]` marker arrived. Nothing follows.
    Done,
    /// The `[ERROR]` marker arrived. Holds the marker and everything after
    /// it that had been decoded at that point. Nothing follows.
    Error(String),
}

impl Event {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// The content of a [`Event::Token`], if it is one.
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(text) => Some(text),
            _ => None,
        }
    }
}

/// Lifecycle of a [`StreamDecoder`](crate::StreamDecoder).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecoderState {
    /// Still accepting bytes.
    #[default]
    Active,
    /// A terminal marker was seen; further bytes are ignored.
    Terminated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events() {
        assert!(Event::Done.is_terminal());
        assert!(Event::Error("[ERROR]x".into()).is_terminal());
        assert!(!Event::Token("hi".into()).is_terminal());
    }

    #[test]
    fn as_token_only_matches_tokens() {
        assert_eq!(Event::Token("hi".into()).as_token(), Some("hi"));
        assert_eq!(Event::Done.as_token(), None);
        assert_eq!(Event::Error("[ERROR]".into()).as_token(), None);
    }

    #[test]
    fn state_defaults_to_active() {
        assert_eq!(DecoderState::default(), DecoderState::Active);
    }
}
