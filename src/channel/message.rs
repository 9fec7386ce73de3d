use std::fmt;

/// Identifier of the actor that produced a message.
pub type ID = u32;

/// Payload reserved for the shutdown signal. Never delivered to explorers.
pub const END: &str = "END";

/// Immutable value exchanged through the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    payload: String,
    origin: Option<ID>,
}

impl Message {
    pub fn new(payload: impl Into<String>) -> Self {
        Self { payload: payload.into(), origin: None }
    }

    pub fn from_origin(origin: ID, payload: impl Into<String>) -> Self {
        Self { payload: payload.into(), origin: Some(origin) }
    }

    /// The shutdown sentinel.
    pub fn end() -> Self { Self::new(END) }

    pub fn payload(&self) -> &str { &self.payload }

    pub fn origin(&self) -> Option<ID> { self.origin }

    pub fn is_end(&self) -> bool { self.payload == END }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Some(id) => write!(f, "[{id}] {}", self.payload),
            None => write!(f, "{}", self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_detected_by_payload() {
        assert!(Message::end().is_end());
        assert!(Message::from_origin(3, END).is_end());
        assert!(!Message::new("ENDING").is_end());
    }

    #[test]
    fn display_includes_origin() {
        assert_eq!(Message::from_origin(7, "hello").to_string(), "[7] hello");
        assert_eq!(Message::new("hello").to_string(), "hello");
    }
}
