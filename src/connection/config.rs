//! Client configuration

use std::time::Duration;

/// Configuration options for the chat client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the chat service; the transport endpoint is
    /// `<base_url>ws-stomp`
    pub base_url: String,

    /// Bearer token used for implicit connects
    pub auth_token: String,

    /// Sender identifier stamped on outbound messages
    pub sender_id: String,

    /// Connect handshake must resolve within this time
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Create a new config for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: String::new(),
            sender_id: "current_user".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Transport endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}ws-stomp", self.base_url)
    }

    /// Set the auth token used for implicit connects
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Set the sender identifier
    pub fn sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://chat.example.com/");

        assert_eq!(config.endpoint(), "https://chat.example.com/ws-stomp");
        assert_eq!(config.sender_id, "current_user");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.auth_token.is_empty());
    }

    #[test]
    fn test_builder_chaining() {
        let config = ClientConfig::new("https://chat.example.com/")
            .auth_token("tok123")
            .sender_id("u7")
            .connect_timeout(Duration::from_secs(3));

        assert_eq!(config.auth_token, "tok123");
        assert_eq!(config.sender_id, "u7");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }
}
