/// Blocking operator-facing confirmation channel.
///
/// The finalize step asks for a yes/no confirmation; the approval gate asks for
/// the approval passphrase. Both are synchronous from the workflow's view.
pub trait OperatorPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;

    /// `None` means the operator dismissed the prompt.
    fn request_secret(&self, message: &str) -> Option<String>;
}

/// Prompt whose answers were collected up front (e.g. from an HTTP request body).
#[derive(Debug, Clone, Default)]
pub struct FixedPrompt {
    confirm: bool,
    secret: Option<String>,
}

impl FixedPrompt {
    pub fn confirming(confirm: bool) -> Self {
        Self {
            confirm,
            secret: None,
        }
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            confirm: true,
            secret: Some(secret.into()),
        }
    }
}

impl OperatorPrompt for FixedPrompt {
    fn confirm(&self, message: &str) -> bool {
        tracing::debug!(prompt = message, answer = self.confirm, "confirmation requested");
        self.confirm
    }

    fn request_secret(&self, message: &str) -> Option<String> {
        tracing::debug!(prompt = message, provided = self.secret.is_some(), "secret requested");
        self.secret.clone()
    }
}
