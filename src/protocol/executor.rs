use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::{
    error::{Error, Result},
    protocol::Channel,
};

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Query returning the device error register
    pub error_query: String,
    /// Exact reply meaning the last command was accepted
    pub no_error: String,
    /// Total number of times a command is sent before giving up
    pub attempts: u32,
    /// Pause between a rejected attempt and the next one
    pub backoff: Duration,
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            error_query: "ERR?".into(),
            no_error: "0; No error".into(),
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorStatus {
    NoError,
    /// Raw error reply, usually `<code>; <description>`
    Error(String),
}
impl ErrorStatus {
    pub fn from_reply(reply: &str, no_error: &str) -> Self {
        if reply == no_error {
            Self::NoError
        } else {
            Self::Error(reply.to_string())
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Numeric code preceding the `;`, if the reply has one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::NoError => Some(0),
            Self::Error(reply) => reply.split(';').next()?.trim().parse().ok(),
        }
    }
}

/// Sends state-changing commands and verifies each one against the device
/// error register, resending rejected commands.
pub struct ReliableExecutor {
    channel: Channel,
    policy: RetryPolicy,
}
impl ReliableExecutor {
    pub fn new(channel: Channel, policy: RetryPolicy) -> Self {
        Self { channel, policy }
    }

    pub fn channel(&mut self) -> &mut Channel {
        &mut self.channel
    }

    pub fn label(&self) -> &str {
        self.channel.label()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn error_status(&mut self) -> Result<ErrorStatus> {
        let reply = self.channel.query(&self.policy.error_query).await?;
        Ok(ErrorStatus::from_reply(&reply, &self.policy.no_error))
    }

    /// Send `command` until the device reports no error, or the attempt
    /// budget runs out. Transport failures and timeouts end the loop
    /// immediately.
    pub async fn execute(&mut self, command: &str) -> Result<()> {
        let mut attempts = self.policy.attempts.max(1);

        loop {
            self.channel.send(command).await?;

            let reply = match self.error_status().await? {
                ErrorStatus::NoError => {
                    debug!(device = self.channel.label(); "Command [{command}] accepted");
                    return Ok(());
                }
                ErrorStatus::Error(reply) => reply,
            };

            attempts -= 1;
            if attempts == 0 {
                return Err(Error::CommandRejected {
                    command: command.to_string(),
                    last_error: reply,
                });
            }

            warn!(
                device = self.channel.label(), attempts_left = attempts;
                "Failed sending command [{command}]: response [{reply}]"
            );
            sleep(self.policy.backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_must_match_exactly() {
        assert_eq!(
            ErrorStatus::from_reply("0; No error", "0; No error"),
            ErrorStatus::NoError
        );
        assert!(ErrorStatus::from_reply("0; no error", "0; No error").is_error());
        assert!(ErrorStatus::from_reply("", "0; No error").is_error());
    }

    #[test]
    fn error_code_is_parsed() {
        let status = ErrorStatus::from_reply("-113; Undefined header", "0; No error");
        assert_eq!(status.code(), Some(-113));
        assert_eq!(ErrorStatus::Error("busy".into()).code(), None);
        assert_eq!(ErrorStatus::NoError.code(), Some(0));
    }
}
