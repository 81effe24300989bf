//! HTTP execution with bounded retries.
//!
//! [`Executor::execute`] performs the round-trip for a [`PreparedRequest`],
//! retrying gateway failures (502/503/504) and transport errors with
//! exponential back-off, and classifies unsuccessful statuses into
//! [`Error`] values. It hands successful responses back undecoded.

use reqwest::Response;
use tracing::{debug, warn};

use crate::client::RetryPolicy;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::request::PreparedRequest;

/// Performs HTTP exchanges on the client's shared transport.
#[derive(Debug, Clone)]
pub struct Executor {
    http: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl Executor {
    /// Create an executor over an existing transport.
    #[must_use]
    pub const fn new(http: reqwest::Client, retry_policy: RetryPolicy) -> Self {
        Self { http, retry_policy }
    }

    /// The retry policy in effect.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Send `request`, retrying transient failures.
    ///
    /// Attempts run strictly one after another. The body of every failed
    /// attempt is read to completion before the next attempt starts, and every
    /// suspension point is raced against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] when `ctx` finishes first, the classified
    /// status error for non-retryable responses, and [`Error::Transient`] once
    /// the attempt budget is spent.
    pub async fn execute(&self, ctx: &Context, request: &PreparedRequest) -> Result<Response> {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            ctx.check()?;
            attempt += 1;
            debug!(
                method = %request.method(),
                url = %request.url(),
                attempt,
                "Sending Bizfly request"
            );

            let sent = ctx.run(request.to_reqwest(&self.http).send()).await?;
            let error = match sent {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let body = read_error_body(ctx, response).await?;
                    Error::from_response(status, &body)
                }
                Err(err) => Error::from(err),
            };

            if !error.is_retryable() {
                return Err(error);
            }
            if attempt >= max_attempts {
                warn!(
                    url = %request.url(),
                    attempts = attempt,
                    %error,
                    "Retry budget exhausted"
                );
                return Err(error);
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            warn!(
                url = %request.url(),
                attempt,
                ?delay,
                %error,
                "Retrying Bizfly request"
            );
            ctx.run(tokio::time::sleep(delay)).await?;
        }
    }
}

async fn read_error_body(ctx: &Context, response: Response) -> Result<String> {
    Ok(ctx
        .run(response.text())
        .await?
        .unwrap_or_else(|err| format!("failed to read response body: {err}")))
}
