//! Response decoding helpers.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::{Error, Result};

/// Read the full body of `response` and decode it as JSON.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `ctx` finishes while the body is being
/// read, [`Error::Transient`] if the body stream fails, and
/// [`Error::Serialization`] if the body is not valid JSON for `T`.
pub async fn read_json<T>(ctx: &Context, response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let url = response.url().clone();
    let bytes = ctx.run(response.bytes()).await?.map_err(Error::from)?;
    serde_json::from_slice(&bytes).map_err(|err| {
        Error::Serialization(format!("Failed to decode response from `{url}`: {err}"))
    })
}

/// Read and discard the body of `response` so its connection can be reused.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if `ctx` finishes first, and
/// [`Error::Transient`] if the body stream fails.
pub async fn drain(ctx: &Context, response: Response) -> Result<()> {
    ctx.run(response.bytes()).await?.map_err(Error::from)?;
    Ok(())
}
