use super::Context;
use crate::error::{CliError, CliResult};
use crate::remote::Remote;

/// Pushes history, every calendar file and the feed to `remote.publish_url`.
///
/// The first failed transfer aborts the publish.
pub async fn publish(ctx: &Context) -> CliResult<usize> {
    let location = ctx
        .config
        .remote
        .publish_url
        .as_deref()
        .ok_or(CliError::RemoteNotConfigured {
            setting: "publish_url",
        })?;
    let remote = Remote::from_location(location, ctx.config.remote.token());

    let artifacts = ctx.artifacts()?;
    for (relative, path) in &artifacts {
        let body = tokio::fs::read(path)
            .await
            .map_err(|e| CliError::external(path.display().to_string(), e))?;
        remote.put(relative, body).await?;
        tracing::debug!(file = %remote.describe(relative), "Published artifact");
    }

    tracing::info!(files = artifacts.len(), remote = %location, "Published duty state");
    Ok(artifacts.len())
}
