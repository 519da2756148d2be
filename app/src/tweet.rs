//! Publishing drafts from the tweet agent.

use crate::client::{ApiClient, ApiError};
use crate::store::{LocalStore, XCredentials};

/// Agent whose text replies are editable tweet drafts.
pub const TWEET_AGENT_NAME: &str = "tweet sizzler agent";

/// Post `content` with the stored X credentials.
///
/// Credentials are resolved first; if any is missing no request is made.
pub async fn submit_tweet(
    client: &ApiClient,
    store: &LocalStore,
    content: &str,
) -> Result<(), ApiError> {
    let credentials = XCredentials::from_store(store)?;
    client.post_tweet(&credentials, content).await?;
    tracing::info!(chars = content.chars().count(), "tweet posted");
    Ok(())
}
