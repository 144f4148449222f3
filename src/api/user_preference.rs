//! User preference endpoint.

use crate::client::SchwabClient;
use crate::constants::USER_PREFERENCE_PATH;
use crate::error::Result;
use crate::types::user_preference::UserPreference;

impl SchwabClient {
    /// Retrieve the user preferences, including the streamer connection
    /// parameters.
    ///
    /// The first `streamerInfo` entry is cached on the client so it can act
    /// as a [`StreamerInfoProvider`](crate::credentials::StreamerInfoProvider).
    ///
    /// **Endpoint:** `GET /trader/v1/userPreference`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use schwab_streamer::client::SchwabClient;
    /// # #[tokio::main]
    /// # async fn main() -> schwab_streamer::error::Result<()> {
    /// let client = SchwabClient::new("your-access-token")?;
    /// let prefs = client.get_user_preference().await?;
    /// if let Some(info) = prefs.streamer_info.first() {
    ///     println!("streamer at {}", info.streamer_socket_url);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_user_preference(&self) -> Result<UserPreference> {
        let prefs: UserPreference = self.get(USER_PREFERENCE_PATH).await?;
        self.cache_streamer_info(prefs.streamer_info.first().cloned());
        Ok(prefs)
    }
}
