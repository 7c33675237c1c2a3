use reqwest::Client;

use crate::{config::Settings, media::MediaError, types::VideoSearchResponse};

/// Finds a video for a track through the YouTube Data API search endpoint.
pub struct MediaResolver {
    client: Client,
    search_url: String,
    api_key: String,
}

impl MediaResolver {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            search_url: settings.endpoints.youtube_api_url.clone(),
            api_key: settings.youtube_api_key.clone(),
        }
    }

    /// Id of the first video matching `"<song> <artist>"`.
    pub async fn resolve_video_id(&self, song: &str, artist: &str) -> Result<String, MediaError> {
        let query = format!("{song} {artist}");

        let res = self
            .client
            .get(&self.search_url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<VideoSearchResponse>()
            .await?;

        res.items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .ok_or(MediaError::NoResultsFound(query))
    }
}
