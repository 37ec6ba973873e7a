use miette::{Context, IntoDiagnostic};
use reqwest::{blocking::Client, Url};
use serde::{de, Deserialize, Deserializer};
use tracing::{debug, trace};

use crate::result::{Error, Result};

/// The API refuses requests listing more ids than this
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// The metadata of one video, as needed to enrich a sketch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoItem {
    pub id: String,
    pub tags: Vec<String>,
    pub description: String,
    pub view_count: Option<u64>,
}

/// Interface for looking up the metadata of videos
pub trait VideoMetadataSource {
    /// Get the metadata of the videos with the given IDs.
    ///
    /// At most [`MAX_IDS_PER_REQUEST`] IDs are given at once.
    /// Videos that do not exist (anymore) are simply absent from the result,
    /// and the result order is unspecified.
    fn list_videos(&self, ids: &[String]) -> Result<Vec<VideoItem>>;
}

/// Client of the [YouTube Data API](https://developers.google.com/youtube/v3/docs/videos/list)
#[derive(Debug)]
pub struct YoutubeApi {
    client: Client,
    api_url: String,
    api_key: String,
}

impl YoutubeApi {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .into_diagnostic()
            .wrap_err("Could not build the HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// The `videos.list` request URL for these IDs
    fn videos_url(&self, ids: &[String]) -> Result<Url> {
        let ids = ids.join(",");
        let url = Url::parse_with_params(
            &format!("{}/videos", self.api_url),
            [
                ("part", "statistics,snippet"),
                ("id", ids.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid API URL '{}'", self.api_url))?;

        Ok(url)
    }
}

impl VideoMetadataSource for YoutubeApi {
    fn list_videos(&self, ids: &[String]) -> Result<Vec<VideoItem>> {
        let url = self.videos_url(ids)?;

        // The URL holds the API key, keep it out of the logs and errors
        debug!("Requesting metadata of {} videos", ids.len());
        let res = self
            .client
            .get(url)
            .send()
            .map_err(reqwest::Error::without_url)
            .into_diagnostic()
            .wrap_err("Could not reach the metadata API")?;

        let status = res.status();
        let body = res
            .text()
            .map_err(reqwest::Error::without_url)
            .into_diagnostic()
            .wrap_err("Could not read the metadata API response")?;

        debug!("status: {status}");
        debug!("body: {} bytes long", body.len());
        trace!("body: {body}");

        parse_video_list(status.as_u16(), &body)
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default, deserialize_with = "view_count")]
    view_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Counters are sent as decimal strings, but accept plain numbers too
fn view_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid view count '{s}'"))),
    }
}

/// Decode a `videos.list` response
fn parse_video_list(status: u16, body: &str) -> Result<Vec<VideoItem>> {
    if !(200..300).contains(&status) {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(res) => res.error.message,
            Err(_) => body.trim().to_owned(),
        };
        return Err(Error::Api { status, message });
    }

    let res: VideoListResponse = serde_json::from_str(body)
        .into_diagnostic()
        .wrap_err("Could not parse the metadata API response")?;

    Ok(res
        .items
        .into_iter()
        .map(|item| VideoItem {
            id: item.id,
            tags: item.snippet.tags.unwrap_or_default(),
            description: item.snippet.description.unwrap_or_default(),
            view_count: item.statistics.view_count,
        })
        .collect())
}
