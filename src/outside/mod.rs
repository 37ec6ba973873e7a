mod youtube;

pub use youtube::{VideoItem, VideoMetadataSource, YoutubeApi, MAX_IDS_PER_REQUEST};
