use serde_json::Value;
use tracing::{debug, info};

use crate::{
    io::{read_entries, write_json_pretty},
    result::{bail, Result},
    settings::FilterConfig,
    title_filter::{PatternFilter, TitleFilter},
    types::{RawVideo, SketchEntry},
};

/// Keep the raw videos that look like single sketches.
///
/// Entries that are not videos, or miss an id or a title, are skipped.
/// The result is sorted by case-insensitive name, entries with the same name
/// staying in input order.
pub fn filter_sketches(entries: Vec<Value>, filter: &dyn TitleFilter) -> Vec<SketchEntry> {
    let mut sketches: Vec<SketchEntry> = entries
        .into_iter()
        .filter(|entry| {
            // Serde would also read `[id, title]` arrays as videos
            let is_video = entry.is_object();
            if !is_video && !entry.is_null() {
                debug!("Skipping entry that is not an object: {entry}");
            }
            is_video
        })
        .filter_map(|entry| match serde_json::from_value::<RawVideo>(entry) {
            Ok(video) => Some(video),
            Err(err) => {
                debug!("Skipping malformed entry: {err}");
                None
            }
        })
        .filter_map(|video| {
            let id = video.id.clone();
            let entry = video.into_entry();
            if entry.is_none() {
                debug!("Skipping entry {id:?} without id or title");
            }
            entry
        })
        .filter(|entry| {
            let excluded = filter.excludes(&entry.name);
            if excluded {
                debug!("Excluding '{}' ({})", entry.name, entry.video_id);
            }
            !excluded
        })
        .collect();

    sketches.sort_by_cached_key(|sketch| sketch.name.to_lowercase());
    sketches
}

/// Run the filter stage: read the raw listing, filter it and write the catalog
pub fn run_filter(config: &FilterConfig) -> Result<Vec<SketchEntry>> {
    let title_filter = match &config.patterns {
        Some(patterns) => PatternFilter::new(patterns)?,
        None => PatternFilter::default_patterns()?,
    };

    let entries = read_entries(&config.input)?;
    if entries.is_empty() {
        return bail(format!("No entries found in {}", config.input.display()));
    }
    info!("{} entries in the listing", entries.len());

    let total = entries.len();
    let sketches = filter_sketches(entries, &title_filter);
    info!(
        "Kept {} sketches, left out {} entries",
        sketches.len(),
        total - sketches.len()
    );

    write_json_pretty(&config.output, &sketches)?;
    info!("Wrote {} sketches to {}", sketches.len(), config.output.display());

    Ok(sketches)
}
