use std::collections::{hash_map::Entry, BTreeSet, HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    io::{read_entries, write_json_pretty},
    outside::{VideoItem, VideoMetadataSource, MAX_IDS_PER_REQUEST},
    result::{Error, Result},
    settings::EnrichConfig,
    types::{Difficulty, SketchRecord},
};

/// What the metadata lookup found for a video kept in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
struct Lookup {
    views: u64,
    description: String,
    difficulty: Difficulty,
}

/// Outcome of an enrichment run
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichReport {
    /// The enriched records, in input order
    pub sketches: Vec<SketchRecord>,
    /// Number of distinct ids looked up
    pub requested: usize,
    /// Videos left out because of their tags
    pub skipped: usize,
    /// Videos the API did not return (deleted, private, ...)
    pub missing: usize,
}

impl EnrichReport {
    /// Number of enriched sketches with this difficulty
    pub fn count(&self, difficulty: Difficulty) -> usize {
        self.sketches
            .iter()
            .filter(|s| s.difficulty() == Some(difficulty))
            .count()
    }
}

/// Enrich sketch records with the metadata of their video
pub struct Enricher<'a> {
    source: &'a dyn VideoMetadataSource,
    exclude_tags: &'a BTreeSet<String>,
}

impl<'a> Enricher<'a> {
    /// `exclude_tags` must be lowercase
    pub fn new(source: &'a dyn VideoMetadataSource, exclude_tags: &'a BTreeSet<String>) -> Self {
        Self {
            source,
            exclude_tags,
        }
    }

    /// Look up every record and return those that are kept, enriched.
    ///
    /// Records are looked up in batches of [`MAX_IDS_PER_REQUEST`] ids.
    /// The first failing request aborts the whole enrichment.
    pub fn enrich(&self, entries: Vec<Value>) -> Result<EnrichReport> {
        let records = index_records(entries);
        if records.is_empty() {
            return Err(Error::NoUsableIds);
        }

        let ids: Vec<String> = records.iter().map(|r| r.youtube_id().to_owned()).collect();
        let local_tags: HashMap<&str, Vec<&str>> = records
            .iter()
            .map(|r| (r.youtube_id(), r.tags()))
            .collect();

        info!("Enriching {} videos", ids.len());

        let mut lookups: HashMap<String, Lookup> = HashMap::with_capacity(ids.len());
        let mut skipped: HashSet<String> = HashSet::new();

        let nb_batches = ids.len().div_ceil(MAX_IDS_PER_REQUEST);
        for (n, batch) in ids.chunks(MAX_IDS_PER_REQUEST).enumerate() {
            debug!("Batch {}/{nb_batches}: {} ids", n + 1, batch.len());

            let items = self.source.list_videos(batch).map_err(|err| {
                err.wrap_err_with(|| format!("Could not fetch batch {}/{nb_batches}", n + 1))
            })?;

            for item in items {
                if !batch.contains(&item.id) {
                    debug!("Ignoring video {} that was not requested", item.id);
                    continue;
                }

                let local = local_tags
                    .get(item.id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                if self.is_excluded(&item, local) {
                    debug!("Skipping video {} because of its tags", item.id);
                    lookups.remove(&item.id);
                    skipped.insert(item.id);
                    continue;
                }

                if skipped.contains(&item.id) {
                    continue;
                }

                let views = item.view_count.unwrap_or(0);
                let lookup = Lookup {
                    views,
                    description: first_line(&item.description).to_owned(),
                    difficulty: Difficulty::from_views(views),
                };
                lookups.insert(item.id, lookup);
            }
        }

        let requested = records.len();
        let sketches: Vec<SketchRecord> = records
            .into_iter()
            .filter_map(|record| {
                let Some(lookup) = lookups.remove(record.youtube_id()) else {
                    if !skipped.contains(record.youtube_id()) {
                        debug!(
                            "Video {} ({}) not returned by the API, dropping it",
                            record.youtube_id(),
                            record.name().unwrap_or("unnamed"),
                        );
                    }
                    return None;
                };
                Some(merge(record, lookup))
            })
            .collect();

        Ok(EnrichReport {
            requested,
            skipped: skipped.len(),
            missing: requested - sketches.len() - skipped.len(),
            sketches,
        })
    }

    /// Whether the video or the local record carries an excluded tag
    fn is_excluded(&self, item: &VideoItem, local_tags: &[&str]) -> bool {
        item.tags
            .iter()
            .map(String::as_str)
            .chain(local_tags.iter().copied())
            .map(|tag| tag.to_lowercase())
            .any(|tag| self.exclude_tags.contains(&tag))
    }
}

/// Read the records to enrich, indexed by video id.
///
/// If several records share an id, the last one wins but takes the place
/// of the first one. Malformed records are skipped.
fn index_records(entries: Vec<Value>) -> Vec<SketchRecord> {
    let mut records: Vec<SketchRecord> = Vec::with_capacity(entries.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(entries.len());

    for entry in entries {
        let record = match SketchRecord::try_from(entry) {
            Ok(record) => record,
            Err(err) => {
                debug!("Skipping record: {err}");
                continue;
            }
        };

        match positions.entry(record.youtube_id().to_owned()) {
            Entry::Occupied(pos) => {
                warn!(
                    "Duplicate video id {}, keeping the last record",
                    record.youtube_id()
                );
                records[*pos.get()] = record;
            }
            Entry::Vacant(pos) => {
                pos.insert(records.len());
                records.push(record);
            }
        }
    }

    records
}

/// Apply the lookup to the record.
///
/// The views and difficulty are always replaced, the description only if there is none.
fn merge(mut record: SketchRecord, lookup: Lookup) -> SketchRecord {
    record.set_views(lookup.views);
    record.set_difficulty(lookup.difficulty);
    if !record.has_description() {
        record.set_description(lookup.description);
    }
    record
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default()
}

/// Run the enrichment stage: read the records, enrich them and write the result
pub fn run_enrich(config: &EnrichConfig, source: &dyn VideoMetadataSource) -> Result<EnrichReport> {
    let entries = read_entries(&config.input)?;

    let report = Enricher::new(source, &config.exclude_tags)
        .enrich(entries)
        .map_err(|err| {
            err.wrap_err_with(|| format!("Could not enrich {}", config.input.display()))
        })?;

    write_json_pretty(&config.output, &report.sketches)?;

    info!(
        "Saved {} of {} sketches to {}",
        report.sketches.len(),
        report.requested,
        config.output.display()
    );
    info!(
        "Filtered out {} videos tagged with one of: {}",
        report.skipped,
        config
            .exclude_tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    if report.missing > 0 {
        warn!("{} videos were not returned by the API", report.missing);
    }
    for difficulty in Difficulty::ALL {
        info!("{:>6}: {}", difficulty, report.count(difficulty));
    }

    Ok(report)
}
