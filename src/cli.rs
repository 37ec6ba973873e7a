use std::path::PathBuf;

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use config::Value;
use indoc::indoc;
use tracing::Level;

/// The stage to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filter,
    Enrich,
}

#[derive(Debug)]
pub struct Args {
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    pub log_level: Level,
    pub stage: Stage,

    /// Settings given on the command line, as `(key, value)`
    pub overrides: Vec<(&'static str, Value)>,
}

/// Parse the process arguments, exiting on error or `--help`
pub fn parse_args() -> Args {
    Args::from_matches(&cli().get_matches())
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse()
        .map_err(|_| format!("'{s}' is not one of error, warn, info, debug, trace"))
}

fn cli() -> Command {
    command!()
        .about("Build a curated catalog of comedy sketch videos")
        .long_about(indoc! {"
            Build a curated catalog of comedy sketch videos.

            The catalog is built in two stages, run one after the other:
              1. `filter` keeps the videos of a raw listing that look like single sketches
              2. `enrich` adds view counts, descriptions and a difficulty tier to each sketch

            Every option can also be set in the configuration file or with
            SKETCH_CATALOG__<SECTION>__<KEY> environment variables,
            e.g. SKETCH_CATALOG__ENRICH__API_KEY.
        "})
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("TOML configuration file [default: sketch-catalog.toml if it exists]"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(parse_level)
                .default_value("info")
                .global(true)
                .help("Maximum level of the logs: error, warn, info, debug or trace"),
        )
        .subcommand(
            Command::new("filter")
                .about("Keep the videos of a raw listing that are single sketches")
                .long_about(indoc! {"
                    Keep the videos of a raw listing that are single sketches.

                    The input is a JSON list of videos with an `id` and a `title`,
                    or an object holding that list in `entries`.
                    Videos whose title looks like a compilation, a trailer, an interview...
                    are left out. The output is the list of `{name, videoId}`,
                    sorted by name.
                "})
                .arg(input_arg())
                .arg(output_arg())
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .value_name("REGEX")
                        .action(ArgAction::Append)
                        .help("Case-insensitive title pattern to exclude. Replaces the default patterns. Can be repeated"),
                ),
        )
        .subcommand(
            Command::new("enrich")
                .about("Add views, description and difficulty to the sketches")
                .long_about(indoc! {"
                    Add views, description and difficulty to the sketches.

                    Each record must have a `youtubeId` (or `videoId`). The video
                    metadata is fetched from the YouTube Data API, 50 videos at a time.
                    Videos tagged as shorts or compilations, and videos the API does
                    not know about, are left out of the output.

                    Difficulty: easy above 15M views, medium above 4M, hard otherwise.
                "})
                .arg(input_arg())
                .arg(output_arg())
                .arg(
                    Arg::new("api-key")
                        .long("api-key")
                        .value_name("KEY")
                        .help("YouTube Data API key"),
                )
                .arg(
                    Arg::new("api-url")
                        .long("api-url")
                        .value_name("URL")
                        .help("Base URL of the YouTube Data API"),
                )
                .arg(
                    Arg::new("exclude-tag")
                        .long("exclude-tag")
                        .value_name("TAG")
                        .action(ArgAction::Append)
                        .help("Leave out videos with this tag. Replaces the default tags. Can be repeated"),
                ),
        )
}

fn input_arg() -> Arg {
    Arg::new("input")
        .long("input")
        .short('i')
        .value_name("FILE")
        .help("Input JSON file")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_name("FILE")
        .help("Output JSON file")
}

impl Args {
    fn from_matches(matches: &ArgMatches) -> Self {
        let config = matches.get_one::<PathBuf>("config").cloned();
        let log_level = matches
            .get_one::<Level>("log-level")
            .copied()
            .unwrap_or(Level::INFO);

        let mut overrides = Vec::new();
        let mut set = |key: &'static str, value: Option<Value>| {
            if let Some(value) = value {
                overrides.push((key, value));
            }
        };

        // Global options given after the subcommand are propagated back to `matches`
        let stage = match matches.subcommand() {
            Some(("enrich", sub)) => {
                set("enrich.input", string(sub, "input"));
                set("enrich.output", string(sub, "output"));
                set("enrich.api_key", string(sub, "api-key"));
                set("enrich.api_url", string(sub, "api-url"));
                set("enrich.exclude_tags", list(sub, "exclude-tag"));
                Stage::Enrich
            }
            Some(("filter", sub)) => {
                set("filter.input", string(sub, "input"));
                set("filter.output", string(sub, "output"));
                set("filter.patterns", list(sub, "pattern"));
                Stage::Filter
            }
            _ => unreachable!("a subcommand is required"),
        };

        Args {
            config,
            log_level,
            stage,
            overrides,
        }
    }
}

fn string(matches: &ArgMatches, id: &str) -> Option<Value> {
    matches.get_one::<String>(id).map(|s| Value::from(s.as_str()))
}

fn list(matches: &ArgMatches, id: &str) -> Option<Value> {
    matches
        .get_many::<String>(id)
        .map(|values| Value::from(values.cloned().collect::<Vec<String>>()))
}
