mod cli;
mod enrich;
mod filter;
mod io;
mod logging;
mod outside;
mod result;
mod settings;
mod title_filter;
mod types;

use miette::Result;
use tracing::{debug, info};

use crate::{
    cli::{parse_args, Stage},
    enrich::run_enrich,
    filter::run_filter,
    logging::init_logging,
    outside::YoutubeApi,
    settings::Settings,
};

fn main() -> Result<()> {
    // Initialize the CLI & logging
    let args = parse_args();
    init_logging(args.log_level)?;
    debug!("Stage {:?}, configuration file {:?}", args.stage, args.config);

    let settings = Settings::load(args.config.as_deref(), args.overrides)?;

    match args.stage {
        Stage::Filter => {
            debug!("{:?}", settings.filter);
            run_filter(&settings.filter)?;
        }
        Stage::Enrich => {
            // Check the credentials before reading anything
            let config = settings.enrich_config()?;
            let api = YoutubeApi::new(&config.api_url, &config.api_key)?;
            run_enrich(&config, &api)?;
        }
    }

    info!("Done");
    Ok(())
}
