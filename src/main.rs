mod batch;
mod fetch;
mod parse;
mod resolve;
mod settings;
mod theme;
mod util;
mod write;

use clap::{arg, Arg, ArgAction, Command};
use eyre::{eyre, Result};
use log::{info, warn};
use std::path::PathBuf;

use batch::Batch;
use fetch::LastFm;
use resolve::{Mode, Resolver};
use settings::{get_settings, load, SETTINGS};
use write::FileTagSink;

pub const CLI_NAME: &str = "lyriclabel";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GITHUB: &str = "github.com/lyriclabel/lyriclabel";

// logging constants
pub const LYRICLABEL_LOGLEVEL: &str = "LYRICLABEL_LOGLEVEL";
pub const LYRICLABEL_STYLE: &str = "LYRICLABEL_STYLE";

fn cli() -> Command<'static> {
    Command::new(CLI_NAME)
        .about("Fetch missing song metadata from Last.fm and write it into your files")
        .version(VERSION)
        .arg(
            arg!(QUIET: -q --quiet "Always pick the first search result and only report failures")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(CONFIG: -c --config [FILE] "Use this config file instead of the default one")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("PRINT_CONFIG")
                .long("print-config")
                .help("Print the current configuration in TOML and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(PATH: [PATH] "Song file or folder to tag")
                .value_parser(clap::value_parser!(PathBuf))
                .required_unless_present("PRINT_CONFIG"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let matches = cli().get_matches();
    let quiet = matches.get_flag("QUIET");
    theme::init_logger(quiet);

    let config = matches.get_one::<PathBuf>("CONFIG").map(PathBuf::as_path);
    SETTINGS.get_or_try_init(async { load(config) }).await?;
    if matches.get_flag("PRINT_CONFIG") {
        return settings::print();
    }

    let settings = get_settings()?;
    settings::validate(settings)?;
    let path = matches
        .get_one::<PathBuf>("PATH")
        .ok_or(eyre!("Expected a path argument"))?;

    let mode = if quiet { Mode::Quiet } else { Mode::Interactive };
    let resolver = Resolver::new(
        Box::new(LastFm::new(&settings.lastfm)),
        mode.selector(),
        settings.sentinel.clone(),
    );
    let batch = Batch::new(resolver, Box::new(FileTagSink), settings.extension.clone());

    // only an unusable path fails the run, everything else is in the report
    let report = batch.run(path).await?;

    let summary = format!(
        "Processed: {} tagged, {} failed, {} skipped",
        report.tagged,
        report.log.len(),
        report.skipped
    );
    if report.log.is_empty() {
        info!("{}", summary);
    } else {
        warn!("{}", summary);
        for entry in report.log.entries() {
            warn!("{}: {}", entry.path.display(), entry.reason);
        }
    }
    Ok(())
}
