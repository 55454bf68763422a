use std::path::PathBuf;

use clap::Parser;

use crate::roster::TrackedIdentity;

pub const DEFAULT_LOG_FILTER: &str = "matchstats=info";

/// Aggregate replay statistics for one player across many matches.
#[derive(Debug, Parser)]
#[command(name = "matchstats", version, about)]
pub struct Cli {
    /// Directory holding one `<match_id>.json` record per match
    #[arg(long, env = "MATCHSTATS_RECORDS_DIR")]
    pub records_dir: PathBuf,

    /// Display name of the tracked player
    #[arg(long, env = "MATCHSTATS_DISPLAY_NAME", default_value = "")]
    pub display_name: String,

    /// Connect code of the tracked player, e.g. `ABCD#123`
    #[arg(long, env = "MATCHSTATS_CONNECT_CODE", default_value = "")]
    pub connect_code: String,

    /// Matches to aggregate; every record in the directory when omitted
    #[arg(long = "match", value_name = "MATCH_ID")]
    pub matches: Vec<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub records_dir: PathBuf,
    /// `None` when neither a name nor a code was given.
    pub identity: Option<TrackedIdentity>,
    pub matches: Option<Vec<String>>,
    pub pretty: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let identity = (!cli.display_name.is_empty() || !cli.connect_code.is_empty())
            .then(|| TrackedIdentity::new(cli.display_name, cli.connect_code));

        Self {
            records_dir: cli.records_dir,
            identity,
            matches: (!cli.matches.is_empty()).then_some(cli.matches),
            pretty: cli.pretty,
        }
    }
}
