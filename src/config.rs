use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::contributions::{self, YearSelector};
use crate::{github, videos};

pub const DEFAULT_ACCOUNT: &str = "Shahriar-Ferdoush";
pub const DEFAULT_VIDEOS: [&str; 3] = ["HBuN-4c3BBI", "yjATL_dwYC4", "8eW4sxxyY1s"];

/// Generate the portfolio's GitHub stats payload, themed stat cards and video list.
#[derive(Debug, Parser)]
#[command(name = "portfolio-stats", version)]
pub struct Args {
    /// Account whose public activity is summarized.
    #[arg(long, env = "PORTFOLIO_ACCOUNT", default_value = DEFAULT_ACCOUNT)]
    pub account: String,

    /// Contribution window: `last` or a four digit year.
    #[arg(long, default_value = "last")]
    pub year: YearSelector,

    /// Earliest year offered in the year options.
    #[arg(long, default_value_t = 2015)]
    pub start_year: i32,

    /// Video ids to list (repeatable).
    #[arg(long = "video", default_values_t = DEFAULT_VIDEOS.map(String::from))]
    pub videos: Vec<String>,

    /// Directory the payload and cards are written to.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Token for the GitHub API; raises the rate limit when set.
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API.
    #[arg(long, default_value = github::DEFAULT_BASE_URL)]
    pub github_api: String,

    /// Base URL of the contribution histogram API.
    #[arg(long, default_value = contributions::DEFAULT_BASE_URL)]
    pub contributions_api: String,

    /// Base URL of the video metadata embed service.
    #[arg(long, default_value = videos::DEFAULT_BASE_URL)]
    pub embed_api: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Flip the stored theme preference before rendering.
    #[arg(long)]
    pub toggle_theme: bool,

    /// Preference file (defaults to the platform config directory).
    #[arg(long)]
    pub prefs: Option<PathBuf>,
}

impl Args {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_site() {
        let args = Args::try_parse_from(["portfolio-stats"]).unwrap();

        assert_eq!(args.year, YearSelector::Last);
        assert_eq!(args.start_year, 2015);
        assert_eq!(args.videos, DEFAULT_VIDEOS.map(String::from).to_vec());
        assert_eq!(args.timeout(), Duration::from_secs(10));
        assert!(!args.toggle_theme);
    }

    #[test]
    fn parses_explicit_year_and_videos() {
        let args = Args::try_parse_from([
            "portfolio-stats",
            "--account",
            "octo",
            "--year",
            "2022",
            "--video",
            "a",
            "--video",
            "b",
        ])
        .unwrap();

        assert_eq!(args.account, "octo");
        assert_eq!(args.year, YearSelector::Year(2022));
        assert_eq!(args.videos, vec!["a", "b"]);
    }

    #[test]
    fn rejects_bad_year() {
        assert!(Args::try_parse_from(["portfolio-stats", "--year", "soon"]).is_err());
    }
}
