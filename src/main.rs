mod config;
mod contributions;
mod error;
mod github;
mod stats;
mod svg;
mod theme;
mod videos;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use contributions::{ContributionsClient, YearSelector};
use github::GithubClient;
use serde::Serialize;
use stats::StatsSummary;
use std::fs;
use theme::{PreferenceStore, Theme};
use videos::{EmbedClient, FALLBACK_MESSAGE, Video};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Contribution {
    year: String,
    text: String,
    chart_url: String,
}

/// Everything the static site renders, written as `portfolio.json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Portfolio {
    account: String,
    stats: StatsSummary,
    contribution: Contribution,
    year_options: Vec<String>,
    theme: Theme,
    videos: Vec<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_message: Option<&'static str>,
}

fn resolve_theme(args: &config::Args) -> Theme {
    let store = match &args.prefs {
        Some(path) => PreferenceStore::new(path),
        None => match PreferenceStore::at_default_location() {
            Ok(store) => store,
            Err(e) => {
                log::warn!("Theme preference unavailable: {e}");
                return Theme::default();
            }
        },
    };

    let mut theme = store.load_theme().unwrap_or_else(|e| {
        log::warn!("Could not read {}: {e}", store.path().display());
        Theme::default()
    });

    if args.toggle_theme {
        theme = theme.toggled();
        match store.save_theme(theme) {
            Ok(()) => log::info!("Theme preference set to {theme}"),
            Err(e) => log::warn!("Could not save theme preference: {e}"),
        }
    }

    theme
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = config::Args::parse();
    let timeout = args.timeout();
    let account = args.account.as_str();

    let github = GithubClient::new(timeout)?
        .with_base_url(&args.github_api)
        .with_token(args.token.clone());
    let contributions =
        ContributionsClient::new(timeout)?.with_base_url(&args.contributions_api);
    let embed = EmbedClient::new(timeout)?.with_base_url(&args.embed_api);

    let theme = resolve_theme(&args);

    let stats = stats::aggregate(&github, &contributions, account).await;

    // The aggregate already covers the last year; only re-query for an explicit one.
    let contribution_text = match args.year {
        YearSelector::Last => stats.contribution_text.clone(),
        selector => contributions.select_year(account, selector).await,
    };

    let videos = embed.fetch_videos(&args.videos).await;

    let portfolio = Portfolio {
        account: account.to_string(),
        contribution: Contribution {
            year: args.year.to_string(),
            text: contribution_text,
            chart_url: contributions::chart_url(args.year, theme, account),
        },
        year_options: contributions::year_options(Utc::now().year(), args.start_year),
        theme,
        video_message: videos.is_empty().then_some(FALLBACK_MESSAGE),
        stats,
        videos,
    };

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let payload_path = args.out_dir.join("portfolio.json");
    fs::write(&payload_path, serde_json::to_string_pretty(&portfolio)?)
        .with_context(|| format!("Failed to write {}", payload_path.display()))?;
    log::info!("Wrote {}", payload_path.display());

    for theme in [Theme::Dark, Theme::Light] {
        let svg = svg::generate_svg(&portfolio.stats, account, &portfolio.videos, theme);
        let path = args.out_dir.join(format!("{theme}_mode.svg"));
        fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }

    println!(
        "Generated portfolio.json, dark_mode.svg and light_mode.svg in {}",
        args.out_dir.display()
    );

    Ok(())
}
