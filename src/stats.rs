use anyhow::Result;
use serde::Serialize;
use std::fmt;

use crate::contributions::{ContributionsClient, YearSelector, last_year_text};
use crate::github::{GithubClient, RepoSummary};

/// Only the first repositories are probed for commit counts.
pub const COMMIT_PROBE_LIMIT: usize = 20;

/// A displayed statistic: a real count, or a placeholder like `"500+"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(u64),
    Text(String),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(n) => f.write_str(&format_count(*n)),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_commits: StatValue,
    pub total_stars: StatValue,
    pub pull_requests: StatValue,
    pub issues: StatValue,
    pub contribution_text: String,
}

impl StatsSummary {
    /// Placeholder record shown when aggregation fails outright.
    pub fn fallback() -> Self {
        Self {
            total_commits: StatValue::Text("500+".to_string()),
            total_stars: StatValue::Text("50+".to_string()),
            pull_requests: StatValue::Text("25+".to_string()),
            issues: StatValue::Text("20+".to_string()),
            contribution_text: "1000+ contributions in the last year".to_string(),
        }
    }
}

/// Thousands-separated count, e.g. `1234567` -> `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

pub fn total_stars(repos: &[RepoSummary]) -> u64 {
    repos
        .iter()
        .map(|r| r.star_count)
        .fold(0, u64::saturating_add)
}

/// Outcome of probing one repository's commit count.
pub struct CommitProbe {
    pub repo: String,
    pub commits: Result<u64>,
}

/// Probe the first [`COMMIT_PROBE_LIMIT`] repositories one at a time. Unnamed
/// repositories cannot be addressed and are passed over.
pub async fn probe_commits(
    github: &GithubClient,
    account: &str,
    repos: &[RepoSummary],
) -> Vec<CommitProbe> {
    let mut probes = Vec::with_capacity(repos.len().min(COMMIT_PROBE_LIMIT));

    for repo in repos.iter().take(COMMIT_PROBE_LIMIT) {
        if repo.name.is_empty() {
            continue;
        }
        let commits = github.commit_probe(account, &repo.name).await;
        probes.push(CommitProbe {
            repo: repo.name.clone(),
            commits,
        });
    }

    probes
}

/// Sum of successful probes; failures are logged and skipped.
pub fn probed_commit_total(probes: &[CommitProbe]) -> u64 {
    probes
        .iter()
        .filter_map(|p| match &p.commits {
            Ok(n) => Some(*n),
            Err(e) => {
                log::warn!("Skipping commit count for {}: {e:#}", p.repo);
                None
            }
        })
        .fold(0, u64::saturating_add)
}

/// Gather the account's stats. Never fails: any error yields [`StatsSummary::fallback`].
pub async fn aggregate(
    github: &GithubClient,
    contributions: &ContributionsClient,
    account: &str,
) -> StatsSummary {
    match try_aggregate(github, contributions, account).await {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Error fetching GitHub stats: {e:#}");
            StatsSummary::fallback()
        }
    }
}

async fn try_aggregate(
    github: &GithubClient,
    contributions: &ContributionsClient,
    account: &str,
) -> Result<StatsSummary> {
    let profile = github.profile(account).await?;

    let repos = github.all_repos(account).await?;
    let stars = total_stars(&repos);
    log::debug!("{} repositories, {stars} stars", repos.len());

    let contributed = contributions.total(account, YearSelector::Last).await?;

    let probes = probe_commits(github, account, &repos).await;
    let commits = probed_commit_total(&probes);

    let pull_requests = github.authored_pull_requests(account).await?;
    let issues = github.authored_issues(account).await?;

    Ok(StatsSummary {
        total_commits: StatValue::Count(if commits > 0 {
            commits
        } else {
            profile.public_repos
        }),
        total_stars: StatValue::Count(stars),
        pull_requests: StatValue::Count(pull_requests),
        issues: StatValue::Count(issues),
        contribution_text: last_year_text(contributed),
    })
}
