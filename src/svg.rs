use crate::stats::StatsSummary;
use crate::theme::Theme;
use crate::videos::{FALLBACK_MESSAGE, Video};

const START_Y: i32 = 30;
const LINE_HEIGHT: i32 = 20;
const LEFT_PADDING: f32 = 15.0;
const RIGHT_PADDING: f32 = 30.0;
const CHAR_WIDTH: f32 = 9.6;
const MIN_COL_CHARS: usize = 40;

// Utilities for building SVG content

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Key, dot leader and value for one aligned row.
pub fn build_stat_row(key: &str, value: &str, align_width: usize) -> (String, String, String) {
    let key_part = format!("{key}: ");
    let base_len = key_part.chars().count() + value.chars().count();
    let available = align_width.saturating_sub(base_len);

    let dots = match available {
        0 => "".to_string(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => ".".repeat(n),
    };

    (key_part, dots, value.to_string())
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(base.chars().count()) + 2;
    format!("{base}{}", "-".repeat(dash_count))
}

enum Line {
    Header(String),
    Blank,
    Stat { k: String, d: String, v: String },
    Text(String),
}

fn build_lines(stats: &StatsSummary, account: &str, videos: &[Video]) -> (Vec<Line>, usize) {
    let rows = [
        ("Commits", stats.total_commits.to_string()),
        ("Stars", stats.total_stars.to_string()),
        ("Pull Requests", stats.pull_requests.to_string()),
        ("Issues", stats.issues.to_string()),
    ];

    let video_titles: Vec<String> = if videos.is_empty() {
        vec![FALLBACK_MESSAGE.to_string()]
    } else {
        videos.iter().map(|v| v.title.clone()).collect()
    };

    let align_width = rows
        .iter()
        .map(|(k, v)| k.len() + 2 + v.chars().count())
        .chain(std::iter::once(stats.contribution_text.chars().count()))
        .chain(video_titles.iter().map(|t| t.chars().count() + 2))
        .max()
        .unwrap_or(0)
        .max(MIN_COL_CHARS);

    let mut lines = vec![Line::Header(build_header_line(
        &format!("{account}@github"),
        align_width,
    ))];

    for (key, value) in &rows {
        let (k, d, v) = build_stat_row(key, value, align_width);
        lines.push(Line::Stat { k, d, v });
    }

    lines.push(Line::Blank);
    lines.push(Line::Header(build_header_line("- Contributions", align_width)));
    lines.push(Line::Text(stats.contribution_text.clone()));

    lines.push(Line::Blank);
    lines.push(Line::Header(build_header_line("- Videos", align_width)));
    lines.extend(video_titles.into_iter().map(Line::Text));

    (lines, align_width)
}

/// Render the stat card for one theme.
pub fn generate_svg(stats: &StatsSummary, account: &str, videos: &[Video], theme: Theme) -> String {
    let colors = theme.colors();
    let (lines, align_width) = build_lines(stats, account, videos);

    let mut body = String::new();
    for (i, line) in lines.iter().enumerate() {
        let y = START_Y + (i as i32) * LINE_HEIGHT;

        match line {
            Line::Blank => {}
            Line::Header(text) => {
                body.push_str(&format!(
                    r#"<tspan x="{LEFT_PADDING}" y="{y}">{}</tspan>
"#,
                    escape_xml(text)
                ));
            }
            Line::Stat { k, d, v } => {
                body.push_str(&format!(
                    r#"<tspan x="{LEFT_PADDING}" y="{y}" class="cc">. </tspan>
<tspan class="key">{}</tspan><tspan class="cc">{}</tspan><tspan class="value">{}</tspan>
"#,
                    escape_xml(k),
                    escape_xml(d),
                    escape_xml(v)
                ));
            }
            Line::Text(text) => {
                body.push_str(&format!(
                    r#"<tspan x="{LEFT_PADDING}" y="{y}" class="cc">. </tspan>
<tspan class="value">{}</tspan>
"#,
                    escape_xml(text)
                ));
            }
        }
    }

    let w = LEFT_PADDING + (align_width as f32 + 2.0) * CHAR_WIDTH + RIGHT_PADDING;
    let h = lines.len() as f32 * LINE_HEIGHT as f32 + START_Y as f32;

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}px" height="{h}px"
     font-family="ConsolasFallback,Consolas,monospace"
     font-size="16px">

<style>
.key      {{ fill: {key}; }}
.value    {{ fill: {value}; }}
.cc       {{ fill: {cc}; }}
</style>

<rect width="{w}px" height="{h}px" fill="{bg}" rx="15"/>

<text fill="{text}" xml:space="preserve">
{body}
</text>

</svg>
"#,
        bg = colors.bg,
        text = colors.text,
        key = colors.key,
        value = colors.value,
        cc = colors.cc,
    )
}
