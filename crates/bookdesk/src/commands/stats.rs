//! Statistics command handlers, plus the text blocks the dashboard reuses.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use bookdesk_core::api::{Activity, DashboardStats, MetricKind, MetricPeriod, OverviewPoint};
use bookdesk_core::{Console, sparkline};

use crate::cli::{GlobalOpts, OutputFormat, StatsArgs, StatsCommand};
use crate::error::CliError;
use crate::output;

const ALL_KINDS: [MetricKind; 3] = [MetricKind::Books, MetricKind::Downloads, MetricKind::Views];

// ── Text blocks ─────────────────────────────────────────────────────

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every numeric total in the stats payload, authors first.
pub(crate) fn totals(stats: &DashboardStats) -> Vec<(String, u64)> {
    let mut totals = vec![("Authors".to_owned(), stats.total_authors)];
    for (key, value) in &stats.extra {
        let count = value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()));
        if let Some(count) = count {
            let label = key.strip_prefix("total_").unwrap_or(key);
            totals.push((title_case(label), count));
        }
    }
    totals
}

pub(crate) fn metric_label(kind: MetricKind, period: MetricPeriod) -> String {
    format!("{} ({period})", title_case(&kind.to_string()))
}

/// `last_at` as "5 minutes ago"; unparseable stamps are shown as sent.
pub(crate) fn ago(raw: &str, now: DateTime<Utc>) -> String {
    let at = DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|t| t.and_utc()));
    let Ok(at) = at else {
        return raw.to_owned();
    };
    let secs = (now - at).num_seconds();
    match secs {
        i64::MIN..60 => "just now".to_owned(),
        60..3_600 => plural(secs / 60, "minute"),
        3_600..86_400 => plural(secs / 3_600, "hour"),
        _ => plural(secs / 86_400, "day"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

pub(crate) fn activity_lines(activity: &Activity, now: DateTime<Utc>) -> Vec<String> {
    let when = |at: &Option<String>| at.as_deref().map(|t| format!(", {}", ago(t, now))).unwrap_or_default();
    let mut lines = Vec::new();
    match activity.recent_download {
        Some(ref d) => lines.push(format!(
            "Latest download:  {} ({} downloads{})",
            d.title,
            d.count,
            when(&d.last_at)
        )),
        None => lines.push("Latest download:  none yet".to_owned()),
    }
    match activity.views_last_hour {
        Some(ref v) => lines.push(format!("Views last hour:  {}{}", v.count, when(&v.last_at))),
        None => lines.push("Views last hour:  0".to_owned()),
    }
    lines
}

pub(crate) fn overview_lines(points: &[OverviewPoint]) -> Vec<String> {
    let views: Vec<u64> = points.iter().map(|p| p.views).collect();
    let downloads: Vec<u64> = points.iter().map(|p| p.downloads).collect();
    vec![
        format!("Views      {}  {}", sparkline(&views), views.iter().sum::<u64>()),
        format!(
            "Downloads  {}  {}",
            sparkline(&downloads),
            downloads.iter().sum::<u64>()
        ),
    ]
}

// ── Rows ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    kind: MetricKind,
    #[tabled(rename = "Period")]
    period: MetricPeriod,
    #[tabled(rename = "Count")]
    count: u64,
}

#[derive(Tabled)]
struct OverviewRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Views")]
    views: u64,
    #[tabled(rename = "Downloads")]
    downloads: u64,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: StatsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut dashboard = console.dashboard();
    match args.command {
        StatsCommand::Summary => {
            let stats = dashboard.summary().await?;
            let out = output::render_single(
                global.output,
                stats.as_ref(),
                |s| {
                    totals(s)
                        .into_iter()
                        .map(|(label, n)| format!("{label:<12}{n}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                },
                |s| s.total_authors.to_string(),
            )?;
            output::print_output(&out, global.quiet);
        }

        StatsCommand::Activity => {
            let activity = dashboard.activity().await?;
            let now = Utc::now();
            let out = output::render_single(
                global.output,
                activity.as_ref(),
                |a| activity_lines(a, now).join("\n"),
                |a| a.views_last_hour.as_ref().map_or(0, |v| v.count).to_string(),
            )?;
            output::print_output(&out, global.quiet);
        }

        StatsCommand::Metrics { kind, period } => {
            let kinds = kind.map_or_else(|| ALL_KINDS.to_vec(), |k| vec![k]);
            let mut rows = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let count = dashboard.metric(kind, period).await?;
                rows.push(MetricRow { kind, period, count });
            }
            let out = output::render_list(
                global.output,
                &rows,
                MetricRow::clone,
                |r| format!("{}={}", r.kind, r.count),
            )?;
            output::print_output(&out, global.quiet);
        }

        StatsCommand::Overview { days } => {
            dashboard.set_days(days)?;
            let overview = dashboard.overview().await?;
            let out = output::render_list(
                global.output,
                &overview.items,
                |p| OverviewRow {
                    date: p.date.clone().unwrap_or_default(),
                    views: p.views,
                    downloads: p.downloads,
                },
                |p| format!("{}\t{}\t{}", p.date.as_deref().unwrap_or("-"), p.views, p.downloads),
            )?;
            output::print_output(&out, global.quiet);
            if global.output == OutputFormat::Table && !overview.items.is_empty() {
                for line in overview_lines(&overview.items) {
                    output::status(global, &line);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn relative_times() {
        assert_eq!(ago("2026-03-01T11:59:30Z", now()), "just now");
        assert_eq!(ago("2026-03-01 11:55:00", now()), "5 minutes ago");
        assert_eq!(ago("2026-03-01T11:00:00+00:00", now()), "1 hour ago");
        assert_eq!(ago("2026-02-26 12:00:00", now()), "3 days ago");
        assert_eq!(ago("yesterday", now()), "yesterday");
    }

    #[test]
    fn totals_pick_up_numeric_extras() {
        let stats = DashboardStats {
            total_authors: 12,
            extra: BTreeMap::from([
                ("total_books".to_owned(), json!(40)),
                ("total_downloads".to_owned(), json!("1200")),
                ("generated_at".to_owned(), json!("2026-03-01")),
            ]),
        };
        assert_eq!(
            totals(&stats),
            vec![
                ("Authors".to_owned(), 12),
                ("Books".to_owned(), 40),
                ("Downloads".to_owned(), 1200),
            ]
        );
    }

    #[test]
    fn metric_labels() {
        assert_eq!(metric_label(MetricKind::Downloads, MetricPeriod::Month), "Downloads (30d)");
    }

    #[test]
    fn activity_without_data() {
        let lines = activity_lines(&Activity::default(), now());
        assert_eq!(lines, vec!["Latest download:  none yet", "Views last hour:  0"]);
    }
}
