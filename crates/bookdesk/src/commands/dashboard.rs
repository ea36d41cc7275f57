//! Dashboard command: every section in one view, plus the chart as SVG.

use chrono::Utc;

use bookdesk_core::{ChartState, Console, DashboardSnapshot};

use crate::cli::{DashboardArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::stats::{activity_lines, metric_label, overview_lines, totals};
use super::util;

fn render_text(snapshot: &DashboardSnapshot) -> String {
    let mut out = Vec::new();

    out.push("Totals".to_owned());
    match snapshot.stats {
        Some(ref stats) => {
            for (label, n) in totals(stats) {
                out.push(format!("  {label:<22}{n}"));
            }
        }
        None => out.push("  unavailable".to_owned()),
    }

    out.push(String::new());
    out.push("Metrics".to_owned());
    for card in &snapshot.metrics {
        let count = card.count.map_or_else(|| "-".to_owned(), |n| n.to_string());
        out.push(format!("  {:<22}{count}", metric_label(card.kind, card.period)));
    }

    out.push(String::new());
    out.push("Activity".to_owned());
    match snapshot.activity {
        Some(ref activity) => {
            out.extend(activity_lines(activity, Utc::now()).into_iter().map(|l| format!("  {l}")));
        }
        None => out.push("  unavailable".to_owned()),
    }

    out.push(String::new());
    out.push(format!("Last {} days", snapshot.days));
    match snapshot.overview {
        Some(ref overview) if !overview.items.is_empty() => {
            out.extend(overview_lines(&overview.items).into_iter().map(|l| format!("  {l}")));
        }
        Some(_) => out.push("  No data".to_owned()),
        None => out.push("  unavailable".to_owned()),
    }

    out.join("\n")
}

pub async fn handle(console: &Console, args: DashboardArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut dashboard = console.dashboard();
    dashboard.set_days(args.days)?;
    for (kind, period) in args.cards {
        dashboard.set_period(kind, period);
    }

    let pb = util::spinner(global, "Loading dashboard");
    let snapshot = dashboard.snapshot().await;
    pb.finish_and_clear();

    // Sections degrade one by one; nothing at all usually means the
    // session or the server is gone, so surface that instead.
    if snapshot.stats.is_none() && snapshot.activity.is_none() && snapshot.overview.is_none() {
        dashboard.summary().await?;
    }

    let out = output::render_single(global.output, &snapshot, render_text, |s| s.days.to_string())?;
    output::print_output(&out, global.quiet);

    if let Some(path) = args.svg {
        match dashboard.chart(args.width).await {
            ChartState::Ready(geometry) => {
                std::fs::write(&path, geometry.to_svg())?;
                output::status(global, &format!("Chart written to {}", path.display()));
            }
            state => {
                output::status(global, state.message().unwrap_or("No data"));
            }
        }
    }
    Ok(())
}
