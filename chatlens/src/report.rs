//! chatlens-report - terminal summaries over the extracted message table
//!
//! Loads the flat table, applies any requested filters, and prints totals,
//! a per-contact breakdown, an activity series and the weekly heatmap. With
//! `--search` it prints matching messages inside their chat context instead.

use anyhow::{Context, Result};
use chatlens_core::analytics::{
    Breakdown, Metric, TimeBucket, TimeSeries, WeeklyHeatmap, DAY_LABELS,
};
use chatlens_core::format::{direction_icon, highlight, hour_label};
use chatlens_core::{load, Config, ContextWindow, Field, FieldValue, MessageTable};
use clap::Parser;

/// Shade ramp for heatmap cells, blank through busiest.
const SHADE: [char; 5] = [' ', '.', ':', '+', '#'];

const BAR_WIDTH: f64 = 40.0;

#[derive(Parser)]
#[command(name = "chatlens-report")]
#[command(about = "Summarize the extracted message table")]
#[command(version)]
struct Args {
    /// Start date (inclusive), e.g. 2023-01-01
    #[arg(long)]
    from: Option<String>,

    /// End date (exclusive)
    #[arg(long)]
    until: Option<String>,

    /// Only rows for this contact (repeatable)
    #[arg(short, long)]
    contact: Vec<String>,

    /// Search message text and show each match in context
    #[arg(short, long)]
    search: Option<String>,

    /// Rows of context on either side of a search match
    #[arg(long, default_value = "3")]
    radius: usize,

    /// Match search case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Time bucket for the activity series: day, week, month or year
    #[arg(short, long, default_value = "month")]
    bucket: String,

    /// Metric: count, length or mean
    #[arg(short, long, default_value = "count")]
    metric: String,

    /// Fold breakdown slices below this share (percent) into "other"
    #[arg(long, default_value = "3.0")]
    min_share: f64,

    /// Timezone for local dates (IANA name, default: configured or system)
    #[arg(short, long)]
    timezone: Option<String>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = chatlens_core::logging::init(&config.logging).ok();

    let bucket: TimeBucket = args.bucket.parse().map_err(anyhow::Error::msg)?;
    let metric: Metric = args.metric.parse().map_err(anyhow::Error::msg)?;

    let timezone = args
        .timezone
        .as_deref()
        .or(config.load.timezone.as_deref());
    let map_path = config.map_path();
    let table = load::load(&Config::snapshot_path(), Some(&map_path), timezone)
        .context("failed to load message table")?;

    if table.is_empty() {
        println!("No messages in the table.");
        println!("Run 'chatlens-extract' to rebuild it from the store.");
        return Ok(());
    }

    let view = apply_filters(table, &args)?;
    if view.is_empty() {
        println!("No messages in range.");
        return Ok(());
    }

    // Search mode renders context windows instead of the summary.
    if let Some(ref query) = args.search {
        let windows = view.context_search(query, args.radius, !args.case_sensitive);
        if args.format == "json" {
            print_json_windows(query, &windows)?;
        } else {
            print_text_windows(query, &windows, !args.case_sensitive);
        }
        return Ok(());
    }

    let series = TimeSeries::compute(&view, bucket, None, metric);
    let breakdown = Breakdown::compute(&view, Field::Contact, metric);
    let heatmap = WeeklyHeatmap::compute(&view);

    if args.format == "json" {
        print_json_report(&view, &series, &breakdown, &heatmap)?;
    } else {
        print_text_report(&view, &series, &breakdown, &heatmap, args.min_share);
    }

    Ok(())
}

fn apply_filters(table: MessageTable, args: &Args) -> Result<MessageTable> {
    let mut view = table;
    if args.from.is_some() || args.until.is_some() {
        view = view
            .filt_date(args.from.as_deref(), args.until.as_deref())
            .context("invalid date bound")?;
    }
    if !args.contact.is_empty() {
        let values: Vec<FieldValue> = args
            .contact
            .iter()
            .map(|c| FieldValue::Str(c.clone()))
            .collect();
        view = view.filt_any(Field::Contact, &values);
    }
    Ok(view)
}

// ============================================
// Text output
// ============================================

fn print_text_report(
    table: &MessageTable,
    series: &TimeSeries,
    breakdown: &Breakdown,
    heatmap: &WeeklyHeatmap,
    min_share: f64,
) {
    let sent = table.iter().filter(|m| m.is_from_me).count();

    println!();
    println!("MESSAGES");
    println!("   Rows:     {}", table.len());
    println!("   Sent:     {:<8} Received: {}", sent, table.len() - sent);
    if let (Some(first), Some(last)) = (table.messages().first(), table.messages().last()) {
        println!(
            "   Span:     {} to {}",
            first.date_local.format("%Y-%m-%d"),
            last.date_local.format("%Y-%m-%d")
        );
    }
    println!();

    println!("ACTIVITY BY {}", series.bucket.as_str().to_uppercase());
    if let Some(values) = series.groups.get("all") {
        let max = values.iter().cloned().fold(0.0_f64, f64::max);
        for (label, value) in series.labels().iter().zip(values) {
            let width = if max > 0.0 {
                (value / max * BAR_WIDTH).round() as usize
            } else {
                0
            };
            println!("   {:<10} {:>8.0} {}", label, value, "#".repeat(width));
        }
    }
    println!();

    println!("CONTACTS");
    let (folded, _rest) = breakdown.fold_slivers(min_share);
    for entry in &folded.entries {
        println!(
            "   {:<20} {:>8.0}  {:>5.1}%",
            entry.key, entry.value, entry.share
        );
    }
    println!();

    println!("WEEKLY RHYTHM");
    print_heatmap(heatmap);
    if let Some((day, hour, count)) = heatmap.peak() {
        println!(
            "   Peak: {} {} ({} messages)",
            DAY_LABELS[day],
            hour_label(hour as u8),
            count
        );
    }
    println!();
}

/// One shaded character per (day, hour) cell, hour ruler on top.
fn print_heatmap(heatmap: &WeeklyHeatmap) {
    let max = heatmap.max().max(1);
    println!("        0     6     12    18");
    for (day, row) in heatmap.grid().iter().enumerate() {
        let cells: String = row.iter().map(|&count| shade(count, max)).collect();
        println!("   {}    {}", DAY_LABELS[day], cells);
    }
}

fn shade(count: u64, max: u64) -> char {
    if count == 0 {
        return ' ';
    }
    let steps = SHADE.len() as u64 - 1;
    let idx = (count * steps + max - 1) / max;
    SHADE[(idx as usize).min(SHADE.len() - 1)]
}

fn print_text_windows(query: &str, windows: &[ContextWindow], fold_case: bool) {
    if windows.is_empty() {
        println!("No matches for '{}'.", query);
        return;
    }

    println!("{} match(es) for '{}':", windows.len(), query);
    for window in windows {
        println!();
        println!(
            "--- {} (chat {}) ---",
            window.matched().contact,
            window.chat_id
        );
        for message in &window.messages {
            println!(
                "{} {} {}",
                message.timestamp_display(),
                direction_icon(message.is_from_me),
                highlight(&message.text, query, fold_case)
            );
        }
    }
}

// ============================================
// JSON output
// ============================================

fn print_json_report(
    table: &MessageTable,
    series: &TimeSeries,
    breakdown: &Breakdown,
    heatmap: &WeeklyHeatmap,
) -> Result<()> {
    let sent = table.iter().filter(|m| m.is_from_me).count();

    let output = serde_json::json!({
        "messages": {
            "rows": table.len(),
            "sent": sent,
            "received": table.len() - sent,
        },
        "series": {
            "bucket": series.bucket.as_str(),
            "labels": series.labels(),
            "groups": series.groups,
        },
        "contacts": breakdown.entries.iter().map(|e| serde_json::json!({
            "contact": e.key,
            "value": e.value,
            "share": e.share,
        })).collect::<Vec<_>>(),
        "heatmap": {
            "days": DAY_LABELS,
            "grid": heatmap.grid(),
        },
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_json_windows(query: &str, windows: &[ContextWindow]) -> Result<()> {
    let output = serde_json::json!({
        "query": query,
        "matches": windows.iter().map(|w| serde_json::json!({
            "chat_id": w.chat_id,
            "contact": w.matched().contact,
            "match_index": w.match_index,
            "messages": w.messages,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
