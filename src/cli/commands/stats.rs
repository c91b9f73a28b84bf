//! `stocktake stats` command - Inventory statistics dashboard

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_number, open_store, open_workspace, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::stats::{self, Statistics};

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Show the thresholds behind the stock-health counts
    #[arg(long)]
    pub detailed: bool,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    // A collection failure still yields a renderable all-zero fallback
    let stats = match stats::collect(&store, chrono::Utc::now()) {
        Ok(stats) => stats,
        Err(degraded) => {
            eprintln!(
                "{} {}; showing zeroed metrics",
                style("!").yellow(),
                degraded
            );
            degraded.fallback
        }
    };

    match resolve_format(global, &config) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&stats).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&stats).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => print_dashboard(&stats, args.detailed),
    }

    Ok(())
}

fn print_dashboard(stats: &Statistics, detailed: bool) {
    let width = 68;

    println!("{}", style("Inventory Status").bold().underlined());
    println!("{}", "═".repeat(width));
    println!();

    print_two_columns(
        "INVENTORY",
        &format_inventory(stats),
        "STOCK HEALTH",
        &format_health(stats),
        width,
    );

    println!();

    print_two_columns(
        "GROWTH (30 DAYS)",
        &format_growth(stats),
        "ACTIVITY",
        &format_activity(stats),
        width,
    );

    if detailed {
        println!();
        println!("{}", style("THRESHOLDS").bold());
        println!("{:-<64}", "");
        println!(
            "  Low stock:  quantity below {}",
            format_number(stats::low_stock_threshold(stats.average_quantity))
        );
        println!(
            "  High value: price above {}",
            format_number(stats::high_value_threshold(stats.average_price))
        );
    }

    println!();
    println!("{}", "═".repeat(width));

    let trend = if stats.net_growth > 0 {
        style(format!("+{} product(s) over 30 days", stats.net_growth))
            .green()
            .bold()
    } else if stats.net_growth < 0 {
        style(format!("{} product(s) over 30 days", stats.net_growth))
            .red()
            .bold()
    } else {
        style("flat over 30 days".to_string()).dim()
    };
    println!("Inventory Trend: {}", trend);
}

fn format_inventory(s: &Statistics) -> Vec<String> {
    vec![
        format!("Products:   {}", s.total_products),
        format!("Value:      {}", format_number(s.total_value)),
        format!("Avg price:  {}", format_number(s.average_price)),
        format!("Avg qty:    {}", format_number(s.average_quantity)),
    ]
}

fn format_health(s: &Statistics) -> Vec<String> {
    let low = if s.low_stock_count > 0 {
        format!(
            "Low stock:  {} ({:.0}%) {}",
            s.low_stock_count,
            s.low_stock_pct,
            style("⚠").red()
        )
    } else {
        format!("Low stock:  {}", s.low_stock_count)
    };
    let high = format!(
        "High value: {} ({:.0}%)",
        s.high_value_count, s.high_value_pct
    );
    vec![low, high]
}

fn format_growth(s: &Statistics) -> Vec<String> {
    let sign = if s.net_growth > 0 { "+" } else { "" };
    vec![
        format!("New:        {}", s.recent_count),
        format!("Previous:   {}", s.previous_count),
        format!("Net:        {}{}", sign, s.net_growth),
    ]
}

fn format_activity(s: &Statistics) -> Vec<String> {
    let updated = match s.last_updated {
        Some(ts) => format!("Updated:    {}", ts.format("%Y-%m-%d %H:%M")),
        None => format!("Updated:    {}", style("never").dim()),
    };
    vec![updated]
}

fn print_two_columns(title1: &str, lines1: &[String], title2: &str, lines2: &[String], _width: usize) {
    let col_width = 32;

    println!("{:<col_width$} {}", style(title1).bold(), style(title2).bold());
    println!("{:-<col_width$} {:-<col_width$}", "", "");

    let max_lines = lines1.len().max(lines2.len());

    for i in 0..max_lines {
        let l1 = lines1.get(i).map(|s| s.as_str()).unwrap_or("");
        let l2 = lines2.get(i).map(|s| s.as_str()).unwrap_or("");
        println!("  {:<30} {}", l1, l2);
    }
}
