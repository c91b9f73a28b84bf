//! `stocktake import` command - Two-phase spreadsheet import

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{format_number, open_store, open_workspace, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::plan::{PlanError, PlanStore};
use crate::import::{apply, reconcile, Disposition};
use crate::sheet;

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Parse a spreadsheet and stage a reconciliation plan
    Preview(PreviewArgs),

    /// Apply the staged plan for a session
    Commit(CommitArgs),

    /// Print a ready-to-fill import template
    Template,
}

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// Spreadsheet file to reconcile (CSV)
    pub file: PathBuf,

    /// Session key to stage the plan under (default: config, then $USER)
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CommitArgs {
    /// Session key of the staged plan
    #[arg(long)]
    pub session: Option<String>,
}

pub fn run(cmd: ImportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ImportCommands::Preview(args) => run_preview(args, global),
        ImportCommands::Commit(args) => run_commit(args, global),
        ImportCommands::Template => run_template(),
    }
}

fn run_preview(args: PreviewArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }

    let session = args.session.unwrap_or_else(|| config.session());

    if !global.quiet {
        println!(
            "{} Reconciling {} against the inventory",
            style("→").blue(),
            style(args.file.display()).yellow()
        );
        println!();
    }

    let sheet = sheet::read(&args.file).map_err(|e| miette::miette!("{}", e))?;
    let plan = reconcile(&store, &sheet).map_err(|e| miette::miette!("{}", e))?;

    if plan.is_empty() {
        println!("Nothing to import: every data row was empty or a repeated header.");
        return Ok(());
    }

    let mut creates = 0usize;
    let mut updates = 0usize;
    for row in &plan {
        match &row.disposition {
            Disposition::Create => {
                creates += 1;
                if !global.quiet {
                    println!(
                        "{} Row {}: create {} ({}) - {} {} at {}",
                        style("✓").green(),
                        row.row,
                        style(truncate_str(&row.name, 30)).cyan(),
                        truncate_str(&row.brand, 20),
                        format_number(row.quantity),
                        row.unit,
                        format_number(row.price)
                    );
                }
            }
            Disposition::Update {
                id,
                current_price,
                current_quantity,
                ..
            } => {
                updates += 1;
                if !global.quiet {
                    println!(
                        "{} Row {}: update {} {} ({}) - qty {} + {}, price {} → {}",
                        style("→").blue(),
                        row.row,
                        style(format!("#{}", id)).cyan(),
                        truncate_str(&row.name, 30),
                        truncate_str(&row.brand, 20),
                        format_number(*current_quantity),
                        format_number(row.quantity),
                        format_number(*current_price),
                        format_number(row.price)
                    );
                }
            }
        }
    }

    let plans = PlanStore::open(&workspace.db_path()).map_err(|e| miette::miette!("{}", e))?;
    plans
        .put(&session, &plan)
        .map_err(|e| miette::miette!("{}", e))?;

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Preview").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows planned:   {}", style(plan.len()).cyan());
    println!("  Creates:        {}", style(creates).green());
    println!("  Updates:        {}", style(updates).yellow());
    println!();
    println!(
        "Staged for session '{}'. Apply it with {}",
        style(&session).cyan(),
        style("stocktake import commit").yellow()
    );

    Ok(())
}

fn run_commit(args: CommitArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    let session = args.session.unwrap_or_else(|| config.session());

    let plans = PlanStore::open(&workspace.db_path()).map_err(|e| miette::miette!("{}", e))?;
    let plan = match plans.take(&session) {
        Ok(plan) => plan,
        Err(PlanError::NoStagedPlan(session)) => {
            return Err(miette::miette!(
                "No staged import for session '{}'. Run {} first",
                session,
                style("stocktake import preview <FILE>").yellow()
            ));
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    if !global.quiet {
        println!(
            "{} Applying {} staged row(s) for session '{}'",
            style("→").blue(),
            style(plan.len()).cyan(),
            style(&session).cyan()
        );
        println!();
    }

    let outcome = apply(&store, &plan);

    for message in &outcome.messages {
        eprintln!("{} {}", style("✗").red(), message);
    }

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows applied:   {}", style(plan.len()).cyan());
    println!("  Created:        {}", style(outcome.created).green());
    if outcome.updated > 0 {
        println!("  Updated:        {}", style(outcome.updated).yellow());
    }
    if outcome.failed > 0 {
        println!("  Failed:         {}", style(outcome.failed).red());
    }

    if outcome.failed > 0 {
        return Err(miette::miette!(
            "Import completed with {} failed row(s)",
            outcome.failed
        ));
    }

    Ok(())
}

/// Print a header row plus one example data row to stdout
fn run_template() -> Result<()> {
    // The legacy header labels, exactly as the column mapper accepts them
    println!("Nomi,Brend,Narx (so'm),Dona,O'lchov birligi");
    println!("Quvur 20mm,AquaPlast,12500,40,metr");

    // Usage hint goes to stderr so it doesn't interfere with redirected output
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: stocktake import template > import.csv",
        style("→").blue()
    );

    Ok(())
}
