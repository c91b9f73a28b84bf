//! `stocktake export` command - Write the inventory as a spreadsheet

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use crate::cli::helpers::{format_number, open_store, open_workspace};
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::product::Unit;
use crate::core::query::{self, FilterSpec, SortDir, SortField};
use crate::sheet;

/// Column layout of the legacy spreadsheet format
const EXPORT_HEADERS: [&str; 8] = [
    "ID",
    "Nomi",
    "Brend",
    "Narx (so'm)",
    "Miqdor",
    "O'lchov birligi",
    "Yaratilgan sana",
    "Yangilangan sana",
];

const EXPORT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output file ("-" for stdout; default from config, normally mahsulotlar.csv)
    pub output: Option<PathBuf>,

    /// Search in name and brand (case-insensitive substring)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by unit (kg/dona/metr/kub/litr)
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    /// Sort by field (id/name/brand/price/quantity/created)
    #[arg(long, default_value = "id")]
    pub sort: String,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    let unit = match args.unit.as_deref() {
        Some(raw) => Some(raw.parse::<Unit>().map_err(|e| miette::miette!("{}", e))?),
        None => None,
    };

    let spec = FilterSpec {
        search: args.search,
        unit,
        stock: None,
        sort: SortField::parse(&args.sort),
        dir: if args.reverse {
            SortDir::Desc
        } else {
            SortDir::Asc
        },
    };

    let listing = query::run(&store, &spec).map_err(|e| miette::miette!("{}", e))?;

    let rows: Vec<Vec<String>> = listing
        .products
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.brand.clone(),
                format_number(p.price),
                format_number(p.quantity),
                p.unit.to_string(),
                p.created_at.format(EXPORT_DATE_FORMAT).to_string(),
                p.updated_at.format(EXPORT_DATE_FORMAT).to_string(),
            ]
        })
        .collect();

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(config.export_file()));

    if output.as_os_str() == "-" {
        let stdout = io::stdout();
        sheet::write(stdout.lock(), &EXPORT_HEADERS, &rows)
            .map_err(|e| miette::miette!("{}", e))?;
    } else {
        let file = File::create(&output).into_diagnostic()?;
        sheet::write(BufWriter::new(file), &EXPORT_HEADERS, &rows)
            .map_err(|e| miette::miette!("{}", e))?;
        if !global.quiet {
            println!(
                "{} Exported {} product(s) to {}",
                style("✓").green(),
                style(rows.len()).cyan(),
                style(output.display()).yellow()
            );
        }
    }

    Ok(())
}
