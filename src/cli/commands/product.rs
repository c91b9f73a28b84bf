//! `stocktake product` command - Product record management

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{
    escape_csv, format_number, open_store, open_workspace, resolve_format, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::product::{ProductFields, Unit};
use crate::core::query::{self, FilterSpec, SortDir, SortField, StockLevel};

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products with filtering and sorting
    List(ListArgs),

    /// Create a new product
    New(NewArgs),

    /// Show a product's details
    Show(ShowArgs),

    /// Edit a product's fields
    Edit(EditArgs),

    /// Remove a product
    Rm(RmArgs),

    /// Check whether a (name, brand) pair is already taken
    CheckDup(CheckDupArgs),

    /// Fold incoming values into an existing product
    Merge(MergeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    // ========== FILTERING OPTIONS ==========
    // These let users filter without needing awk/grep

    /// Search in name and brand (case-insensitive substring)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by unit (kg/dona/metr/kub/litr)
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    /// Filter by stock level relative to the listing average (low/medium/high)
    #[arg(long)]
    pub stock: Option<String>,

    // ========== OUTPUT CONTROL ==========

    /// Sort by field (id/name/brand/price/quantity/created)
    #[arg(long, default_value = "id")]
    pub sort: String,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit output to N items
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Product name
    #[arg(long)]
    pub name: Option<String>,

    /// Brand name
    #[arg(long)]
    pub brand: Option<String>,

    /// Unit price
    #[arg(long)]
    pub price: Option<f64>,

    /// Stock quantity
    #[arg(long)]
    pub quantity: Option<f64>,

    /// Unit of measure (kg/dona/metr/kub/litr)
    #[arg(long, default_value = "dona")]
    pub unit: String,

    /// Skip the duplicate check and attempt the insert anyway
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Product ID
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Product ID
    pub id: i64,

    /// New product name
    #[arg(long)]
    pub name: Option<String>,

    /// New brand name
    #[arg(long)]
    pub brand: Option<String>,

    /// New unit price
    #[arg(long)]
    pub price: Option<f64>,

    /// New stock quantity
    #[arg(long)]
    pub quantity: Option<f64>,

    /// New unit of measure (kg/dona/metr/kub/litr)
    #[arg(long)]
    pub unit: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Product ID
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct CheckDupArgs {
    /// Product name to probe
    #[arg(long)]
    pub name: String,

    /// Brand name to probe
    #[arg(long)]
    pub brand: String,
}

#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// Product ID to merge into
    pub id: i64,

    /// Incoming price (overwrites the stored price)
    #[arg(long)]
    pub price: f64,

    /// Incoming quantity (added to the stored quantity)
    #[arg(long)]
    pub quantity: f64,

    /// Incoming unit of measure (overwrites when given)
    #[arg(long)]
    pub unit: Option<String>,
}

pub fn run(cmd: ProductCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProductCommands::List(args) => run_list(args, global),
        ProductCommands::New(args) => run_new(args, global),
        ProductCommands::Show(args) => run_show(args, global),
        ProductCommands::Edit(args) => run_edit(args, global),
        ProductCommands::Rm(args) => run_rm(args, global),
        ProductCommands::CheckDup(args) => run_check_dup(args, global),
        ProductCommands::Merge(args) => run_merge(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    let unit = match args.unit.as_deref() {
        Some(raw) => Some(raw.parse::<Unit>().map_err(|e| miette::miette!("{}", e))?),
        None => None,
    };
    let stock = match args.stock.as_deref() {
        Some(raw) => Some(
            raw.parse::<StockLevel>()
                .map_err(|e| miette::miette!("{}", e))?,
        ),
        None => None,
    };

    let spec = FilterSpec {
        search: args.search,
        unit,
        stock,
        sort: SortField::parse(&args.sort),
        dir: if args.reverse {
            SortDir::Desc
        } else {
            SortDir::Asc
        },
    };

    let mut listing = query::run(&store, &spec).map_err(|e| miette::miette!("{}", e))?;

    if args.count {
        println!("{}", listing.products.len());
        return Ok(());
    }

    if let Some(limit) = args.limit {
        listing.products.truncate(limit);
    }

    let format = resolve_format(global, &config);

    if listing.products.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Yaml => println!("[]"),
            _ => {
                println!("No products found.");
                println!();
                println!("Add one with: {}", style("stocktake product new").yellow());
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&listing.products).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&listing.products).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,name,brand,price,quantity,unit,created");
            for p in &listing.products {
                println!(
                    "{},{},{},{},{},{},{}",
                    p.id,
                    escape_csv(&p.name),
                    escape_csv(&p.brand),
                    format_number(p.price),
                    format_number(p.quantity),
                    p.unit,
                    p.created_at.format("%Y-%m-%dT%H:%M:%SZ")
                );
            }
        }
        OutputFormat::Tsv => {
            println!(
                "{:<6} {:<24} {:<16} {:>12} {:>10} {:<6} {:<8}",
                style("ID").bold(),
                style("NAME").bold(),
                style("BRAND").bold(),
                style("PRICE").bold(),
                style("QTY").bold(),
                style("UNIT").bold(),
                style("STOCK").bold()
            );
            println!("{}", "-".repeat(88));

            for p in &listing.products {
                let level = StockLevel::classify(p.quantity, listing.average_quantity);
                println!(
                    "{:<6} {:<24} {:<16} {:>12} {:>10} {:<6} {}",
                    p.id,
                    truncate_str(&p.name, 22),
                    truncate_str(&p.brand, 14),
                    format_number(p.price),
                    format_number(p.quantity),
                    p.unit,
                    paint_level(level)
                );
            }

            println!();
            println!("{} product(s) found", style(listing.products.len()).cyan());
        }
        OutputFormat::Id => {
            for p in &listing.products {
                println!("{}", p.id);
            }
        }
        OutputFormat::Md => {
            let mut table = Builder::default();
            table.push_record(["ID", "Name", "Brand", "Price", "Qty", "Unit", "Stock"]);
            for p in &listing.products {
                let level = StockLevel::classify(p.quantity, listing.average_quantity);
                table.push_record([
                    p.id.to_string(),
                    p.name.clone(),
                    p.brand.clone(),
                    format_number(p.price),
                    format_number(p.quantity),
                    p.unit.to_string(),
                    level.to_string(),
                ]);
            }
            println!("{}", table.build().with(Style::markdown()));
        }
        OutputFormat::Auto => unreachable!(), // resolve_format never returns Auto
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;

    let name = match args.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(miette::miette!("Missing product name. Use --name <NAME>")),
    };
    let brand = match args.brand.as_deref().map(str::trim) {
        Some(brand) if !brand.is_empty() => brand.to_string(),
        _ => return Err(miette::miette!("Missing brand name. Use --brand <BRAND>")),
    };
    let price = args
        .price
        .ok_or_else(|| miette::miette!("Missing price. Use --price <PRICE>"))?;
    let quantity = args
        .quantity
        .ok_or_else(|| miette::miette!("Missing quantity. Use --quantity <QUANTITY>"))?;

    if price < 0.0 {
        return Err(miette::miette!("Invalid price: {}. Must be non-negative", price));
    }
    if quantity < 0.0 {
        return Err(miette::miette!(
            "Invalid quantity: {}. Must be non-negative",
            quantity
        ));
    }

    let unit = args
        .unit
        .parse::<Unit>()
        .map_err(|e| miette::miette!("{}", e))?;

    if !args.force {
        if let Some(existing) = store
            .find_by_identity(&name, &brand)
            .map_err(|e| miette::miette!("{}", e))?
        {
            println!(
                "{} A product named '{}' by '{}' already exists (id {})",
                style("!").yellow(),
                existing.name,
                existing.brand,
                style(existing.id).cyan()
            );
            println!();
            println!(
                "Fold the new values in with {} or insert anyway with {}",
                style(format!("stocktake product merge {}", existing.id)).yellow(),
                style("--force").yellow()
            );
            return Err(miette::miette!(
                "a product named '{}' by '{}' already exists",
                existing.name,
                existing.brand
            ));
        }
    }

    let product = store
        .create(&ProductFields {
            name,
            brand,
            price,
            quantity,
            unit,
        })
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Created product {} - {} ({})",
            style("✓").green(),
            style(product.id).cyan(),
            style(&product.name).yellow(),
            product.brand
        );
        println!(
            "   {} {} at {}",
            format_number(product.quantity),
            product.unit,
            format_number(product.price)
        );
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    let product = store
        .get(args.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("No product with id {}", args.id))?;

    match resolve_format(global, &config) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&product).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&product).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            println!("{}", product.id);
        }
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(product.id).cyan());
            println!(
                "{}: {}",
                style("Name").bold(),
                style(&product.name).yellow()
            );
            println!("{}: {}", style("Brand").bold(), product.brand);
            println!(
                "{}: {}",
                style("Price").bold(),
                format_number(product.price)
            );
            println!(
                "{}: {} {}",
                style("Quantity").bold(),
                format_number(product.quantity),
                product.unit
            );
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {} | {}: {}",
                style("Created").dim(),
                product.created_at.format("%Y-%m-%d %H:%M"),
                style("Updated").dim(),
                product.updated_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;

    let mut product = store
        .get(args.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("No product with id {}", args.id))?;

    if args.name.is_none()
        && args.brand.is_none()
        && args.price.is_none()
        && args.quantity.is_none()
        && args.unit.is_none()
    {
        return Err(miette::miette!(
            "Nothing to change. Pass at least one of --name, --brand, --price, --quantity, --unit"
        ));
    }

    if let Some(name) = args.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(miette::miette!("Invalid name: cannot be empty"));
        }
        product.name = name;
    }
    if let Some(brand) = args.brand {
        let brand = brand.trim().to_string();
        if brand.is_empty() {
            return Err(miette::miette!("Invalid brand: cannot be empty"));
        }
        product.brand = brand;
    }
    if let Some(price) = args.price {
        if price < 0.0 {
            return Err(miette::miette!("Invalid price: {}. Must be non-negative", price));
        }
        product.price = price;
    }
    if let Some(quantity) = args.quantity {
        if quantity < 0.0 {
            return Err(miette::miette!(
                "Invalid quantity: {}. Must be non-negative",
                quantity
            ));
        }
        product.quantity = quantity;
    }
    if let Some(raw) = args.unit {
        product.unit = raw.parse::<Unit>().map_err(|e| miette::miette!("{}", e))?;
    }

    // Renaming onto another record's identity is intercepted like `new`
    if let Some(existing) = store
        .find_by_identity(&product.name, &product.brand)
        .map_err(|e| miette::miette!("{}", e))?
    {
        if existing.id != product.id {
            return Err(miette::miette!(
                "a product named '{}' by '{}' already exists (id {})",
                existing.name,
                existing.brand,
                existing.id
            ));
        }
    }

    let product = store
        .update(&product)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Updated product {} - {} ({})",
            style("✓").green(),
            style(product.id).cyan(),
            style(&product.name).yellow(),
            product.brand
        );
    }

    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;

    let product = store
        .get(args.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("No product with id {}", args.id))?;

    if !args.yes && !global.quiet {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove '{}' by '{}' (id {})?",
                product.name, product.brand, product.id
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{} Aborted", style("○").dim());
            return Ok(());
        }
    }

    store
        .delete(product.id)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Removed product {} - {} ({})",
            style("✓").green(),
            style(product.id).cyan(),
            style(&product.name).yellow(),
            product.brand
        );
    }

    Ok(())
}

fn run_check_dup(args: CheckDupArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;
    let config = Config::load(Some(&workspace));

    let hit = store
        .find_by_identity(&args.name, &args.brand)
        .map_err(|e| miette::miette!("{}", e))?;

    match resolve_format(global, &config) {
        OutputFormat::Json => {
            let payload = match &hit {
                Some(p) => serde_json::json!({
                    "exists": true,
                    "product_id": p.id,
                    "name": p.name,
                    "brand": p.brand,
                    "price": p.price,
                    "quantity": p.quantity,
                    "unit": p.unit,
                }),
                None => serde_json::json!({ "exists": false }),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).into_diagnostic()?
            );
        }
        _ => match &hit {
            Some(p) => {
                println!(
                    "{} '{}' by '{}' already exists as product {}",
                    style("!").yellow(),
                    p.name,
                    p.brand,
                    style(p.id).cyan()
                );
                println!(
                    "   {} {} at {}",
                    format_number(p.quantity),
                    p.unit,
                    format_number(p.price)
                );
            }
            None => {
                println!(
                    "{} '{}' by '{}' is free",
                    style("✓").green(),
                    args.name.trim(),
                    args.brand.trim()
                );
            }
        },
    }

    Ok(())
}

fn run_merge(args: MergeArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = open_store(&workspace)?;

    let mut product = store
        .get(args.id)
        .map_err(|e| miette::miette!("{}", e))?
        .ok_or_else(|| miette::miette!("No product with id {}", args.id))?;

    if args.price < 0.0 {
        return Err(miette::miette!(
            "Invalid price: {}. Must be non-negative",
            args.price
        ));
    }
    if args.quantity < 0.0 {
        return Err(miette::miette!(
            "Invalid quantity: {}. Must be non-negative",
            args.quantity
        ));
    }

    // Merge semantics: price overwrites, quantity adds, unit overwrites
    let before = product.quantity;
    product.price = args.price;
    product.quantity += args.quantity;
    if let Some(raw) = args.unit {
        product.unit = raw.parse::<Unit>().map_err(|e| miette::miette!("{}", e))?;
    }

    let product = store
        .update(&product)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Merged into product {} - {} ({})",
            style("✓").green(),
            style(product.id).cyan(),
            style(&product.name).yellow(),
            product.brand
        );
        println!(
            "   quantity {} + {} = {}, price {}",
            format_number(before),
            format_number(args.quantity),
            format_number(product.quantity),
            format_number(product.price)
        );
    }

    Ok(())
}

/// Stock column coloring for the human table
fn paint_level(level: StockLevel) -> String {
    match level {
        StockLevel::Low => style("low").red().to_string(),
        StockLevel::Medium => style("medium").yellow().to_string(),
        StockLevel::High => style("high").green().to_string(),
    }
}
