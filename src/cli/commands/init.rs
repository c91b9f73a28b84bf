//! `stocktake init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::store::ProductStore;
use crate::core::workspace::{Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .stocktake/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    // Create directory if it doesn't exist
    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            // Materialize the database so the workspace is usable right away
            ProductStore::open(&workspace.db_path()).map_err(|e| miette::miette!("{}", e))?;

            println!(
                "{} Initialized stocktake workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            println!("Created:");
            println!("  {}", style(".stocktake/config.yaml").dim());
            println!("  {}", style(".stocktake/inventory.db").dim());
            println!();
            println!("Next steps:");
            println!(
                "  {} Add your first product",
                style("stocktake product new").yellow()
            );
            println!(
                "  {} Stage a spreadsheet import",
                style("stocktake import preview <FILE>").yellow()
            );
            println!(
                "  {} See stock health",
                style("stocktake stats").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} stocktake workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("stocktake init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
