//! # Sello CLI
//!
//! Command-line interface for batch label rendering.
//!
//! ## Usage
//!
//! ```bash
//! # Render a single row to PNG for inspection
//! sello render --data people.xlsx --template label.json --row 0 --out preview.png
//!
//! # Export every row into a ZIP archive
//! sello export --data people.xlsx --template label.json --out qrcodes.zip
//!
//! # Name output files after a column
//! sello export --data people.xlsx --template label.json --filename-column name
//!
//! # Start the editing-session HTTP server
//! sello serve --listen 0.0.0.0:8080
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sello::{
    SelloError, dataset,
    export::{self, ExportOptions},
    render::Renderer,
    server::{self, ServerConfig},
    template::{QrConfig, Template},
};

/// Sello - batch label rendering utility
#[derive(Parser, Debug)]
#[command(name = "sello")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one dataset row to a PNG file
    Render {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Spreadsheet file (.xlsx or .xls); omit to render static content only
        #[arg(long)]
        data: Option<PathBuf>,

        /// QR configuration JSON file (defaults to standard settings)
        #[arg(long)]
        qr_config: Option<PathBuf>,

        /// Row index to render (0-based)
        #[arg(long, default_value = "0")]
        row: usize,

        /// Output PNG path
        #[arg(long, short, default_value = "preview.png")]
        out: PathBuf,
    },

    /// Render every dataset row and package the PNGs as a ZIP archive
    Export {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Spreadsheet file (.xlsx or .xls)
        #[arg(long)]
        data: PathBuf,

        /// QR configuration JSON file (defaults to standard settings)
        #[arg(long)]
        qr_config: Option<PathBuf>,

        /// Column whose value names each output file
        #[arg(long)]
        filename_column: Option<String>,

        /// Output ZIP path
        #[arg(long, short, default_value = "qrcodes.zip")]
        out: PathBuf,
    },

    /// Start the editing-session HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SelloError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            qr_config,
            row,
            out,
        } => {
            let template = load_template(&template)?;
            let dataset = data.map(dataset::import_path).transpose()?;
            let qr_config = load_qr_config(qr_config.as_deref())?;

            let renderer = Renderer::new();
            let png = renderer
                .render_row_png(&template, dataset.as_ref(), row, &qr_config)
                .await?;
            std::fs::write(&out, png)?;
            println!("Saved row {} to {}", row, out.display());
        }

        Commands::Export {
            template,
            data,
            qr_config,
            filename_column,
            out,
        } => {
            let template = load_template(&template)?;
            let dataset = dataset::import_path(&data)?;
            let qr_config = load_qr_config(qr_config.as_deref())?;
            let options = ExportOptions { filename_column };

            let total = dataset.total_rows();
            println!("Exporting {} rows...", total);

            let renderer = Renderer::new();
            let zip_bytes = export::export_all(
                &renderer,
                &template,
                &dataset,
                &qr_config,
                &options,
                |percent| {
                    print!("\r{}%", percent);
                    let _ = std::io::stdout().flush();
                },
            )
            .await?;
            println!();

            std::fs::write(&out, zip_bytes)?;
            println!("Saved {} images to {}", total, out.display());
        }

        Commands::Serve { listen } => {
            server::serve(ServerConfig {
                listen_addr: listen,
            })
            .await?;
        }
    }

    Ok(())
}

fn load_template(path: &std::path::Path) -> Result<Template, SelloError> {
    let json = std::fs::read_to_string(path)?;
    Template::from_json(&json)
}

fn load_qr_config(path: Option<&std::path::Path>) -> Result<QrConfig, SelloError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str(&json)
                .map_err(|e| SelloError::Template(format!("invalid QR config JSON: {}", e)))
        }
        None => Ok(QrConfig::default()),
    }
}
