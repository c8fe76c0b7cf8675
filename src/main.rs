use citystats::cli::{self, ExportFormat};
use citystats::error::DashResult;
use citystats::export::{DEFAULT_SHEET_NAME, EXPORT_FILE_NAME};
use citystats::filter::DEFAULT_THRESHOLD;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "citystats")]
#[command(about = "Yearly values per city: preview, filter, summarize and export an .xlsx sheet.")]
#[command(long_about = "Citystats - spreadsheet dashboard for yearly values per city

The input is an .xlsx workbook whose first worksheet has at least the
columns 'cidades' (city), 'ano' (year) and 'Valor' (value). Values written
with a decimal comma (\"50,0\") are converted to numbers.

COMMANDS:
  preview  - Show shape, column types and the first rows
  summary  - Filtered view, per-city sums and statistics
  export   - Write the selected columns to CSV or .xlsx

EXAMPLES:
  citystats preview valores.xlsx
  citystats summary valores.xlsx --columns cidades,Valor --threshold 100 --city Recife
  citystats export valores.xlsx --columns cidades,ano,Valor -o filtered_data.csv")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show shape, column types and the first rows
    Preview {
        /// Path to the .xlsx file
        file: PathBuf,

        /// Number of rows to show
        #[arg(short, long, default_value = "3")]
        rows: usize,
    },

    #[command(long_about = "Summarize the sheet.

Shows the rows whose Valor is below the threshold (projected onto the
selected columns), the sum of Valor per city, descriptive statistics for
one city and its mean Valor per year.

A threshold that is not a number is reported and the default (100) is
used instead.")]
    /// Filtered view, per-city sums and statistics
    Summary {
        /// Path to the .xlsx file
        file: PathBuf,

        /// Comma-separated columns to show
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Show rows with Valor below this number
        #[arg(short, long, default_value = DEFAULT_THRESHOLD)]
        threshold: String,

        /// City for statistics (default: first city in the sheet)
        #[arg(long)]
        city: Option<String>,
    },

    #[command(long_about = "Export the selected columns.

All rows are exported; the Valor threshold does not apply to the export.
Columns are written in the order given.")]
    /// Write the selected columns to CSV or .xlsx
    Export {
        /// Path to the .xlsx file
        file: PathBuf,

        /// Comma-separated columns to export
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output file
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Worksheet name for xlsx output
        #[arg(long, default_value = DEFAULT_SHEET_NAME)]
        sheet_name: String,
    },
}

fn main() -> DashResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview { file, rows } => cli::preview(file, rows),

        Commands::Summary {
            file,
            columns,
            threshold,
            city,
        } => cli::summary(file, columns, threshold, city),

        Commands::Export {
            file,
            columns,
            output,
            format,
            sheet_name,
        } => cli::export(file, columns, output, format, sheet_name),
    }
}
