//! Citystats API Server binary
//!
//! Session-based HTTP JSON API over the dashboard pipeline.

use clap::Parser;
use citystats::api::{run_api_server, ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "citystats-server")]
#[command(version)]
#[command(about = "Citystats API Server - HTTP JSON API for the yearly-values-per-city dashboard")]
#[command(long_about = r#"
Citystats API Server - HTTP JSON API

Each client creates a session, uploads an .xlsx workbook and adjusts the
filter parameters; the dashboard is recomputed on every read.

  - POST   /api/v1/sessions                  - Create a session
  - GET    /api/v1/sessions/:id              - Session parameters
  - DELETE /api/v1/sessions/:id              - Drop a session
  - POST   /api/v1/sessions/:id/upload       - Upload workbook (multipart field 'file')
  - PUT    /api/v1/sessions/:id/columns      - {"columns": ["cidades", "Valor"]}
  - PUT    /api/v1/sessions/:id/threshold    - {"threshold": "100"}
  - PUT    /api/v1/sessions/:id/city         - {"city": "Recife"}
  - GET    /api/v1/sessions/:id/dashboard    - Filtered view, aggregates, charts
  - GET    /api/v1/sessions/:id/export       - filtered_data.csv

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Example usage:
  citystats-server                           # Start on localhost:8080
  citystats-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/sessions
  curl -F file=@valores.xlsx http://localhost:8080/api/v1/sessions/<id>/upload
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "CITYSTATS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CITYSTATS_PORT")]
    port: u16,

    /// Largest accepted upload, in MiB
    #[arg(long, default_value = "16", env = "CITYSTATS_MAX_UPLOAD_MB")]
    max_upload_mb: usize,

    /// Minutes of inactivity after which a session is dropped
    #[arg(long, default_value = "30", env = "CITYSTATS_SESSION_TTL_MINUTES")]
    session_ttl_minutes: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        session_ttl_minutes: args.session_ttl_minutes,
    };

    run_api_server(config).await
}
