// src/main.rs
// fibery-mcp - MCP server for Fibery workspaces

use anyhow::Result;
use clap::{Parser, Subcommand};
use fibery_mcp::config::FiberyConfig;
use fibery_mcp::fibery::{FiberyApi, FiberyClient};
use fibery_mcp::mcp::FiberyServer;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "fibery-mcp")]
#[command(about = "MCP server for Fibery: structured queries and approximate text search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as MCP server over stdio (default)
    Serve,

    /// Print workspace databases, or the fields of one database
    Schema {
        /// Database in "Space/Type" format
        #[arg(short, long)]
        database: Option<String>,
    },
}

async fn run_mcp_server(client: FiberyClient) -> Result<()> {
    let server = FiberyServer::new(Arc::new(client));

    // Run with stdio transport
    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_schema(client: FiberyClient, database: Option<String>) -> Result<()> {
    let schema = client.get_schema().await?;

    match database {
        Some(name) => {
            let db = schema
                .database(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown database: {}", name))?;
            println!("{}", db.name);
            for field in &db.fields {
                let marker = if field.is_rich_text() { " (rich text)" } else { "" };
                println!("  {} [{}]{}", field.name, field.field_type, marker);
            }
        }
        None => {
            for db in &schema.types {
                println!("{}", db.name);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv(); // Load .env from current directory

    let cli = Cli::parse();

    // Quiet on stdio serve mode: stdout carries the MCP protocol
    let log_level = match &cli.command {
        Some(Commands::Serve) | None => Level::WARN,
        Some(Commands::Schema { .. }) => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = FiberyConfig::from_env()?;
    let client = FiberyClient::new(config);

    match cli.command {
        None | Some(Commands::Serve) => run_mcp_server(client).await?,
        Some(Commands::Schema { database }) => run_schema(client, database).await?,
    }

    Ok(())
}
