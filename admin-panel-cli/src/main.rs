mod render;

use admin_panel::record::record_id;
use admin_panel::{
    AdminConfig, AdminController, AdminError, AdminHttpClient, AdminPanel, FileSessionStore, Record,
    SessionHandle,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "admin-panel", version, about = "Browse and edit the tables of a JSON admin backend")]
struct Cli {
    /// Backend base URL. Takes precedence over the URL stored at login.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Path to a config.toml (defaults to ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and remember the token for later commands.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// List the tables the backend exposes.
    Tables,
    /// Show every row of a table.
    List {
        table: String,
        /// Print the rows as JSON instead of a grid.
        #[arg(long)]
        json: bool,
    },
    /// Create a record from field=value pairs.
    Add {
        table: String,
        #[arg(value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Update a record. Unlisted fields keep their current values.
    Edit {
        table: String,
        id: String,
        #[arg(value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Delete a record after confirmation.
    Delete {
        table: String,
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Fetch every table and report how many loaded.
    RunAll {
        #[arg(long)]
        json: bool,
    },
    /// Show the server and login state.
    Status,
}

/// `key=value`, where value may be empty or contain further `=`.
fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AdminConfig::load_from(path),
        None => AdminConfig::load(),
    }
    .context("Failed to load configuration")?;

    let store = Arc::new(FileSessionStore::new(config.session_path()));
    let session = Arc::new(SessionHandle::open_or_default(store));
    let server_url = config.resolve_server_url(cli.server.as_deref(), session.server_url().as_deref());
    debug!("Using server {}", server_url);

    let client = AdminHttpClient::new(&server_url, session.clone(), config.timeout())?;
    let panel = AdminPanel::new(config.field_rules(), session.is_authenticated());
    let mut controller = AdminController::new(client, panel);

    let outcome = run(&cli.command, &mut controller, &session, &config).await;
    render::print_notifications(&mut controller.panel);
    outcome
}

async fn run(
    command: &Commands,
    controller: &mut AdminController,
    session: &SessionHandle,
    config: &AdminConfig,
) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            if !controller.login(email, password).await {
                bail!("Login failed");
            }
            println!(
                "✅ Logged in to {} ({} tables)",
                controller.client().base_url(),
                controller.panel.tables.len()
            );
        }
        Commands::Logout => {
            controller.logout();
            println!("👋 Logged out");
        }
        Commands::Tables => {
            require_login(controller)?;
            if !controller.refresh_tables().await {
                bail!("Failed to load routes");
            }
            for table in &controller.panel.tables {
                println!("{}", table);
            }
        }
        Commands::List { table, json } => {
            load_table(controller, table).await?;
            let panel = &controller.panel;
            if *json {
                println!("{}", serde_json::to_string_pretty(&panel.rows)?);
            } else if panel.rows.is_empty() {
                println!("(no rows in {})", table);
            } else {
                print!("{}", render::grid(&panel.columns(), &panel.rows));
            }
        }
        Commands::Add { table, fields } => {
            load_table(controller, table).await?;
            controller.panel.open_add();
            fill_form(controller, fields);
            if !controller.submit_dialog().await {
                bail!("Failed to add record to {}", table);
            }
        }
        Commands::Edit { table, id, fields } => {
            load_table(controller, table).await?;
            let row = find_row(controller, table, id)?;
            controller.panel.open_edit(table, &row);
            fill_form(controller, fields);
            if !controller.submit_dialog().await {
                bail!("Failed to edit record {} in {}", id, table);
            }
        }
        Commands::Delete { table, id, yes } => {
            load_table(controller, table).await?;
            let row = find_row(controller, table, id)?;
            controller.panel.open_delete(table, &row);
            if !*yes && !confirm("Are you sure you want to delete this record? [y/N] ")? {
                controller.panel.close_dialog();
                println!("Cancelled");
                return Ok(());
            }
            if !controller.confirm_delete().await {
                bail!("Failed to delete record {} from {}", id, table);
            }
        }
        Commands::RunAll { json } => {
            require_login(controller)?;
            if !controller.refresh_tables().await {
                bail!("Failed to load routes");
            }
            let all_ok = controller.run_all().await;
            let panel = &controller.panel;
            if *json {
                let report: serde_json::Map<String, serde_json::Value> = panel
                    .all_rows
                    .iter()
                    .map(|(table, rows)| {
                        let rows = rows.iter().cloned().map(serde_json::Value::Object).collect();
                        (table.clone(), serde_json::Value::Array(rows))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (table, rows) in &panel.all_rows {
                    println!("▸ {} ({} rows)", table, rows.len());
                    if !rows.is_empty() {
                        print!("{}", render::grid(&panel.rules().columns(rows), rows));
                    }
                    println!();
                }
            }
            println!("Total: {} | Success: {}", panel.total_count, panel.success_count);
            if !all_ok {
                bail!("{} of {} tables failed", panel.total_count - panel.success_count, panel.total_count);
            }
        }
        Commands::Status => {
            println!("Server:  {}", controller.client().base_url());
            println!("Session: {}", config.session_path().display());
            if session.is_authenticated() {
                println!("✅ Logged in");
            } else {
                println!("🔒 Not logged in");
            }
        }
    }
    Ok(())
}

fn require_login(controller: &AdminController) -> Result<()> {
    if !controller.panel.logged_in {
        return Err(AdminError::NotLoggedIn).context("Run `admin-panel login` first");
    }
    Ok(())
}

async fn load_table(controller: &mut AdminController, table: &str) -> Result<()> {
    require_login(controller)?;
    if !controller.select_table(table).await {
        bail!("Failed to load {} data", table);
    }
    Ok(())
}

fn find_row(controller: &AdminController, table: &str, id: &str) -> Result<Record> {
    controller
        .panel
        .rows
        .iter()
        .find(|row| record_id(row).as_deref() == Some(id))
        .cloned()
        .with_context(|| format!("No record with id {} in {}", id, table))
}

fn fill_form(controller: &mut AdminController, fields: &[(String, String)]) {
    for (key, value) in fields {
        controller.panel.set_field(key, value.as_str());
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(parse_assignment("name=a=b").unwrap(), ("name".into(), "a=b".into()));
        assert_eq!(parse_assignment("tags=").unwrap(), ("tags".into(), String::new()));
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("nothing").is_err());
    }

    #[test]
    fn edit_parses_fields() {
        let cli = Cli::try_parse_from(["admin-panel", "edit", "widget", "7", "name=b", "tags=x,y"]).unwrap();
        match cli.command {
            Commands::Edit { table, id, fields } => {
                assert_eq!(table, "widget");
                assert_eq!(id, "7");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn server_flag_is_global() {
        let cli = Cli::try_parse_from(["admin-panel", "tables", "--server", "http://api:9000"]).unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://api:9000"));
    }
}
