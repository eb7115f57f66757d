use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use streamverse_session::config::{load_config, print_schema};
use streamverse_session::models::token::RegisterRequest;
use streamverse_session::session::SessionManager;
use streamverse_session::startup;
use streamverse_session::utils::logger::init_logging;
use streamverse_session::SessionError;

#[derive(Parser, Debug)]
#[command(version, about = "Session client for the StreamVerse API", long_about = None)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, env = "STREAMVERSE_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Print the configuration JSON schema and exit.
    #[arg(long)]
    schema: bool,

    /// Password for `login` and `register`. Read from stdin when unset.
    #[arg(long, env = "STREAMVERSE_PASSWORD", hide = true, hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current session.
    Status,
    /// Log in and store the returned tokens.
    Login { username: String },
    /// Log out and clear every stored token.
    Logout,
    /// Trade the refresh token for a new access token.
    Refresh,
    /// Clear the session-expired prompt.
    Dismiss,
    /// Create a new account.
    Register {
        username: String,
        fullname: String,
        email: String,
    },
}

async fn read_password(from_env: Option<String>) -> Result<String, SessionError> {
    if let Some(password) = from_env {
        return Ok(password);
    }
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| SessionError::InvalidInput(format!("could not read password: {}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_status(session: &SessionManager) {
    let state = session.state();
    let status = json!({
        "logged_in": state.logged_in,
        "username": state.username,
        "is_admin": state.is_admin,
        "session_expired": state.session_expired,
        "expires_at": session.expires_at().map(|at| at.to_rfc3339()),
    });
    println!("{}", status);
}

async fn run(
    command: Command,
    session: &SessionManager,
    password: Option<String>,
) -> Result<(), SessionError> {
    match command {
        Command::Status => {}
        Command::Login { username } => {
            let password = read_password(password).await?;
            session.login(&username, &password).await?;
        }
        Command::Logout => {
            session.logout().await;
        }
        Command::Refresh => {
            session.refresh_session().await?;
        }
        Command::Dismiss => {
            session.dismiss_session_warning();
        }
        Command::Register {
            username,
            fullname,
            email,
        } => {
            let password = read_password(password).await?;
            let registration = session
                .register(&RegisterRequest {
                    username,
                    fullname,
                    email,
                    password,
                })
                .await?;
            println!(
                "{}",
                json!({"registered": registration.username, "message": registration.message})
            );
            return Ok(());
        }
    }
    print_status(session);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.schema {
        return match print_schema() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Failed to render schema: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config(&cli.config) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let app = match startup::build(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Command::Status);
    match run(command, &app.session, cli.password).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(status = e.status(), "{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
