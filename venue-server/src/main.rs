use clap::{Args, Parser, Subcommand};
use shared::models::UserRole;
use shared::util::format_millis;
use venue_server::{Config, Server, ServerState, init_logger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "venue-server", about = "Venue table-ordering server", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create a staff account
    CreateUser(CreateUserArgs),
    /// Enable or disable a staff account
    SetActive(SetActiveArgs),
    /// Check the audit log hash chain
    VerifyAudit,
}

#[derive(Debug, Args)]
struct CreateUserArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "VENUE_USER_PASSWORD", hide_env_values = true)]
    password: String,

    /// manager | admin | owner
    #[arg(long, default_value = "manager")]
    role: UserRole,

    #[arg(long)]
    venue_id: String,
}

#[derive(Debug, Args)]
struct SetActiveArgs {
    #[arg(long)]
    email: String,

    #[arg(long, action = clap::ArgAction::Set)]
    active: bool,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _log_guard = init_logger(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Venue server starting...");
            let state = ServerState::initialize(config.clone())?;
            if let Err(e) = Server::with_state(config, state).run().await {
                tracing::error!(error = %e, "Server error");
                return Err(e.into());
            }
        }
        Commands::CreateUser(args) => {
            let state = ServerState::initialize(config)?;
            let user = state
                .auth()
                .provision_user(&args.email, &args.password, args.role, &args.venue_id)
                .map_err(|e| format!("failed to create user: {}", e.message))?;
            println!("user_id: {}", user.id);
            println!("email: {}", user.email);
            println!("venue_id: {}", user.venue_id);
        }
        Commands::SetActive(args) => {
            let state = ServerState::initialize(config)?;
            let user = state
                .auth()
                .set_user_active(&args.email, args.active)
                .map_err(|e| format!("failed to update user: {}", e.message))?;
            println!("email: {}", user.email);
            println!("active: {}", user.is_active);
        }
        Commands::VerifyAudit => {
            let state = ServerState::initialize(config)?;
            let report = state.audit().verify_chain()?;
            println!("entries: {}", report.total_entries);
            if let Some(last) = state.audit().recent(1)?.first() {
                println!("last: {} {}", format_millis(last.timestamp), last.action);
            }
            println!("intact: {}", report.chain_intact);
            for brk in &report.breaks {
                println!(
                    "break at {}: expected prev {}, found {}",
                    brk.entry_id, brk.expected_prev_hash, brk.actual_prev_hash
                );
            }
            if !report.chain_intact {
                return Err("audit chain broken".into());
            }
        }
    }

    Ok(())
}
