use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sales_api::logging::init_tracing;
use sales_api::modules::users::{NewUser, PgUserRepository, UserRepository, UserService};
use sales_auth::{Auth, Claims, KeyStore, ROLE_ADMIN, ROLE_USER};
use sales_config::Config;
use sales_db::MIGRATOR;
use tokio::time::Instant;
use uuid::Uuid;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "sales-admin")]
#[command(about = "Sales API administrative tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a user holding the ADMIN and USER roles
    CreateAdmin {
        name: String,
        email: String,
        password: String,
    },
    /// Sign a token for an existing user with the active key
    GenToken {
        /// The user's id
        user_id: Uuid,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli.command).await {
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(config.log_format);

    let db = sales_db::connect(&config.db).context("connecting to database")?;
    let deadline = Instant::now() + COMMAND_TIMEOUT;

    match command {
        Commands::Migrate => {
            MIGRATOR.run(&db).await.context("running migrations")?;
            println!("✅ Migrations complete");
        }
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let service = UserService::new(
                Arc::new(PgUserRepository::new(db.clone())),
                config.auth.issuer.clone(),
                config.auth.token_ttl,
            );
            let nu = NewUser {
                name,
                email,
                roles: vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()],
                password: password.clone(),
                password_confirm: password,
            };
            let user = service
                .create(nu, Utc::now(), deadline)
                .await
                .context("creating admin")?;
            println!("✅ Admin created");
            println!("   ID: {}", user.id);
            println!("   Email: {}", user.email);
        }
        Commands::GenToken { user_id } => {
            let repo = PgUserRepository::new(db.clone());
            let user = sales_db::with_deadline(deadline, repo.query_by_id(user_id))
                .await
                .map_err(|err| anyhow!("looking up user {user_id}: {err}"))?;

            let keys = KeyStore::from_dir(&config.auth.keys_folder)
                .with_context(|| format!("loading keys from {}", config.auth.keys_folder))?;
            let auth = Auth::new(config.auth.active_kid.clone(), keys)?;

            let claims = Claims::new(
                config.auth.issuer.clone(),
                user.id.to_string(),
                user.roles,
                Utc::now(),
                config.auth.token_ttl,
            );
            let token = auth.issue(&claims)?;

            println!("-----BEGIN TOKEN-----");
            println!("{token}");
            println!("-----END TOKEN-----");
        }
    }

    db.close().await;
    Ok(())
}
