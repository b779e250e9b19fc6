//! CLI administration tool for referral-links.
//!
//! Issues bearer tokens for local testing, generates signing secrets, and
//! inspects referrals without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Issue a bearer token for caller "u1"
//! cargo run --bin admin -- token issue --user u1
//!
//! # Generate a JWT_SECRET value
//! cargo run --bin admin -- secret generate
//!
//! # Inspect referrals
//! cargo run --bin admin -- referral list --owner u1 --status pending
//! cargo run --bin admin -- referral show r1
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `JWT_SECRET`: required by `token issue`
//! - `DATABASE_URL`: required by `referral` and `db` commands

use referral_links::application::services::ReferralService;
use referral_links::domain::clock::SystemClock;
use referral_links::domain::entities::{ReferralFilter, ReferralStatus};
use referral_links::domain::repositories::FingerprintRepository;
use referral_links::infrastructure::identity::JwtIdentityResolver;
use referral_links::infrastructure::persistence::{PgFingerprintRepository, PgReferralRepository};
use referral_links::utils::public_id;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing referral-links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Issue bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Signing secrets
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Inspect referrals
    Referral {
        #[command(subcommand)]
        action: ReferralAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue an HS256 bearer token for a caller identity
    Issue {
        /// Caller identity placed in the `sub` claim
        #[arg(short, long)]
        user: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SecretAction {
    /// Generate a random signing secret
    Generate {
        /// Print only the secret
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand)]
enum ReferralAction {
    /// List referrals created by a referrer, newest first
    List {
        /// Referrer identity
        #[arg(short, long)]
        owner: String,

        /// Only referrals in this status (`pending` or `completed`)
        #[arg(short, long)]
        status: Option<ReferralStatus>,

        /// Maximum number of rows
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },

    /// Show one referral and the fingerprints recorded for it
    Show {
        /// Public referral id, e.g. `r1`
        public_id: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action)?,
        Commands::Secret { action } => handle_secret_action(action),
        Commands::Referral { action } => handle_referral_action(action, &connect().await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Issues a bearer token signed with `JWT_SECRET`.
///
/// The token carries only a `sub` claim; the service does not check expiry,
/// so treat issued tokens as long-lived credentials.
fn handle_token_action(action: TokenAction) -> Result<()> {
    let TokenAction::Issue { user, yes } = action;

    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

    println!("{}", "🔑 Issue Bearer Token".bright_blue().bold());
    println!();

    let user = match user {
        Some(u) => u,
        None => Input::new().with_prompt("Caller identity").interact_text()?,
    };

    if user.trim().is_empty() {
        anyhow::bail!("Caller identity must not be empty");
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Issue a token for '{user}'?"))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token = JwtIdentityResolver::new(&secret).issue(&user);

    println!();
    println!("  Identity: {}", user.cyan());
    println!("  Token:    {}", token.bright_yellow().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/referrals",
        token.bright_yellow()
    );
    println!();

    Ok(())
}

fn handle_secret_action(action: SecretAction) {
    let SecretAction::Generate { raw } = action;
    let secret = generate_secret();

    if raw {
        println!("{secret}");
        return;
    }

    println!("{}", "✨ Generated new signing secret".green());
    println!();
    println!("  {}={}", "JWT_SECRET".bright_cyan(), secret.bright_yellow());
    println!();
    println!(
        "{}",
        "⚠️  Tokens issued with the previous secret stop working once it changes."
            .yellow()
    );
}

async fn handle_referral_action(action: ReferralAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let service = ReferralService::new(
        Arc::new(PgReferralRepository::new(pool.clone())),
        Arc::new(SystemClock),
    );

    match action {
        ReferralAction::List {
            owner,
            status,
            limit,
        } => {
            println!("{}", "📋 Referrals".bright_blue().bold());
            println!();

            let page = service
                .list_referrals(&owner, ReferralFilter::new(0, limit).with_status(status))
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list referrals: {}", e))?;

            if page.items.is_empty() {
                println!("{}", "  No referrals found".yellow());
                return Ok(());
            }

            println!(
                "  {:<14} {:<20} {:<20} {:<10}",
                "Public ID".bright_white().bold(),
                "Code".bright_white().bold(),
                "Created".bright_white().bold(),
                "Status".bright_white().bold()
            );
            println!("  {}", "─".repeat(70).bright_black());

            for referral in &page.items {
                let status = match referral.status {
                    ReferralStatus::Pending => "PENDING".yellow(),
                    ReferralStatus::Completed => "COMPLETED".green(),
                };

                println!(
                    "  {:<14} {:<20} {:<20} {}",
                    referral.public_id.cyan(),
                    referral.code,
                    referral
                        .created_at
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                        .bright_black(),
                    status
                );
            }

            println!();
            println!(
                "  Showing {} of {}",
                page.items.len().to_string().bright_white().bold(),
                page.total.to_string().bright_white().bold()
            );
            println!();
        }
        ReferralAction::Show { public_id } => {
            let referral = service
                .get_referral(&public_id)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            let fingerprints = PgFingerprintRepository::new(pool)
                .list_by_referral(&referral.public_id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list fingerprints: {}", e))?;

            println!("{}", "🔗 Referral".bright_blue().bold());
            println!();
            println!("  Public ID: {}", referral.public_id.cyan());
            if let Ok(sequence_id) = public_id::decode(&referral.public_id) {
                println!("  Row ID:    {}", sequence_id.to_string().bright_black());
            }
            println!("  Code:      {}", referral.code);
            println!("  Referrer:  {}", referral.referrer_id);
            println!(
                "  Referee:   {}",
                referral.referee_id.as_deref().unwrap_or("-")
            );
            println!("  Status:    {}", referral.status.to_string().bright_white());
            println!("  Created:   {}", referral.created_at.to_rfc3339());
            println!();

            println!(
                "  {} ({})",
                "Fingerprints".bright_white().bold(),
                fingerprints.len()
            );
            for fingerprint in &fingerprints {
                println!(
                    "    {}  {:<15} {}  {}",
                    fingerprint.created_at.format("%Y-%m-%d %H:%M"),
                    fingerprint.ip_address,
                    fingerprint.fingerprint_id.bright_black(),
                    fingerprint.user_agent
                );
            }
            println!();
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let referrals: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM referrals")
                .fetch_one(pool)
                .await?;

            let fingerprints: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fingerprints")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL:   {}", version.bright_white());
            println!(
                "  Referrals:    {}",
                referrals.to_string().bright_green().bold()
            );
            println!(
                "  Fingerprints: {}",
                fingerprints.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}

/// Generates a cryptographically random secret.
///
/// # Format
///
/// - Length: 48 characters
/// - Character set: A-Z, a-z, 0-9
/// - Entropy: ~286 bits
fn generate_secret() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const SECRET_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..SECRET_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
