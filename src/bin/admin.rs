//! CLI administration tool for redirect-engine.
//!
//! Inspects the rule store offline, without a running server.
//!
//! # Usage
//!
//! ```bash
//! # List stored rules
//! cargo run --bin admin -- rules list
//!
//! # Report rules that would be skipped on publish
//! cargo run --bin admin -- rules check
//!
//! # Dry-run a path against the stored rules
//! cargo run --bin admin -- test /blog/hello-world --scheme https
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same rule source variables as the server: `RULES_FILE`, or `DATABASE_URL`
//! / `DB_*`. `BASE_PATH`, `PRESERVE_QUERY_STRING` and `REDIRECT_CONDITIONS`
//! are honored by `test`.

use redirect_engine::application::services::RuleSnapshot;
use redirect_engine::config::Config;
use redirect_engine::domain::conditions::ConditionRegistry;
use redirect_engine::domain::entities::{RequestScheme, RuleRecord};
use redirect_engine::domain::errors::RuleError;
use redirect_engine::domain::location::{RedirectOptions, build_response};
use redirect_engine::domain::repositories::RuleRepository;
use redirect_engine::domain::signature::RequestSignature;
use redirect_engine::infrastructure::persistence::{JsonRuleRepository, PgRuleRepository};
use redirect_engine::utils::path_normalizer::normalize_base_path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing redirect-engine.
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
    /// Inspect stored rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Resolve a path against the stored rules without a server
    Test {
        /// Request path, optionally with a query string
        path: String,

        /// Request scheme
        #[arg(short, long, default_value = "http")]
        scheme: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Rule inspection subcommands.
#[derive(Subcommand)]
enum RulesAction {
    /// List all rules
    List,

    /// Report rules that would be skipped on publish
    Check,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rules { action } => {
            let (rules, rejected) = load_rules().await?;
            match action {
                RulesAction::List => list_rules(&rules),
                RulesAction::Check => check_rules(rules, rejected)?,
            }
        }
        Commands::Test { path, scheme } => test_path(&path, &scheme).await?,
        Commands::Db { action } => handle_db_action(action).await?,
    }

    Ok(())
}

/// Reads every rule from the configured store, along with the records a
/// rule file holds that could not be decoded.
async fn load_rules() -> Result<(Vec<RuleRecord>, Vec<RuleError>)> {
    if let Ok(path) = std::env::var("RULES_FILE")
        && !path.is_empty()
    {
        return JsonRuleRepository::new(path)
            .load()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load rules: {}", e));
    }

    let pool = connect().await?;
    let rules = PgRuleRepository::new(Arc::new(pool))
        .list_rules()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load rules: {}", e))?;
    Ok((rules, Vec::new()))
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;
    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Lists rules in id order.
///
/// # Output Format
///
/// ```text
/// 📋 Redirect Rules
///
///   ID    Kind         Status  Scheme  Pattern                        Target
///   ───────────────────────────────────────────────────────────────────────────
///   1     placeholder  301     any     /blog/{slug}                   /articles/{slug}
/// ```
fn list_rules(rules: &[RuleRecord]) {
    println!("{}", "📋 Redirect Rules".bright_blue().bold());
    println!();

    if rules.is_empty() {
        println!("{}", "  No rules found".yellow());
        return;
    }

    println!(
        "  {:<5} {:<12} {:<7} {:<7} {:<30} {}",
        "ID".bright_white().bold(),
        "Kind".bright_white().bold(),
        "Status".bright_white().bold(),
        "Scheme".bright_white().bold(),
        "Pattern".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    for rule in rules {
        let pattern = if rule.enabled {
            rule.pattern.cyan()
        } else {
            rule.pattern.bright_black().strikethrough()
        };

        println!(
            "  {:<5} {:<12} {:<7} {:<7} {:<30} {}",
            rule.id.to_string().bright_black(),
            rule.kind,
            rule.status_code,
            rule.scheme,
            pattern,
            rule.target
        );
    }

    println!();
    println!("  Total: {}", rules.len().to_string().bright_white().bold());
    println!();
}

/// Compiles rules the way publish does and reports the skipped ones.
///
/// Exits with an error when at least one rule would be skipped, so the
/// command can gate deployments.
fn check_rules(rules: Vec<RuleRecord>, rejected: Vec<RuleError>) -> Result<()> {
    println!("{}", "🔍 Checking rules...".bright_blue());

    let total = rules.len() + rejected.len();
    let snapshot = RuleSnapshot::build(rules, Default::default(), Utc::now());
    let problems: Vec<&RuleError> = rejected.iter().chain(snapshot.skipped.iter()).collect();

    println!(
        "  Indexed: {}  Active now: {}  Generation: {}",
        snapshot.rule_count().to_string().bright_green().bold(),
        snapshot.active_rule_count(Utc::now()).to_string().bright_green(),
        snapshot.generation.bright_black()
    );

    if problems.is_empty() {
        println!("{}", "✅ All rules are valid".green().bold());
        return Ok(());
    }

    println!();
    for error in &problems {
        println!("  {} {}", "✗".red().bold(), error);
    }
    println!();

    anyhow::bail!("{} of {} rules would be skipped", problems.len(), total)
}

/// Resolves one path offline, conditions included.
async fn test_path(raw: &str, scheme: &str) -> Result<()> {
    let scheme: RequestScheme = scheme.parse().map_err(anyhow::Error::msg)?;
    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    let base_path = normalize_base_path(&std::env::var("BASE_PATH").unwrap_or_default());
    let conditions = Config::load_redirect_conditions();
    let options = RedirectOptions {
        preserve_query_string: Config::load_preserve_query_string(),
    };

    let gate = ConditionRegistry::with_builtins().resolve(&conditions);
    let (rules, _) = load_rules().await?;
    let snapshot = RuleSnapshot::build(rules, gate, Utc::now());
    let signature = RequestSignature::new(path, scheme, query, &base_path);

    println!(
        "{} {}:{}",
        "🧪 Testing".bright_blue().bold(),
        signature.scheme,
        signature.path.cyan()
    );
    println!();

    let Some(matched) = snapshot
        .index
        .find(&signature.path, signature.scheme, Utc::now())
    else {
        println!("{}", "  No rule matches".yellow());
        return Ok(());
    };

    let rule = matched.rule();
    println!(
        "  Matched: rule {} ({} {})",
        rule.id.to_string().bright_white().bold(),
        rule.kind.as_str(),
        rule.pattern.cyan()
    );

    if let Some(condition) = snapshot.gate.first_veto(rule, &signature) {
        println!("  {} vetoed by '{}'", "✗".red().bold(), condition);
        return Ok(());
    }

    let response = build_response(&matched, signature.query.as_deref(), options);
    println!(
        "  {} {} → {}",
        "✅".green(),
        response.status_code.to_string().bright_green().bold(),
        response.location.as_deref().unwrap_or("(no location)").bright_yellow()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let pool = connect().await?;
            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            let rules: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirect_rules")
                .fetch_one(&pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Rules: {}", rules.to_string().bright_green().bold());
        }
    }

    Ok(())
}
