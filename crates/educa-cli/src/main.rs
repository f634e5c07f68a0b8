use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use educa_cli::integrity::{IntegrityReport, Snapshot};
use educa_cli::seeder::{self, SeedConfig};
use educa_cli::{connect, create_admin, keepalive};

#[derive(Parser)]
#[command(name = "educa-cli")]
#[command(about = "Educa+ CLI - Administrative tools for Educa+", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Full name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake users, classes, tasks and submissions
    Seed {
        /// Number of classes
        #[arg(short = 'c', long, default_value = "4")]
        classes: usize,

        /// Number of teachers
        #[arg(long, default_value = "3")]
        teachers: usize,

        /// Number of managers
        #[arg(long, default_value = "1")]
        managers: usize,

        /// Students enrolled in each class
        #[arg(long, default_value = "20")]
        students: usize,

        /// Tasks per class
        #[arg(long, default_value = "5")]
        tasks: usize,

        /// Fraction of student/task pairs with a submission
        #[arg(long, default_value = "0.7")]
        submission_rate: f64,

        /// Fraction of students with a guardian
        #[arg(long, default_value = "0.5")]
        guardian_rate: f64,
    },
    /// Delete seeded users and classes
    ClearSeed,
    /// Report rows breaking role and enrollment rules (non-zero exit on issues)
    CheckIntegrity,
    /// Ping the database periodically
    KeepAlive {
        /// Seconds between pings
        #[arg(short = 'i', long, default_value = "300")]
        interval: u64,

        /// Stop after this many pings
        #[arg(long)]
        count: Option<u64>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("educa_cli=info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(name, email, password).await,
        Commands::Seed {
            classes,
            teachers,
            managers,
            students,
            tasks,
            submission_rate,
            guardian_rate,
        } => {
            let config = SeedConfig {
                classes,
                teachers,
                managers,
                students_per_class: students,
                tasks_per_class: tasks,
                submission_rate,
                guardian_rate,
                ..SeedConfig::default()
            };
            handle_seed(config).await
        }
        Commands::ClearSeed => handle_clear_seed().await,
        Commands::CheckIntegrity => handle_check_integrity().await,
        Commands::KeepAlive { interval, count } => handle_keep_alive(interval, count).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn handle_create_admin(
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<ExitCode> {
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Full name").interact_text()?,
    };
    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    let pool = connect().await?;
    let user_id = create_admin(&pool, &name, &email, &password).await?;

    println!("\n✅ Administrator created successfully!");
    println!("   ID: {user_id}");
    println!("   Email: {}", email.trim().to_lowercase());
    println!("   Name: {}", name.trim());

    Ok(ExitCode::SUCCESS)
}

async fn handle_seed(config: SeedConfig) -> anyhow::Result<ExitCode> {
    let pool = connect().await?;
    seeder::seed_all(&pool, config).await?;
    Ok(ExitCode::SUCCESS)
}

async fn handle_clear_seed() -> anyhow::Result<ExitCode> {
    let pool = connect().await?;
    seeder::clear_all(&pool).await?;
    Ok(ExitCode::SUCCESS)
}

async fn handle_check_integrity() -> anyhow::Result<ExitCode> {
    let pool = connect().await?;
    let snapshot = Snapshot::load(&pool).await?;
    let report = IntegrityReport::check(&snapshot);

    println!(
        "🔎 Checked {} users, {} classes, {} enrollments, {} tasks, {} submissions, {} guardian links",
        snapshot.roles.len(),
        snapshot.classes.len(),
        snapshot.enrollments.len(),
        snapshot.tasks.len(),
        snapshot.submissions.len(),
        snapshot.guardian_links.len(),
    );

    if report.is_clean() {
        println!("✅ No integrity issues found");
        return Ok(ExitCode::SUCCESS);
    }

    println!("❌ {} integrity issue(s) found:", report.issues.len());
    for issue in &report.issues {
        println!("   - {issue}");
    }

    Ok(ExitCode::FAILURE)
}

async fn handle_keep_alive(interval: u64, count: Option<u64>) -> anyhow::Result<ExitCode> {
    if interval == 0 {
        anyhow::bail!("--interval must be at least 1 second");
    }

    let pool = connect().await?;
    let stats = keepalive::run(&pool, Duration::from_secs(interval), count).await;

    println!(
        "Pinged {} time(s), {} failure(s)",
        stats.total, stats.failures
    );

    Ok(if stats.failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
