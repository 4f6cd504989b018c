//! `placement`: command-line client for the placement manager.
//!
//! # Usage
//!
//! ```
//! placement login officer officer123
//! placement applications
//! placement applications accept app1
//! placement --api-url http://localhost:3000 jobs posted
//! ```

mod app;
mod client;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use app::{App, Console, render};
use clap::{Args, Parser, Subcommand};
use placement_core::{
  desk::JobDraft,
  gateway::MutationOutcome,
  record::Record,
  status::{Action, CollectionKind},
};
use placement_store_sqlite::SqliteKv;
use settings::ClientSettings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "placement", version, about = "Placement manager client")]
struct Cli {
  /// Path to a TOML settings file (default: ./placement.toml if present).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite file holding the local collections and session.
  #[arg(long, value_name = "PATH")]
  store: Option<PathBuf>,

  /// Base URL of the placement API.
  #[arg(long, value_name = "URL")]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log in with one of the built-in accounts.
  Login { username: String, password: String },
  Logout,
  /// Show the logged-in user.
  Whoami,
  /// List locally stored jobs.
  Jobs {
    /// Only jobs whose title or company contains this text.
    #[arg(short, long)]
    search: Option<String>,

    #[command(subcommand)]
    action: Option<JobsCommand>,
  },
  /// Apply to a job (students).
  Apply { job_id: String },
  /// List the applications visible to the logged-in user.
  Applications {
    #[command(subcommand)]
    action: Option<ApplicationsCommand>,
  },
  /// Placement statistics (officers and admins).
  Report,
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
  /// Jobs as listed by the API.
  Posted,
  /// Accept a job (placement officers).
  Accept { id: String },
  /// Post a new job (employers).
  Post(PostArgs),
}

#[derive(Args, Debug)]
struct PostArgs {
  #[arg(long)]
  title:        String,
  #[arg(long)]
  location:     String,
  /// Employment type, e.g. Full-time.
  #[arg(long = "type", default_value = "Full-time")]
  kind:         String,
  /// Defaults to the employer's company.
  #[arg(long)]
  company:      Option<String>,
  #[arg(long)]
  salary:       Option<String>,
  #[arg(long)]
  description:  Option<String>,
  #[arg(long)]
  requirements: Option<String>,
}

impl From<PostArgs> for JobDraft {
  fn from(args: PostArgs) -> Self {
    Self {
      title:        args.title,
      company:      args.company,
      location:     args.location,
      salary:       args.salary,
      kind:         args.kind,
      description:  args.description,
      requirements: args.requirements,
    }
  }
}

#[derive(Subcommand, Debug)]
enum ApplicationsCommand {
  /// Accept an application (placement officers).
  Accept { id: String },
  /// Reject an application (placement officers).
  Reject { id: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = ClientSettings::load(cli.config.as_deref())?
    .with_overrides(cli.api_url, cli.store);

  let kv = SqliteKv::open(&settings.store_path).with_context(|| {
    format!("failed to open store at {}", settings.store_path.display())
  })?;
  let app = App::new(settings, Arc::new(kv), Console)?;

  run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
  let today = chrono::Local::now().date_naive();

  match command {
    Command::Login { username, password } => {
      app.login(&username, &password)?;
    }
    Command::Logout => app.logout(),
    Command::Whoami => match app.whoami() {
      Some(user) => println!("{} ({}, {})", user.name, user.username, user.role),
      None => println!("not logged in"),
    },
    Command::Jobs { search, action: None } => {
      print_records(CollectionKind::Jobs, &app.jobs(search.as_deref()));
    }
    Command::Jobs { action: Some(JobsCommand::Posted), .. } => {
      print_records(CollectionKind::Jobs, &app.posted_jobs().await);
    }
    Command::Jobs { action: Some(JobsCommand::Accept { id }), .. } => {
      print_outcome(CollectionKind::Jobs, &app.accept_job(&id).await?);
    }
    Command::Jobs { action: Some(JobsCommand::Post(args)), .. } => {
      let job = app.post_job(args.into(), today)?;
      println!("{}", render(CollectionKind::Jobs, &job));
    }
    Command::Apply { job_id } => {
      if let Some(application) = app.apply(&job_id, today)? {
        println!("{}", render(CollectionKind::Applications, &application));
      }
    }
    Command::Applications { action: None } => {
      print_records(CollectionKind::Applications, &app.applications()?);
    }
    Command::Applications { action: Some(review) } => {
      let (id, action) = match review {
        ApplicationsCommand::Accept { id } => (id, Action::Accept),
        ApplicationsCommand::Reject { id } => (id, Action::Reject),
      };
      let outcome = app.review_application(&id, action).await?;
      print_outcome(CollectionKind::Applications, &outcome);
    }
    Command::Report => println!("{}", app.report()?),
  }

  Ok(())
}

fn print_records(kind: CollectionKind, records: &[Record]) {
  if records.is_empty() {
    println!("no {kind}");
    return;
  }
  for record in records {
    println!("{}", render(kind, record));
  }
}

fn print_outcome(kind: CollectionKind, outcome: &MutationOutcome) {
  println!("{}", render(kind, outcome.record()));
}
