//! Command-line surface and dispatch.

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use dutycal_core::DutyStore;

use crate::commands::{self, Context};
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "dutycal")]
#[command(about = "Weekly two-person triage duty rotation and calendar feed")]
pub struct Cli {
    /// Path to config.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding history.json, calendars/ and triage.ics
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Schedule the next duty cycle
    Update {
        /// Number of cycles to add
        #[arg(long, default_value = "1")]
        cycles: usize,
    },
    /// Wipe all state, keeping empty skeleton files
    Reset,
    /// Drop cycles scheduled after the current week
    Clear,
    /// Push history, calendars and the feed to the publish target
    Publish,
    /// Seed local state from the published copy
    Init,
    /// Show the current and latest cycles
    Status,
    /// Regenerate calendars and the feed from history
    Rebuild,
}

impl Cli {
    /// Default log filter when RUST_LOG is unset.
    pub fn default_filter(&self) -> &'static str {
        if self.verbose {
            "dutycal=debug,dutycal_core=debug"
        } else {
            "dutycal=info,dutycal_core=info"
        }
    }

    fn context(&self) -> anyhow::Result<Context> {
        let path = Config::locate(self.config.as_deref())?;
        let config = Config::load(&path)?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        Ok(Context::new(
            config,
            DutyStore::open(&self.data_dir),
            today,
            Utc::now(),
        ))
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = cli.context()?;

    match cli.command {
        Commands::Update { cycles } => {
            let report = commands::update(&ctx, cycles, &mut rand::thread_rng())
                .context("update failed")?;
            for inconsistency in &report.inconsistencies {
                println!("warning: {}", inconsistency);
            }
            for cycle in &report.cycles {
                println!(
                    "{}: {} {:?} / {} {:?}",
                    cycle.start_date,
                    cycle.assignment.first.triager,
                    cycle.assignment.first.components,
                    cycle.assignment.second.triager,
                    cycle.assignment.second.components,
                );
            }
        }
        Commands::Reset => {
            commands::reset(&ctx).context("reset failed")?;
            println!("Reset duty state in {}", ctx.store.root().display());
        }
        Commands::Clear => {
            let report = commands::clear(&ctx).context("clear failed")?;
            if report.is_noop() {
                println!("Nothing scheduled after the current week");
            } else {
                println!("Removed {} cycle(s)", report.cycles_removed.len());
            }
        }
        Commands::Publish => {
            let count = commands::publish(&ctx).await.context("publish failed")?;
            println!("Published {} file(s)", count);
        }
        Commands::Init => {
            let report = commands::init(&ctx).await.context("init failed")?;
            println!(
                "Fetched {} file(s), skipped {}",
                report.fetched.len(),
                report.skipped.len()
            );
            for relative in &report.skipped {
                println!("  skipped {}", relative);
            }
        }
        Commands::Status => {
            let report = commands::status(&ctx).context("status failed")?;
            match &report.current {
                Some(cycle) => println!(
                    "This week ({}): {} & {}",
                    cycle.start_date,
                    cycle.assignment.first.triager,
                    cycle.assignment.second.triager
                ),
                None => println!("No cycle covers {}", ctx.today),
            }
            if let Some(cycle) = &report.latest {
                println!(
                    "Scheduled through {} ({} cycle(s))",
                    cycle.end_date(),
                    report.total
                );
            }
        }
        Commands::Rebuild => {
            let report = commands::rebuild(&ctx).context("rebuild failed")?;
            println!("Rebuilt {} calendar(s)", report.calendars_written);
        }
    }

    Ok(())
}
