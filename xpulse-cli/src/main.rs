use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use xpulse_core::{CsvStore, Priority, SystemClock, TaskView, Tracker, WeeklySnapshot};

mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "xpulse", version, about = "XPulse weekly task tracker")]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task to the current week
    Add {
        text: String,

        /// low | medium | high
        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Custom deadline, local time "YYYY-MM-DD HH:MM" (default: Saturday 23:59)
        #[arg(long)]
        due: Option<String>,
    },

    /// Add a bonus task (XP multiplier, marked "[BONUS]")
    Bonus {
        text: String,

        #[arg(long)]
        due: Option<String>,
    },

    /// Mark a task as completed
    Complete { id: String },

    /// Show this week's board, XP, tokens and streak
    Status {
        /// Print the snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.xpulse/config.toml with default values
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "xpulse=debug,xpulse_core=debug"
    } else {
        "xpulse=info,xpulse_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_tracker() -> Result<Tracker<CsvStore, SystemClock>> {
    let cfg = config::load_config()?;
    let path = cfg.tasks_path()?;
    Tracker::new(CsvStore::new(&path), SystemClock, cfg.rewards)
        .with_context(|| format!("opening task sheet {}", path.display()))
}

fn parse_due(tracker: &Tracker<CsvStore, SystemClock>, due: Option<String>) -> Result<Option<DateTime<Utc>>> {
    due.map(|d| tracker.calendar().parse_local_deadline(&d))
        .transpose()
        .context("parsing --due")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Add { text, priority, due } => {
            let tracker = open_tracker()?;
            let due = parse_due(&tracker, due)?;
            let task = tracker.add_task(&text, priority, due)?;
            println!("Added {} ({} XP): {}", task.id, task.xp, task.text);
        }

        Command::Bonus { text, due } => {
            let tracker = open_tracker()?;
            let due = parse_due(&tracker, due)?;
            if !tracker.snapshot()?.show_bonus_panel {
                warn!("bonus tasks are meant for weekdays once the week's tasks are done");
            }
            let task = tracker.add_bonus_task(&text, due)?;
            println!("Added {} ({} XP): {}", task.id, task.xp, task.text);
        }

        Command::Complete { id } => {
            let tracker = open_tracker()?;
            let task = tracker
                .complete_task(&id)
                .with_context(|| format!("completing {id}"))?;
            let xp = tracker.rewards().awarded_xp(&task);
            println!("Completed {} (+{} XP): {}", task.id, xp, task.text);
            if task.token_earned > 0 {
                println!("Token earned! ({})", task.token_earned);
            }
        }

        Command::Status { json } => {
            let tracker = open_tracker()?;
            let snap = tracker.snapshot()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snap)?);
            } else {
                print_snapshot(&tracker, &snap);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn print_task(tracker: &Tracker<CsvStore, SystemClock>, t: &TaskView) {
    let due = tracker.calendar().local(t.deadline).format("%a %Y-%m-%d %H:%M");
    let state = match t.urgency {
        Some(u) => format!("{:?}", u).to_lowercase(),
        None => "done".to_string(),
    };
    println!("- [{}] {} | {} | {} XP | {:?} | due {}", state, t.id, t.text, t.xp, t.priority, due);
}

fn print_snapshot(tracker: &Tracker<CsvStore, SystemClock>, snap: &WeeklySnapshot) {
    println!("# XPulse, week of {}\n", snap.week_start);
    println!(
        "Completed: {} | Pending: {} | XP: {} | Tokens: {} | Streak: {}\n",
        snap.pie_counts[0], snap.pie_counts[1], snap.total_xp, snap.tokens, snap.streak
    );

    if snap.show_weekly_reminder {
        println!("New week, new goals! Add tasks with `xpulse add <text>`.\n");
    }

    println!("## Pending\n");
    for t in &snap.pending {
        print_task(tracker, t);
    }

    if !snap.carried_over.is_empty() {
        println!("\n## Carried over\n");
        for t in &snap.carried_over {
            print_task(tracker, t);
        }
    }

    println!("\n## Done\n");
    for t in &snap.completed {
        print_task(tracker, t);
    }

    println!("\n## Tasks added (Sun..Sat)\n");
    println!("prev: {:?}", snap.bar_counts.prev);
    println!("curr: {:?}", snap.bar_counts.curr);

    if snap.show_bonus_panel {
        println!("\nEarly finish! Add bonus tasks with `xpulse bonus <text>`.");
    }
}
