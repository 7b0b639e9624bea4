use std::io::Read;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use coordimate_engine::{
    add_member, collect_candidates, compute_group_schedule, find_match, GroupRoster,
    IntervalRecord, MatchOptions, Participant, RandomCoffeeRecord, RandomSource, Schedule,
    SeededRandom, ThreadRandom,
};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "coordimate",
    version,
    about = "Compute group schedules and random-coffee matches",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge member schedules into a group schedule
    GroupSchedule {
        /// JSON file with an array of member schedules ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// JSON file with one more member, merged incrementally
        #[arg(long)]
        add: Option<String>,

        /// Print the group's free time instead of its schedule
        #[arg(long, default_value = "false")]
        free: bool,
    },

    /// Try to match a user with a group-mate
    Match {
        /// JSON file with the seed user id, group rosters and options ("-" for stdin)
        #[arg(short, long)]
        input: String,

        /// Current instant (RFC 3339); defaults to the system clock
        #[arg(long)]
        now: Option<String>,

        /// Seed for a reproducible random pick
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// A roster member as stored: an id plus random-coffee preferences.
#[derive(Deserialize)]
struct MemberInput {
    user_id: String,
    #[serde(default)]
    random_coffee: RandomCoffeeRecord,
}

#[derive(Deserialize)]
struct GroupInput {
    group_id: String,
    members: Vec<MemberInput>,
}

#[derive(Deserialize)]
struct MatchInput {
    seed: String,
    groups: Vec<GroupInput>,
    #[serde(default)]
    options: MatchOptions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::GroupSchedule { input, add, free } => group_schedule(&input, add.as_deref(), free),
        Commands::Match { input, now, seed } => run_match(&input, now.as_deref(), seed),
    }
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("coordimate=debug,coordimate_engine=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt.json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt)
            .try_init(),
    }
    .context("failed to initialise logging")
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

fn read_schedule(path: &str) -> Result<Schedule> {
    let records: Vec<IntervalRecord> = serde_json::from_str(&read_input(path)?)
        .with_context(|| format!("{path} is not an array of intervals"))?;
    Ok(Schedule::from_records(&records))
}

fn group_schedule(input: &str, add: Option<&str>, free: bool) -> Result<()> {
    let members: Vec<Vec<IntervalRecord>> = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("{input} is not an array of member schedules"))?;
    let members: Vec<Schedule> = members.iter().map(|m| Schedule::from_records(m)).collect();

    let mut group = compute_group_schedule(&members)?;
    tracing::info!(members = members.len(), slots = group.len(), "computed group schedule");

    if let Some(path) = add {
        group = add_member(&group, &read_schedule(path)?)?;
        tracing::info!(slots = group.len(), "added member");
    }

    let output = if free {
        serde_json::to_string_pretty(&group.free())?
    } else {
        serde_json::to_string_pretty(&group.to_records())?
    };
    println!("{output}");
    Ok(())
}

fn run_match(input: &str, now: Option<&str>, seed: Option<u64>) -> Result<()> {
    let request: MatchInput = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("{input} is not a match request"))?;
    let now = match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid --now '{s}'"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let MatchInput {
        seed: seed_id,
        groups,
        options,
    } = request;
    options.validate()?;

    // A bad record only fails the run when it belongs to the seed; any other
    // member is left out of matching.
    let groups: Vec<GroupRoster> = groups
        .into_iter()
        .map(|group| {
            let members = group
                .members
                .into_iter()
                .filter_map(|member| match member.random_coffee.to_window() {
                    Ok(window) => Some(Ok(Participant {
                        user_id: member.user_id,
                        window,
                    })),
                    Err(err) if member.user_id == seed_id => {
                        Some(Err(anyhow::Error::new(err).context(format!("user {}", member.user_id))))
                    }
                    Err(err) => {
                        tracing::warn!(
                            user = %member.user_id,
                            group = %group.group_id,
                            error = %err,
                            "skipping member with invalid random-coffee record"
                        );
                        None
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(GroupRoster {
                group_id: group.group_id,
                members,
            })
        })
        .collect::<Result<_>>()?;

    let seed_user = groups
        .iter()
        .flat_map(|group| &group.members)
        .find(|member| member.user_id == seed_id)
        .cloned()
        .with_context(|| format!("seed user {seed_id} is not in any group"))?;
    let candidates = collect_candidates(&seed_user.user_id, &groups);

    let mut rng: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom::new()),
    };
    let found = find_match(&seed_user, &candidates, now, &options, &mut *rng);
    if found.is_none() {
        tracing::info!(seed = %seed_user.user_id, "no match");
    }

    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}
