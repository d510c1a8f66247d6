//! `mais` — command-line access to the MaIS Account and Workgroup APIs.
//!
//! # Usage
//!
//! ```
//! mais --config ~/.config/mais/config.toml account show leland
//! mais account validate "leland, jane nobody"
//! mais account changed --days 7 --status inactive --functional
//! mais workgroup show test:1
//! mais workgroup member-of --user leland
//! ```
//!
//! Every setting can also come from `MAIS__*` environment variables, e.g.
//! `MAIS__CERT=/etc/mais/client.pem`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use mais_account::{AccountClient, AccountStatus, validate_str};
use mais_core::{MaisClient, MaisConfig, logging};
use mais_workgroup::{
  MembershipSet, Workgroup, WorkgroupClient, WorkgroupFilter, WorkgroupVisibility,
};
use serde::Serialize;
use tracing::debug;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mais", about = "Query the MaIS Account and Workgroup APIs")]
struct Args {
  /// Path to a TOML config file (environment, cert, key, urls, log).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Log at debug level unless RUST_LOG says otherwise.
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Account lookups.
  #[command(subcommand)]
  Account(AccountCommand),
  /// Workgroup lookups and searches.
  #[command(subcommand)]
  Workgroup(WorkgroupCommand),
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
  /// Show one account.
  Show { id: String },
  /// Sort identifiers into full, base, inactive and unknown.
  Validate {
    /// Identifiers; each may itself hold several, separated by commas or
    /// whitespace.
    #[arg(required = true)]
    ids: Vec<String>,
  },
  /// Accounts whose status changed recently.
  Changed {
    #[arg(long, default_value_t = 1)]
    days:       u32,
    /// active, inactive or pending.
    #[arg(long, default_value = "active")]
    status:     AccountStatus,
    /// Functional accounts instead of people.
    #[arg(long)]
    functional: bool,
  },
}

#[derive(Subcommand, Debug)]
enum WorkgroupCommand {
  /// Show one workgroup with its membership.
  Show { name: String },
  /// Workgroups whose names match a pattern (`*` is a wildcard).
  Search { pattern: String },
  /// Workgroups something is directly a member or administrator of.
  MemberOf(MemberOf),
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct MemberOf {
  #[arg(long)]
  user:        Option<String>,
  #[arg(long)]
  certificate: Option<String>,
  #[arg(long)]
  workgroup:   Option<String>,
}

// ─── Output shapes ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Members {
  people:       Vec<String>,
  workgroups:   Vec<String>,
  certificates: Vec<String>,
}

impl From<MembershipSet> for Members {
  fn from(set: MembershipSet) -> Self {
    Self {
      people:       set.people().iter().collect(),
      workgroups:   set.workgroups().iter().collect(),
      certificates: set.certificates().iter().collect(),
    }
  }
}

#[derive(Serialize)]
struct WorkgroupSummary {
  name:               String,
  description:        String,
  filter:             WorkgroupFilter,
  visibility:         WorkgroupVisibility,
  privgroup:          bool,
  reusable:           bool,
  last_update:        NaiveDate,
  last_refresh:       DateTime<Utc>,
  can_see_membership: bool,
  members:            Members,
  administrators:     Members,
}

impl WorkgroupSummary {
  fn new(workgroup: &Workgroup) -> Result<Self> {
    Ok(Self {
      name:               workgroup.name().to_owned(),
      description:        workgroup.description()?,
      filter:             workgroup.filter_policy()?,
      visibility:         workgroup.visibility()?,
      privgroup:          workgroup.has_privilege_projection()?,
      reusable:           workgroup.is_cross_stem_reusable()?,
      last_update:        workgroup.last_update()?,
      last_refresh:       workgroup.last_refresh(),
      can_see_membership: workgroup.can_see_membership()?,
      members:            workgroup.members()?.into(),
      administrators:     workgroup.administrators()?.into(),
    })
  }
}

fn print(value: &impl Serialize) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value).context("encoding output")?);
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  let args = Args::parse();

  let mut config = MaisConfig::load(args.config.as_deref()).context("loading configuration")?;
  if args.verbose {
    config.log.level = "debug".to_owned();
  }
  logging::init(&config.log);
  debug!(environment = ?config.environment, "configuration loaded");

  let client = MaisClient::from_config(&config).context("building MaIS client")?;

  match args.command {
    Command::Account(command) => account(AccountClient::new(client), command),
    Command::Workgroup(command) => workgroup(WorkgroupClient::new(client), command),
  }
}

fn account(client: AccountClient, command: AccountCommand) -> Result<()> {
  match command {
    AccountCommand::Show { id } => {
      let account = client.get(&id).with_context(|| format!("looking up account {id}"))?;
      print(&*account)
    }
    AccountCommand::Validate { ids } => {
      let joined = ids.join(" ");
      print(&validate_str(&joined, &client).context("validating identifiers")?)
    }
    AccountCommand::Changed { days, status, functional } => {
      let changed = client
        .get_changed_status(days, status, !functional)
        .with_context(|| format!("searching for accounts {status} in the last {days} days"))?;
      print(&changed)
    }
  }
}

fn workgroup(client: WorkgroupClient, command: WorkgroupCommand) -> Result<()> {
  match command {
    WorkgroupCommand::Show { name } => {
      let workgroup = client.get(&name).with_context(|| format!("looking up workgroup {name}"))?;
      print(&WorkgroupSummary::new(&workgroup)?)
    }
    WorkgroupCommand::Search { pattern } => {
      let found = client
        .search_by_name(&pattern)
        .with_context(|| format!("searching for workgroups named {pattern}"))?;
      print(&found)
    }
    WorkgroupCommand::MemberOf(MemberOf { user, certificate, workgroup }) => {
      let results = match (user, certificate, workgroup) {
        (Some(id), None, None) => client.search_by_user(&id),
        (None, Some(id), None) => client.search_by_certificate(&id),
        (None, None, Some(name)) => client.search_by_workgroup(&name),
        _ => bail!("exactly one of --user, --certificate or --workgroup is required"),
      };
      print(&results.context("searching related workgroups")?)
    }
  }
}
