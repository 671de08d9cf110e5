use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use ticketdash::leaderboard::initials;
use ticketdash::metrics::Tone;
use ticketdash::table::cell_display;
use ticketdash::{
    Config, DateRange, FilterCriteria, GroupBy, LeaderboardSortKey, PageSize, Selection,
    SortDirection, TicketDash, TicketStore,
};

#[derive(Parser)]
#[command(name = "ticketdash", about = "ITSM ticket analytics CLI")]
struct Cli {
    /// Ticket snapshot (default: ~/.ticketdash/tickets.json)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Config file (default: ~/.ticketdash/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluate relative ranges against this instant instead of the clock
    #[arg(long, value_name = "TIMESTAMP")]
    now: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// P1..P4 or "all"
    #[arg(long, default_value = "all")]
    priority: String,
    #[arg(long, default_value = "all")]
    region: String,
    /// Assignment group
    #[arg(long, default_value = "all")]
    group: String,
    #[arg(long, default_value = "all")]
    assignee: String,
    /// Ticket status, e.g. "Open" or "In Progress"
    #[arg(long, default_value = "all")]
    status: String,
    /// all, today, 7d, 30d, 90d, mtd, qtd, ytd or custom:<start>..<end>
    #[arg(long, default_value = "all")]
    range: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what the loaded snapshot contains
    Status {
        #[arg(long)]
        json: bool,
    },
    /// KPI cards with trend against the previous period
    Kpis {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Data behind one dashboard chart
    Chart {
        kind: ChartKind,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Rank resolvers or assignees
    Leaderboard {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "resolver")]
        by: ByArg,
        /// total, sla, reopened, high-hop or name
        #[arg(long, default_value = "total")]
        sort: String,
        #[arg(long, conflicts_with = "desc")]
        asc: bool,
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        json: bool,
    },
    /// Tickets behind a chart element, e.g. priority:P1 or age:8-14:P2
    Drill {
        selection: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Free-text search over the visible columns
        #[arg(long)]
        query: Option<String>,
        /// Column key to sort by; repeat to flip direction
        #[arg(long)]
        sort: Vec<String>,
        /// 20, 50, 100 or 250
        #[arg(long)]
        page_size: Option<u32>,
        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartKind {
    Priority,
    Groups,
    Assignees,
    Ageing,
    Inflow,
    Backlog,
    Mttr,
    Sla,
    MttrPriority,
    Reopen,
}

#[derive(Clone, Copy, ValueEnum)]
enum ByArg {
    Resolver,
    Assignee,
}

impl From<ByArg> for GroupBy {
    fn from(b: ByArg) -> Self {
        match b {
            ByArg::Resolver => GroupBy::Resolver,
            ByArg::Assignee => GroupBy::Assignee,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ticketdash::config::data_dir()?.join("config.json"),
    };
    let config = Config::load_from(&config_path)?;

    let now = match &cli.now {
        Some(s) => ticketdash::date_util::parse_timestamp(s)
            .ok_or_else(|| anyhow::anyhow!("invalid --now timestamp: {s}"))?,
        None => Utc::now(),
    };

    match cli.command {
        Commands::Config { action } => handle_config(config, &config_path, action)?,
        Commands::Status { json } => {
            let dash = open_dash(cli.data.as_deref(), config)?;
            print_status(&dash, json)?;
        }
        Commands::Kpis { filters, json } => {
            let criteria = parse_filters(&filters)?;
            let mut dash = open_dash(cli.data.as_deref(), config)?;
            print_kpis(&mut dash, &criteria, now, json)?;
        }
        Commands::Chart {
            kind,
            filters,
            json,
        } => {
            let criteria = parse_filters(&filters)?;
            let mut dash = open_dash(cli.data.as_deref(), config)?;
            print_chart(&mut dash, kind, &criteria, now, json)?;
        }
        Commands::Leaderboard {
            filters,
            by,
            sort,
            asc,
            desc,
            json,
        } => {
            let criteria = parse_filters(&filters)?;
            let key: LeaderboardSortKey = sort.parse()?;
            let direction = if asc {
                SortDirection::Asc
            } else if desc {
                SortDirection::Desc
            } else {
                key.default_direction()
            };
            let dash = open_dash(cli.data.as_deref(), config)?;
            let board = dash.leaderboard(&criteria, now, by.into(), key, direction);
            if json {
                print_json(&board)?;
            } else {
                print_leaderboard(&board);
            }
        }
        Commands::Drill {
            selection,
            filters,
            query,
            sort,
            page_size,
            page,
            json,
        } => {
            let criteria = parse_filters(&filters)?;
            let selection: Selection = selection.parse()?;
            let dash = open_dash(cli.data.as_deref(), config)?;
            let mut table = dash.open_table(&criteria, now, &selection);
            if let Some(rows) = page_size {
                let size = PageSize::from_rows(rows)
                    .ok_or_else(|| anyhow::anyhow!("page size must be 20, 50, 100 or 250"))?;
                table.set_page_size(size);
            }
            if let Some(q) = query {
                table.set_query(&q);
            }
            for key in &sort {
                table.toggle_sort(key);
            }
            table.set_page(page.saturating_sub(1));
            let view = table.view();
            if json {
                print_json(&view)?;
            } else {
                print_table(&view);
            }
        }
    }

    Ok(())
}

fn open_dash(data: Option<&std::path::Path>, config: Config) -> anyhow::Result<TicketDash> {
    let store = match data {
        Some(path) => TicketStore::load_from(path),
        None => TicketStore::load(),
    }
    .context("loading ticket snapshot")?;
    Ok(TicketDash::new(store, config))
}

fn parse_filters(f: &FilterArgs) -> anyhow::Result<FilterCriteria> {
    let mut criteria = FilterCriteria::new().date_range(DateRange::parse(&f.range)?);
    if let Some(p) = specific(&f.priority) {
        criteria = criteria.priority(p.parse()?);
    }
    if let Some(r) = specific(&f.region) {
        criteria = criteria.region(r);
    }
    if let Some(g) = specific(&f.group) {
        criteria = criteria.assignment_group(g);
    }
    if let Some(a) = specific(&f.assignee) {
        criteria = criteria.assignee(a);
    }
    if let Some(s) = specific(&f.status) {
        criteria = criteria.status(s.parse()?);
    }
    Ok(criteria)
}

/// `None` for "all".
fn specific(value: &str) -> Option<&str> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(v)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_status(dash: &TicketDash, json: bool) -> anyhow::Result<()> {
    let summary = dash.store().summary();
    if json {
        return print_json(&summary);
    }
    println!("Ticket Snapshot");
    if let Some(ref source) = summary.source {
        println!("  Source:   {}", source.display());
    }
    println!("  Tickets:  {}", summary.tickets);
    match (summary.first_created, summary.last_created) {
        (Some(first), Some(last)) => println!(
            "  Created:  {} .. {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => println!("  Created:  -"),
    }
    println!("  Regions:  {}", summary.regions.len());
    println!("  Groups:   {}", summary.groups.len());
    println!("  Statuses:");
    for (status, count) in &summary.statuses {
        println!("    {status:<16} {count}");
    }
    Ok(())
}

fn print_kpis(
    dash: &mut TicketDash,
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let dashboard = dash.dashboard(criteria, now);
    if json {
        return print_json(&dashboard.kpis);
    }
    println!("KPIs ({} tickets, range {})", dashboard.ticket_count, criteria.date_range);
    for card in &dashboard.kpis {
        println!(
            "  {:<18} {:>9.1}  [{:?}]  {}",
            card.title, card.value, card.status, card.trend
        );
    }
    Ok(())
}

fn print_chart(
    dash: &mut TicketDash,
    kind: ChartKind,
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let d = dash.dashboard(criteria, now);
    if json {
        return match kind {
            ChartKind::Priority => print_json(&d.by_priority),
            ChartKind::Groups => print_json(&d.backlog_by_group),
            ChartKind::Assignees => print_json(&d.backlog_by_assignee),
            ChartKind::Ageing => print_json(&d.ageing),
            ChartKind::Inflow => print_json(&d.inflow),
            ChartKind::Backlog => print_json(&d.backlog_trend),
            ChartKind::Mttr => print_json(&d.mttr_trend),
            ChartKind::Sla => print_json(&d.sla),
            ChartKind::MttrPriority => print_json(&d.mttr_by_priority),
            ChartKind::Reopen => print_json(&d.reopen_trend),
        };
    }

    match kind {
        ChartKind::Priority => {
            println!("Current open tickets by priority");
            for r in &d.by_priority {
                println!("  {:<12} {:>6}", r.label, r.count);
            }
        }
        ChartKind::Groups | ChartKind::Assignees => {
            let (title, rows) = match kind {
                ChartKind::Groups => ("Backlog by assignment group", &d.backlog_by_group),
                _ => ("Backlog by assignee", &d.backlog_by_assignee),
            };
            println!("{title}");
            for r in rows {
                println!("  {:<30} {:>6}", r.name, r.count);
            }
        }
        ChartKind::Ageing => {
            println!(
                "Backlog ageing (days)  {:>5} {:>5} {:>5} {:>5} {:>6}",
                "P1", "P2", "P3", "P4", "Total"
            );
            for r in &d.ageing {
                println!(
                    "  {:<20} {:>5} {:>5} {:>5} {:>5} {:>6}",
                    r.bucket, r.counts.p1, r.counts.p2, r.counts.p3, r.counts.p4, r.total
                );
            }
        }
        ChartKind::Inflow | ChartKind::Backlog => {
            let (title, points) = match kind {
                ChartKind::Inflow => ("Ticket inflow", &d.inflow),
                _ => ("Backlog trend", &d.backlog_trend),
            };
            println!("{title}");
            for p in points {
                println!("  {}  {:>5}", p.date, p.count);
            }
        }
        ChartKind::Mttr => {
            println!("MTTR trend (hours)");
            for p in &d.mttr_trend {
                println!("  {}  {:>7.1}  ({} resolved)", p.date, p.mttr, p.resolved);
            }
        }
        ChartKind::Sla => {
            println!("SLA tracking");
            for r in &d.sla {
                println!(
                    "  {:<12} met {:>5}  breached {:>5}  {:>5.1}%",
                    r.label, r.met, r.breached, r.met_rate
                );
            }
        }
        ChartKind::MttrPriority => {
            println!("MTTR by priority (hours)");
            for r in &d.mttr_by_priority {
                println!("  {:<12} {:>7.1}  ({} resolved)", r.label, r.mttr, r.resolved);
            }
        }
        ChartKind::Reopen => {
            println!("Reopen rate by week");
            for w in &d.reopen_trend {
                println!(
                    "  {}  {:>5.1}%  ({}/{})",
                    w.week, w.rate, w.reopened, w.tickets
                );
            }
        }
    }
    Ok(())
}

fn tone_mark(tone: Tone) -> &'static str {
    match tone {
        Tone::Good => "+",
        Tone::Warn => "~",
        Tone::Bad => "!",
        Tone::Neutral => " ",
    }
}

fn print_leaderboard(board: &ticketdash::Leaderboard) {
    println!(
        "Tickets Leaderboard ({}): {} people, {} tickets",
        board.group_by.label(),
        board.people,
        board.tickets
    );
    println!(
        "  {:>4}  {:<3} {:<28} {:>6} {:>9} {:>9} {:>7}",
        "#", "", "Name", "Total", "Reopened", "High-hop", "SLA %"
    );
    for r in &board.rows {
        println!(
            "  {:>4}  {:<3} {:<28} {:>6} {:>8}{} {:>8}{} {:>6.1}{}",
            r.rank,
            initials(&r.name),
            r.name,
            r.total,
            r.reopened,
            tone_mark(r.reopened_tone()),
            r.high_hop,
            tone_mark(r.high_hop_tone()),
            r.sla_met_rate,
            tone_mark(r.sla_tone()),
        );
    }
}

fn print_table(view: &ticketdash::TablePage<'_>) {
    println!("{}", view.title);
    let header: Vec<&str> = view.columns.iter().map(|c| c.label.as_str()).collect();
    println!("  {}", header.join(" | "));
    for row in &view.rows {
        let cells: Vec<String> = view
            .columns
            .iter()
            .map(|c| cell_display(row.get(&c.key)))
            .collect();
        println!("  {}", cells.join(" | "));
    }
    match view.showing() {
        Some((a, b)) => println!(
            "Showing {a}-{b} of {} (page {}/{})",
            view.total_rows,
            view.page + 1,
            view.total_pages
        ),
        None => println!("No matching tickets"),
    }
}

fn handle_config(
    mut config: Config,
    path: &std::path::Path,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(&key)? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            for (k, v) in config.list()? {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}
