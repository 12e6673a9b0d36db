use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "runboard",
    version,
    about = "Ingest Jenkins pipeline history and query failure heatmaps"
)]
pub struct Cli {
    /// SQLite database URL (`sqlite:///runs.db`, `sqlite://` for in-memory, or a bare path).
    /// Falls back to DATABASE_URL.
    #[arg(long, global = true, env = "RUNBOARD_DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(flatten)]
    pub jenkins: JenkinsArgs,

    /// Time between ingestion cycles for `watch` (e.g. 30m, 1h)
    #[arg(
        long,
        global = true,
        env = "RUNBOARD_INGEST_INTERVAL",
        default_value = "1h",
        value_parser = humantime::parse_duration
    )]
    pub interval: Duration,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct JenkinsArgs {
    /// Jenkins base URL, optionally with embedded `user:apitoken@`
    #[arg(long, global = true, env = "JENKINS_URL")]
    pub jenkins_url: Option<String>,

    /// Jenkins basic auth as `user:apitoken`
    #[arg(
        long,
        global = true,
        env = "JENKINS_CREDENTIALS",
        hide_env_values = true
    )]
    pub jenkins_credentials: Option<String>,

    /// Pipeline branch to ingest
    #[arg(
        long,
        global = true,
        env = "RUNBOARD_PIPELINE_BRANCH",
        default_value = runboard_jenkins::DEFAULT_BRANCH
    )]
    pub branch: String,

    /// Jenkins request timeout in seconds
    #[arg(
        long = "timeout",
        global = true,
        env = "RUNBOARD_JENKINS_TIMEOUT",
        default_value_t = 30
    )]
    pub timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one ingestion cycle and print its summary
    Ingest,
    /// Run the ingestion loop until Ctrl-C
    Watch,
    /// List stored pipeline runs
    Results(ResultsArgs),
    /// Print the stage failure heatmap
    Heatmap(HeatmapArgs),
    /// List projects, or the repositories of one project
    Projects(ProjectsArgs),
    /// Route a read request (e.g. `/results/?latest=true`) and print the body
    Get(GetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ResultsArgs {
    #[arg(long)]
    pub project: Option<String>,

    #[arg(long)]
    pub repo: Option<String>,

    /// Only the latest run of each repository
    #[arg(long)]
    pub latest: bool,

    /// Only runs started at least this many weeks ago
    #[arg(long)]
    pub weeks_ago: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HeatmapArgs {
    /// Group one project's failures by repository instead of all failures by project
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectsArgs {
    pub project: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Request target: path plus optional query string
    pub target: String,

    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,
}
