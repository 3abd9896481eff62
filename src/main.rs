use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_sampler::cli_style::{
    get_styles, print_empty_list, print_error, print_key_value, print_success, print_warning,
    print_welcome, TableBuilder,
};
use movie_sampler::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DB_NAME,
    DEFAULT_FETCH_TIMEOUT_SEC, DEFAULT_SAMPLE_SIZE,
};
use movie_sampler::csv_io::{read_population_csv, write_sample_csv};
use movie_sampler::dataset::{parse_list, DatasetKey, DatasetRecord, DatasetUpserter, ManualFields};
use movie_sampler::fetcher::ImdbFetcher;
use movie_sampler::movie_store::{
    DatasetStore, PopulationRecord, PopulationStore, SqliteMovieStore, TitleFilter,
};
use movie_sampler::{Sampler, Session};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Samples and prunes a movie population, and curates a movie dataset.
#[derive(Parser, Debug)]
#[command(styles=get_styles(), version)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the movie database.
    #[clap(long, env = "MOVIE_SAMPLER_DB_DIR", value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Name of the movie database, stored as `<db-dir>/<db-name>.db`.
    #[clap(long, env = "MOVIE_SAMPLER_DB_NAME", default_value = DEFAULT_DB_NAME)]
    pub db_name: String,

    /// Timeout in seconds for title page requests.
    #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SEC)]
    pub fetch_timeout_sec: u64,

    /// How long a database call waits on a locked database, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    /// User-Agent sent when fetching title pages.
    #[clap(long)]
    pub user_agent: Option<String>,

    /// Sample size used when a sampling command is given none.
    #[clap(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    pub default_sample_size: usize,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            db_name: self.db_name.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            fetch_timeout_sec: self.fetch_timeout_sec,
            user_agent: self.user_agent.clone(),
            default_sample_size: self.default_sample_size,
        }
    }
}

#[derive(Parser)]
#[command(styles=get_styles(),name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Checks that the movie database answers.
    Ping,

    /// Shows the size of the population, the filtered population and the dataset.
    Count,

    /// Filters the population by a case-insensitive title substring.
    /// Without a query the filter is cleared.
    Filter { query: Vec<String> },

    /// Lists the filtered population.
    List {
        #[clap(long, default_value_t = 20)]
        limit: usize,
    },

    /// Shows the selected movie.
    Show,

    /// Selects another movie at random from the filtered population.
    Next,

    /// Deletes the selected movie from the population.
    Delete {
        /// Confirm the deletion.
        #[clap(long)]
        yes: bool,
    },

    /// Draws a random sample without changing anything. The sample can then
    /// be deleted with `commit`.
    Sample {
        size: Option<usize>,

        /// Only sample movies whose title contains this text. Defaults to
        /// the active `filter`.
        #[clap(long)]
        filter: Option<String>,

        /// Also write the sample to this CSV file.
        #[clap(long, value_parser = parse_path)]
        csv: Option<PathBuf>,
    },

    /// Deletes exactly the movies of the last sample.
    Commit {
        /// Confirm the deletion.
        #[clap(long)]
        yes: bool,
    },

    /// Draws a random sample and deletes it right away.
    SampleDelete {
        size: Option<usize>,

        /// Defaults to the active `filter`.
        #[clap(long)]
        filter: Option<String>,

        /// Confirm the deletion.
        #[clap(long)]
        yes: bool,
    },

    /// Fetches year, rating, votes and runtime from a title page.
    Fetch { url: String },

    /// Saves a record to the dataset, merging it with any stored record
    /// with the same URL (or title and year when there is no URL).
    /// List values are comma separated.
    Save {
        #[clap(long)]
        url: Option<String>,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        genres: Option<String>,
        #[clap(long)]
        director: Option<String>,
        #[clap(long)]
        writer: Option<String>,
        #[clap(long)]
        country: Option<String>,
        #[clap(long)]
        year: Option<i32>,
        #[clap(long)]
        rating: Option<f64>,
        #[clap(long)]
        votes: Option<i64>,
        #[clap(long)]
        runtime: Option<i32>,
        #[clap(long)]
        gross_profit: Option<u64>,
    },

    /// Shows a stored dataset record.
    Dataset {
        #[clap(long, conflicts_with_all = ["title", "year"])]
        url: Option<String>,
        #[clap(long, requires = "year")]
        title: Option<String>,
        #[clap(long, requires = "title")]
        year: Option<i32>,
    },

    /// Imports population records from a CSV file with `ID,Movie` columns.
    /// Existing ids are left untouched.
    Seed {
        #[clap(value_parser = parse_path)]
        path: PathBuf,
    },

    /// Shows the path of the current movie database.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = "movies> ";

struct ShellContext {
    config: AppConfig,
    store: Arc<SqliteMovieStore>,
    upserter: DatasetUpserter,
    session: Session,
}

fn print_records(records: &[PopulationRecord]) {
    if records.is_empty() {
        print_empty_list("No movies");
        return;
    }
    let mut table = TableBuilder::new(vec!["ID", "Movie"]);
    for record in records {
        table.add_row(vec![record.id.to_string(), record.title.clone()]);
    }
    table.print();
}

fn print_dataset_record(record: &DatasetRecord) {
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    print_key_value("URL", &or_dash(record.url.clone()));
    print_key_value("Title", &or_dash(record.title.clone()));
    print_key_value("Year", &or_dash(record.year.map(|v| v.to_string())));
    print_key_value("Rating", &or_dash(record.rating.map(|v| v.to_string())));
    print_key_value("Votes", &or_dash(record.vote_count.map(|v| v.to_string())));
    print_key_value(
        "Runtime",
        &or_dash(record.runtime_minutes.map(|v| format!("{} min", v))),
    );
    print_key_value("Genres", &record.genres.join(", "));
    print_key_value("Director", &record.director.join(", "));
    print_key_value("Writer", &record.writer.join(", "));
    print_key_value("Country", &record.country.join(", "));
    if let Some(gross_profit) = record.gross_profit {
        print_key_value("Gross profit", &gross_profit.to_string());
    }
}

fn print_selection(ctx: &ShellContext) {
    match ctx.session.selection.selected() {
        Some(record) => {
            print_key_value("Filter", &ctx.session.selection.filter().to_string());
            print_key_value("ID", &record.id.to_string());
            print_key_value("Movie", &record.title);
        }
        None => print_empty_list("No movie matches the current filter"),
    }
}

fn reload_selection(ctx: &mut ShellContext) -> Result<()> {
    ctx.session.selection.reload(&*ctx.store)?;
    Ok(())
}

fn run_command(command: InnerCommand, ctx: &mut ShellContext) -> Result<CommandExecutionResult> {
    let store = ctx.store.clone();
    match command {
        InnerCommand::Ping => {
            store.ping()?;
            print_success("Connected to the movie database");
        }
        InnerCommand::Count => {
            let total = store.count_population(&TitleFilter::all())?;
            print_key_value("Population", &total.to_string());
            print_key_value(
                "Filtered",
                &ctx.session.selection.filtered().len().to_string(),
            );
            print_key_value("Dataset", &ctx.upserter.count()?.to_string());
        }
        InnerCommand::Filter { query } => {
            let query = query.join(" ");
            let matches = ctx
                .session
                .selection
                .apply_filter(&*store, &query)?
                .len();
            print_success(&format!("{} movies match", matches));
            print_selection(ctx);
        }
        InnerCommand::List { limit } => {
            let filtered = ctx.session.selection.filtered();
            print_records(&filtered[..filtered.len().min(limit)]);
            if filtered.len() > limit {
                print_empty_list(&format!("... and {} more", filtered.len() - limit));
            }
        }
        InnerCommand::Show => print_selection(ctx),
        InnerCommand::Next => {
            ctx.session.selection.refresh(&*store)?;
            print_selection(ctx);
        }
        InnerCommand::Delete { yes } => {
            if !yes {
                print_selection(ctx);
                print_warning("Run `delete --yes` to delete this movie");
                return Ok(CommandExecutionResult::Ok);
            }
            let deleted = ctx.session.selection.delete_selected(&*store)?;
            print_success(&format!("Deleted {} ({})", deleted.title, deleted.id));
            print_selection(ctx);
        }
        InnerCommand::Sample { size, filter, csv } => {
            let size = size.unwrap_or(ctx.config.default_sample_size);
            let filter = ctx.session.sample_filter(filter.as_deref());
            let sample = Sampler::new(&*store).preview_sample(size, &filter)?;
            print_records(&sample);
            if let Some(path) = csv {
                write_sample_csv(&path, &sample)?;
                print_success(&format!("Sample written to {}", path.display()));
            }
            ctx.session.remember_preview(sample);
        }
        InnerCommand::Commit { yes } => {
            let Some(sample) = ctx.session.previewed_sample() else {
                return Ok(CommandExecutionResult::Error(
                    "No sample to commit, draw one with `sample`".to_string(),
                ));
            };
            if !yes {
                print_records(sample);
                print_warning(&format!(
                    "Run `commit --yes` to delete these {} movies",
                    sample.len()
                ));
                return Ok(CommandExecutionResult::Ok);
            }
            let result = ctx.session.commit_preview(&*store);
            reload_selection(ctx)?;
            print_success(&format!("Deleted {} movies", result?));
        }
        InnerCommand::SampleDelete { size, filter, yes } => {
            if !yes {
                print_warning("Run `sample-delete --yes` to draw and delete a sample");
                return Ok(CommandExecutionResult::Ok);
            }
            let size = size.unwrap_or(ctx.config.default_sample_size);
            let filter = ctx.session.sample_filter(filter.as_deref());
            let result = Sampler::new(&*store).draw_and_delete(size, &filter);
            reload_selection(ctx)?;
            let deleted = result?;
            print_records(&deleted);
            print_success(&format!("Deleted {} movies", deleted.len()));
        }
        InnerCommand::Fetch { url } => match ctx.upserter.fetch_auto_fields(&url) {
            Ok(fields) => {
                let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
                print_key_value("Year", &show(fields.year.map(|v| v.to_string())));
                print_key_value("Rating", &show(fields.rating.map(|v| v.to_string())));
                print_key_value("Votes", &show(fields.vote_count.map(|v| v.to_string())));
                print_key_value(
                    "Runtime",
                    &show(fields.runtime_minutes.map(|v| format!("{} min", v))),
                );
                let missing = fields.missing_fields();
                if !missing.is_empty() {
                    print_warning(&format!("Not on the page: {}", missing.join(", ")));
                }
                ctx.session.remember_fetch(&url, fields);
            }
            Err(err) => {
                ctx.session.clear_fetch();
                return Err(err.into());
            }
        },
        InnerCommand::Save {
            url,
            title,
            genres,
            director,
            writer,
            country,
            year,
            rating,
            votes,
            runtime,
            gross_profit,
        } => {
            let list = |value: Option<String>| value.as_deref().map(parse_list).unwrap_or_default();
            let gross_profit = gross_profit
                .map(i64::try_from)
                .transpose()
                .context("Gross profit is too large")?;
            let manual = ManualFields {
                title,
                genres: list(genres),
                year,
                rating,
                director: list(director),
                vote_count: votes,
                writer: list(writer),
                country: list(country),
                runtime_minutes: runtime,
                gross_profit,
            };
            let auto = ctx.session.auto_fields_for(url.as_deref());
            let (record, outcome) = ctx.upserter.save(url.as_deref(), manual, &auto)?;
            print_success(&format!("Dataset record {:?}", outcome));
            print_dataset_record(&record);
        }
        InnerCommand::Dataset { url, title, year } => {
            let key = match (url, title, year) {
                (Some(url), _, _) => DatasetKey::Url(url.trim().to_string()),
                (None, Some(title), Some(year)) => DatasetKey::TitleYear {
                    title: title.trim().to_string(),
                    year,
                },
                _ => {
                    return Ok(CommandExecutionResult::Error(
                        "Give either --url or both --title and --year".to_string(),
                    ))
                }
            };
            match ctx.upserter.lookup(&key)? {
                Some(record) => print_dataset_record(&record),
                None => print_empty_list(&format!("No dataset record for {}", key)),
            }
        }
        InnerCommand::Seed { path } => {
            let records = read_population_csv(&path)?;
            let inserted = store.insert_population_records(&records)?;
            info!("Seeded {} of {} records from {:?}", inserted, records.len(), path);
            reload_selection(ctx)?;
            print_success(&format!(
                "Inserted {} movies ({} already present)",
                inserted,
                records.len() - inserted
            ));
        }
        InnerCommand::Where => {
            println!("{}", ctx.config.db_path().display());
        }
        InnerCommand::Exit => return Ok(CommandExecutionResult::Exit),
    }
    Ok(CommandExecutionResult::Ok)
}

fn execute_command(line: String, ctx: &mut ShellContext) -> CommandExecutionResult {
    if line.trim().is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match run_command(cli.command, ctx) {
                Ok(result) => result,
                Err(err) => CommandExecutionResult::Error(format!("{:#}", err)),
            }
        }
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            CommandExecutionResult::Ok
        }
    }
}

#[derive(rustyline_derive::Hinter)]
struct ShellHelper {
    commands_names: Vec<String>,
}

impl ShellHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        ShellHelper { commands_names }
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening movie database at {:?}...", config.db_path());
    let store = Arc::new(SqliteMovieStore::new(
        config.db_path(),
        config.busy_timeout(),
    )?);
    store
        .ping()
        .context("The movie database does not answer")?;

    let fetcher = Arc::new(ImdbFetcher::new(&config.user_agent, config.fetch_timeout())?);
    let upserter = DatasetUpserter::new(fetcher, store.clone());

    let mut ctx = ShellContext {
        config,
        store,
        upserter,
        session: Session::new(),
    };
    reload_selection(&mut ctx)?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<ShellHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(ShellHelper::new()));

    print_welcome(
        &ctx.config.db_path().display().to_string(),
        ctx.store.count_population(&TitleFilter::all())?,
        ctx.store.count_dataset_records()?,
    );
    print_selection(&ctx);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &mut ctx) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => print_error(&err),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
