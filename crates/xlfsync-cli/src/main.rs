use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;
mod settings;
mod ui;

#[derive(Parser)]
#[command(name = "xlfsync", version, about = "Keep XLIFF translation files in sync with the generated source file")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only log warnings and errors to the console
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync target files with the generator file
    Refresh {
        /// Generator file (*.g.xlf)
        #[arg(long, required_unless_present = "dir")]
        generator: Option<PathBuf>,
        /// Target files; defaults to every other .xlf next to the generator
        #[arg(long)]
        target: Vec<PathBuf>,
        /// Translation folder holding one *.g.xlf and its targets
        #[arg(long, conflicts_with = "generator")]
        dir: Option<PathBuf>,
        /// Only reorder and prune units
        #[arg(long, default_value_t = false)]
        sort_only: bool,
        /// "external" (state attributes) or "tokens" (bracket markers)
        #[arg(long)]
        mode: Option<String>,
        /// Do not fill new units from matching sources
        #[arg(long, default_value_t = false)]
        no_match: bool,
        /// Extra files to take suggestions from
        #[arg(long)]
        suggestions: Vec<PathBuf>,
        /// Write nothing if any target fails to load
        #[arg(long, default_value_t = false)]
        all_or_nothing: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Reorder target files like the generator file without editing content
    Sort {
        #[arg(long, required_unless_present = "dir")]
        generator: Option<PathBuf>,
        #[arg(long)]
        target: Vec<PathBuf>,
        #[arg(long, conflicts_with = "generator")]
        dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List units still waiting for a translation
    Untranslated {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        /// Translated file whose targets replace the source text
        #[arg(long)]
        source_file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List translated units, optionally narrowed by state
    Translated {
        file: PathBuf,
        /// translated, needs-review, final or signed-off
        #[arg(long, default_value = "")]
        state: String,
        /// Only units with exactly this source text
        #[arg(long)]
        source_text: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        source_file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Search units by keyword or regular expression
    Search {
        file: PathBuf,
        #[arg(long)]
        keyword: String,
        #[arg(long, default_value_t = false)]
        case_sensitive: bool,
        #[arg(long, default_value_t = false)]
        regex: bool,
        /// Search target texts instead of sources
        #[arg(long, default_value_t = false)]
        in_target: bool,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show source texts with their distinct translations
    Map {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Save translations listed in a JSON file
    Save {
        file: PathBuf,
        /// JSON array of {"id", "target_text", "target_state"?}
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Create a new target file from the generator file
    CreateTarget {
        #[arg(long)]
        generator: PathBuf,
        /// Target language code, e.g. sv-SE
        #[arg(long)]
        lang: String,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long, default_value_t = false)]
        no_match: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write JSON Schemas of the report and row types
    Schema {
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Refresh { .. } => "refresh",
            Commands::Sort { .. } => "sort",
            Commands::Untranslated { .. } => "untranslated",
            Commands::Translated { .. } => "translated",
            Commands::Search { .. } => "search",
            Commands::Map { .. } => "map",
            Commands::Save { .. } => "save",
            Commands::CreateTarget { .. } => "create-target",
            Commands::Schema { .. } => "schema",
        }
    }
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = self.name();
        info!("▶ Starting command: {}", cmd_name);

        let result = match self {
            Commands::Refresh {
                generator,
                target,
                dir,
                sort_only,
                mode,
                no_match,
                suggestions,
                all_or_nothing,
                format,
            } => commands::refresh::run_refresh(
                commands::refresh::RefreshArgs {
                    generator,
                    targets: target,
                    dir,
                    sort_only,
                    mode,
                    no_match,
                    suggestions,
                    all_or_nothing,
                },
                format,
                use_color,
            ),

            Commands::Sort {
                generator,
                target,
                dir,
                format,
            } => commands::refresh::run_refresh(
                commands::refresh::RefreshArgs {
                    generator,
                    targets: target,
                    dir,
                    sort_only: true,
                    mode: None,
                    no_match: true,
                    suggestions: Vec::new(),
                    all_or_nothing: false,
                },
                format,
                use_color,
            ),

            Commands::Untranslated {
                file,
                offset,
                limit,
                source_file,
                format,
            } => commands::query::run_untranslated(file, offset, limit, source_file, format, use_color),

            Commands::Translated {
                file,
                state,
                source_text,
                offset,
                limit,
                source_file,
                format,
            } => commands::query::run_translated(
                commands::query::TranslatedArgs {
                    file,
                    state,
                    source_text,
                    offset,
                    limit,
                    source_file,
                },
                format,
                use_color,
            ),

            Commands::Search {
                file,
                keyword,
                case_sensitive,
                regex,
                in_target,
                offset,
                limit,
                format,
            } => commands::query::run_search(
                file,
                keyword,
                xlfsync_services::KeywordOptions {
                    case_sensitive,
                    is_regex: regex,
                    search_in_target: in_target,
                },
                offset,
                limit,
                format,
                use_color,
            ),

            Commands::Map {
                file,
                offset,
                limit,
                format,
            } => commands::query::run_map(file, offset, limit, format, use_color),

            Commands::Save {
                file,
                input,
                mode,
                format,
            } => commands::save::run_save(file, input, mode, format),

            Commands::CreateTarget {
                generator,
                lang,
                overwrite,
                mode,
                no_match,
                format,
            } => commands::create_target::run_create_target(
                generator, lang, overwrite, mode, no_match, format, use_color,
            ),

            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };

        match &result {
            Ok(_) => info!("✔ Finished command: {}", cmd_name),
            Err(e) => error!("✖ Command {} failed: {:?}", cmd_name, e),
        }

        result
    }
}

fn init_tracing(quiet: bool) -> WorkerGuard {
    let file_appender = rolling::daily("logs", "xlfsync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(cli.quiet);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
