//! athena CLI: dashboard and quiz operations from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use athena_core::navigator::QuestionFilter;

mod commands;

#[derive(Parser)]
#[command(name = "athena", version, about = "Quiz sets and study sessions from the terminal")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// What `render` treats its input as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderMode {
    /// Question text: images and math
    Question,
    /// Explanation text: images, math and line breaks
    Explanation,
    /// Bot response markdown
    Bot,
}

/// Local option shuffling shared by `review` and `answer`.
#[derive(Args)]
struct ShuffleArgs {
    /// Show options in shuffled order
    #[arg(long)]
    shuffle_options: bool,

    /// Shuffle seed; the same seed gives the same option order
    #[arg(long, default_value_t = 0, requires = "shuffle_options")]
    seed: u64,
}

impl ShuffleArgs {
    fn seed(&self) -> Option<u64> {
        self.shuffle_options.then_some(self.seed)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List quiz sets with progress and grades
    List {
        /// Layout width in columns (default: $COLUMNS or 80)
        #[arg(long)]
        width: Option<u16>,
    },

    /// Show the questions of a quiz set
    Review {
        /// Quiz set id
        quiz_set: String,

        /// all, favorites, answered, unanswered or incorrect
        #[arg(long, default_value = "all")]
        filter: QuestionFilter,

        /// Only questions containing this keyword
        #[arg(long)]
        search: Option<String>,

        /// Mark the correct option of each question
        #[arg(long)]
        answers: bool,

        #[command(flatten)]
        shuffle: ShuffleArgs,
    },

    /// Answer a question of a quiz set
    Answer {
        /// Quiz set id
        quiz_set: String,

        /// Question number within the quiz set, from 1
        number: usize,

        /// Option letter, e.g. B; omit to clear the selection
        option: Option<char>,

        #[command(flatten)]
        shuffle: ShuffleArgs,
    },

    /// Add a question to favorites, or remove it
    Favorite {
        /// Quiz set id
        quiz_set: String,

        /// Question number within the quiz set, from 1
        number: usize,
    },

    /// Show whether answers are revealed for a quiz set
    Answers {
        /// Quiz set id
        quiz_set: String,

        /// Flip between shown and hidden
        #[arg(long)]
        toggle: bool,
    },

    /// Grade a quiz set
    Submit {
        /// Quiz set id
        quiz_set: String,

        /// Submit even with unanswered questions
        #[arg(long)]
        force: bool,
    },

    /// Clear every answer of a quiz set
    Reset {
        /// Quiz set id
        quiz_set: String,
    },

    /// Store a new question order for a quiz set
    Shuffle {
        /// Quiz set id
        quiz_set: String,
    },

    /// Render question, explanation or bot text as HTML
    Render {
        /// Input file (default: stdin)
        file: Option<PathBuf>,

        /// Quiz set id used for image paths
        #[arg(long, default_value = "local")]
        quiz_set: String,

        #[arg(long, value_enum, default_value = "question")]
        mode: RenderMode,
    },

    /// Further explanation of a question
    Explain {
        /// Quiz set id
        quiz_set: String,

        /// Question id
        question: i64,

        /// Generate a new explanation instead of reusing the saved one
        #[arg(long)]
        regenerate: bool,
    },

    /// Discussion comments of a question
    Comments {
        /// Question id
        question: i64,
    },

    /// Rename a quiz set
    Rename {
        /// Quiz set id
        quiz_set: String,

        /// New title
        title: String,
    },

    /// Delete a quiz set
    Delete {
        /// Quiz set id
        quiz_set: String,
    },

    /// Show or toggle grade locks
    Lock {
        /// Toggle the lock of this quiz set
        quiz_set: Option<String>,

        /// Toggle the global lock
        #[arg(long, conflicts_with = "quiz_set")]
        global: bool,
    },

    /// Scrape question banks into a new quiz set
    Scrape {
        /// Title of the new quiz set
        #[arg(long)]
        title: String,

        /// File with one source per line (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Show the source URLs of a quiz set as ranges
    Urls {
        /// Quiz set id
        quiz_set: String,
    },

    /// Download the printable PDF of a quiz set
    Download {
        /// Quiz set id
        quiz_set: String,

        /// Output file
        #[arg(long)]
        output: PathBuf,
    },

    /// Show or replace the study notes
    Notes {
        /// Replace the notes with the content of this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Time left until a date, with the quote of the day
    Countdown {
        /// Target date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        until: String,

        /// Keep updating every second until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("athena=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::List { width } => commands::list::execute(config, width).await,
        Commands::Review {
            quiz_set,
            filter,
            search,
            answers,
            shuffle,
        } => {
            commands::review::execute(config, quiz_set, filter, search, answers, shuffle.seed())
                .await
        }
        Commands::Answer {
            quiz_set,
            number,
            option,
            shuffle,
        } => commands::quiz::answer(config, quiz_set, number, option, shuffle.seed()).await,
        Commands::Favorite { quiz_set, number } => {
            commands::favorite::execute(config, quiz_set, number).await
        }
        Commands::Answers { quiz_set, toggle } => {
            commands::favorite::answers(config, quiz_set, toggle).await
        }
        Commands::Submit { quiz_set, force } => {
            commands::quiz::submit(config, quiz_set, force).await
        }
        Commands::Reset { quiz_set } => commands::quiz::reset(config, quiz_set).await,
        Commands::Shuffle { quiz_set } => commands::quiz::shuffle(config, quiz_set).await,
        Commands::Render {
            file,
            quiz_set,
            mode,
        } => commands::render::execute(file, quiz_set, mode),
        Commands::Explain {
            quiz_set,
            question,
            regenerate,
        } => commands::explain::execute(config, quiz_set, question, regenerate).await,
        Commands::Comments { question } => commands::explain::comments(config, question).await,
        Commands::Rename { quiz_set, title } => {
            commands::manage::rename(config, quiz_set, title).await
        }
        Commands::Delete { quiz_set } => commands::manage::delete(config, quiz_set).await,
        Commands::Lock { quiz_set, global } => {
            commands::manage::lock(config, quiz_set, global).await
        }
        Commands::Scrape { title, input } => commands::scrape::execute(config, title, input).await,
        Commands::Urls { quiz_set } => commands::manage::urls(config, quiz_set).await,
        Commands::Download { quiz_set, output } => {
            commands::manage::download(config, quiz_set, output).await
        }
        Commands::Notes { save } => commands::notes::execute(config, save).await,
        Commands::Countdown { until, watch } => commands::countdown::execute(until, watch).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
