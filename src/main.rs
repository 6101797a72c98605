use clap::CommandFactory;
use clap::{Parser, Subcommand};
use clap_complete::ArgValueCompleter;
use clap_complete::CompletionCandidate;
use stmtchat::commands::shared::ChatTarget;
use stmtchat::utils::{init_tracing, setup_crypto_provider};

// Use jemalloc on musl x86_64 for better performance
#[cfg(all(target_env = "musl", target_arch = "x86_64"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(
    name = "stmtchat",
    about = "Ask questions about financial PDF statements from the terminal",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\n",
        "Build Information:\n",
        "  Timestamp:         ", env!("VERGEN_BUILD_TIMESTAMP"), "\n",
        "  Target Triple:     ", env!("VERGEN_CARGO_TARGET_TRIPLE"), "\n",
        "\n",
        "Source Control:\n",
        "  Commit SHA:        ", env!("VERGEN_GIT_SHA"), "\n",
        "  Commit Timestamp:  ", env!("VERGEN_GIT_COMMIT_TIMESTAMP"), "\n",
        "  Branch:            ", env!("VERGEN_GIT_BRANCH"), "\n",
        "\n",
        "Compiler:\n",
        "  Rustc Version:     ", env!("VERGEN_RUSTC_SEMVER"), "\n",
        "  Rustc Channel:     ", env!("VERGEN_RUSTC_CHANNEL"), "\n",
        "  Host Triple:       ", env!("VERGEN_RUSTC_HOST_TRIPLE"), "\n"
    ),
    disable_help_subcommand = true
)]
struct Cli {
    /// Profile whose documents and chats to use.
    #[arg(
        short,
        long,
        global = true,
        env = "STMTCHAT_PROFILE",
        default_value = "demo1",
        add = ArgValueCompleter::new(profile_completer)
    )]
    profile: String,

    /// Model as provider/model, e.g. gemini/gemini-2.5-pro or openai/gpt-4o.
    #[arg(short, long, global = true, env = "STMTCHAT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ChatArg {
    /// Chat title or index from `stmtchat chats` (negative counts from the end).
    #[arg(short, long, allow_hyphen_values = true, add = ArgValueCompleter::new(chat_completer))]
    chat: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured profiles.
    Profiles,
    /// List the chats of the profile.
    Chats,
    /// List the profile's suggested questions.
    Questions,
    /// Show the conversation of a chat.
    History(ChatArg),
    /// Ask one question about a chat's document.
    ///
    /// The question is taken from the argument, from the profile's suggested
    /// questions with --question, or from stdin when piped.
    Ask {
        #[command(flatten)]
        chat: ChatArg,
        /// Ask suggested question N (see `stmtchat questions`).
        #[arg(short, long, value_name = "N", conflicts_with = "text")]
        question: Option<usize>,
        text: Option<String>,
    },
    /// Start an interactive conversation.
    Chat(ChatArg),
    /// Delete a chat's history and its prompt cache.
    Clear(ChatArg),
    /// Open a chat's PDF in the viewer ($STMTCHAT_PDF_VIEWER or the system opener).
    View(ChatArg),
    /// Show instructions for enabling shell completions.
    Completions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_crypto_provider();

    clap_complete::CompleteEnv::with_factory(Cli::command).complete();

    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let target = |arg: ChatArg| ChatTarget {
        profile: cli.profile.clone(),
        model: cli.model.clone(),
        chat: arg.chat,
    };

    let result = match cli.command {
        Commands::Profiles => stmtchat::commands::profiles::run(cli.model.clone()),
        Commands::Chats => stmtchat::commands::chats::list(cli.profile.clone(), cli.model.clone()),
        Commands::Questions => {
            stmtchat::commands::chats::questions(cli.profile.clone(), cli.model.clone())
        }
        Commands::History(arg) => stmtchat::commands::chats::history(target(arg)),
        Commands::Ask {
            chat,
            question,
            text,
        } => stmtchat::commands::ask::run(target(chat), text, question).await,
        Commands::Chat(arg) => stmtchat::commands::chat::run(target(arg)).await,
        Commands::Clear(arg) => stmtchat::commands::clear::run(target(arg)).await,
        Commands::View(arg) => stmtchat::commands::view::run(target(arg)),
        Commands::Completions => {
            println!(
                "Bash:\n\
                echo \"source <(COMPLETE=bash stmtchat)\" >> ~/.bashrc\n\
                \n\
                Elvish:\n\
                echo \"eval (E:COMPLETE=elvish stmtchat | slurp)\" >> ~/.elvish/rc.elv\n\
                \n\
                Fish:\n\
                echo \"COMPLETE=fish stmtchat | source\" >> ~/.config/fish/config.fish\n\
                \n\
                Zsh:\n\
                echo \"source <(COMPLETE=zsh stmtchat)\" >> ~/.zshrc\n"
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn profile_set() -> Option<stmtchat::profiles::ProfileSet> {
    match std::env::var("STMTCHAT_PROFILES") {
        Ok(path) => stmtchat::profiles::ProfileSet::load(std::path::Path::new(&path)).ok(),
        Err(_) => stmtchat::profiles::ProfileSet::builtin().ok(),
    }
}

fn profile_completer(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    let current_input = current.to_string_lossy();
    profile_set()
        .map(|set| set.ids())
        .unwrap_or_default()
        .into_iter()
        .filter(|id| id.starts_with(current_input.as_ref()))
        .map(CompletionCandidate::new)
        .collect()
}

fn chat_completer(current: &std::ffi::OsStr) -> Vec<CompletionCandidate> {
    let current_input = current.to_string_lossy();
    let profile_id = stmtchat::commands::shared::completion_profile(std::env::args())
        .or_else(|| std::env::var("STMTCHAT_PROFILE").ok())
        .unwrap_or_else(|| "demo1".into());
    let Some(set) = profile_set() else {
        return vec![];
    };
    let Ok(profile) = set.get(&profile_id) else {
        return vec![];
    };
    profile
        .chats
        .iter()
        .map(|c| c.title.clone())
        .filter(|t| t.starts_with(current_input.as_ref()))
        .map(CompletionCandidate::new)
        .collect()
}
