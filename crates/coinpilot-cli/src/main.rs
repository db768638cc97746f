//! coinpilot - meme coin market assistant

mod analyze;
mod commands;
mod config;
mod utils;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use coinpilot_ai::{Attachment, coin::DateRange, providers::openai::OpenAIProvider};
use coinpilot_chat::{ChatEvent, ChatSession, ProviderTransport, SessionHandle};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// coinpilot - chat with a market analyst about meme coins
#[derive(Parser, Debug)]
#[command(name = "coinpilot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat
    Chat {
        /// Image to attach to the first message (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// Ask a single question and stream the answer
    Ask {
        prompt: String,

        /// Image to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// Structured market analysis
    Analyze {
        #[command(subcommand)]
        target: AnalyzeTarget,
    },

    /// Create the config file
    InitConfig,
}

#[derive(Subcommand, Debug)]
enum AnalyzeTarget {
    /// Analyze a coin record (JSON file) and its price history
    Coin {
        file: PathBuf,

        /// Window for the reported price change (1h, 24h, 7d, 30d)
        #[arg(long, default_value = "24h")]
        range: DateRange,

        /// Prices ordered oldest first, comma separated
        #[arg(long, value_delimiter = ',')]
        prices: Vec<f64>,
    },

    /// Analyze a chart screenshot
    Chart { image: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose || std::env::var_os("RUST_LOG").is_some() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("coinpilot=debug,coinpilot_ai=debug,coinpilot_chat=debug")
        });
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    if let Command::InitConfig = args.command {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();
    let model = cfg.resolve_model(args.model.as_deref());

    let Some(api_key) = cfg.get_api_key() else {
        eprintln!("Error: No API key found");
        eprintln!();
        eprintln!(
            "Set your API key with: export {}=your-key",
            coinpilot_ai::providers::openai::API_KEY_ENV
        );
        eprintln!("Or add it to config file: coinpilot init-config");
        std::process::exit(1);
    };

    match args.command {
        Command::Chat { images } => {
            let transport = Arc::new(ProviderTransport::with_api_key(api_key));
            let mut session = ChatSession::new(cfg.session_config(model), transport);
            spawn_interrupt_listener(session.handle());
            run_interactive(&mut session, images).await
        }
        Command::Ask { prompt, images } => {
            let transport = Arc::new(ProviderTransport::with_api_key(api_key));
            let mut session = ChatSession::new(cfg.session_config(model), transport);
            spawn_interrupt_listener(session.handle());
            run_command(&mut session, &prompt, images).await
        }
        Command::Analyze { target } => {
            let provider = OpenAIProvider::new(api_key);
            let analysis = match target {
                AnalyzeTarget::Coin {
                    file,
                    range,
                    prices,
                } => analyze::analyze_coin(&provider, &model, &file, range, prices).await?,
                AnalyzeTarget::Chart { image } => {
                    analyze::analyze_chart(&provider, &model, &image).await?
                }
            };
            println!("{}", analyze::format_analysis(&analysis));
            Ok(())
        }
        Command::InitConfig => Ok(()),
    }
}

fn attachments(paths: Vec<PathBuf>) -> Vec<Attachment> {
    paths.into_iter().map(Attachment::file).collect()
}

/// What to send for the next reply
enum Outgoing {
    Message(String, Vec<Attachment>),
    Retry(Uuid),
}

/// Print reply text as it streams in; ends with the exchange.
fn spawn_printer(
    mut receiver: broadcast::Receiver<ChatEvent>,
    interactive: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut printed = 0;
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match event {
                ChatEvent::ExchangeUpdated { text, .. } => {
                    // Use chars().count() for proper Unicode handling
                    let text_chars: Vec<char> = text.chars().collect();
                    if text_chars.len() > printed {
                        let new_text: String = text_chars[printed..].iter().collect();
                        print!("{}", new_text);
                        io::stdout().flush().ok();
                        printed = text_chars.len();
                    }
                }
                ChatEvent::ExchangeCommitted { .. } => {
                    println!();
                    break;
                }
                ChatEvent::ExchangeFailed {
                    error, retryable, ..
                } => {
                    eprintln!("\nError: {}", error);
                    if interactive && retryable {
                        eprintln!("Type /retry to try again.");
                    }
                    break;
                }
                ChatEvent::ExchangeCancelled { kept, .. } => {
                    println!("\n[cancelled{}]", if kept { "" } else { ", discarded" });
                    break;
                }
                _ => {}
            }
        }
    })
}

/// Route Ctrl-C for the life of the process.
///
/// The first listener replaces the default SIGINT behavior, so idle presses
/// have to exit explicitly.
fn spawn_interrupt_listener(handle: SessionHandle) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !interrupt(&handle) {
                std::process::exit(130);
            }
        }
    });
}

/// Abort the reply in flight. Returns false when nothing is streaming.
fn interrupt(handle: &SessionHandle) -> bool {
    if handle.is_running() {
        handle.abort();
        true
    } else {
        false
    }
}

/// Send and print the reply as it streams.
async fn stream_reply(
    session: &mut ChatSession,
    outgoing: Outgoing,
    interactive: bool,
) -> anyhow::Result<Uuid> {
    let printer = spawn_printer(session.subscribe(), interactive);

    let result = match outgoing {
        Outgoing::Message(text, attachments) => session.submit(text, attachments).await,
        Outgoing::Retry(id) => session.retry(id).await,
    };
    if result.is_ok() {
        printer.await.ok();
    } else {
        printer.abort();
    }
    Ok(result?)
}

async fn run_command(
    session: &mut ChatSession,
    prompt: &str,
    images: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let outgoing = Outgoing::Message(prompt.to_string(), attachments(images));
    let id = stream_reply(session, outgoing, false).await?;

    if let Some(error) = session.exchange(id).and_then(|e| e.error.clone()) {
        anyhow::bail!("request failed: {}", error);
    }
    Ok(())
}

async fn run_interactive(session: &mut ChatSession, images: Vec<PathBuf>) -> anyhow::Result<()> {
    let available_models = coinpilot_ai::models::get_all_models();
    let mut pending_images = attachments(images);

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("coinpilot ({})", session.config().model.id);
        if !pending_images.is_empty() {
            eprintln!(
                "{} image(s) will be attached to your first message",
                pending_images.len()
            );
        }
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(result) = commands::execute_command(input, session, &available_models) {
            match result {
                commands::CommandResult::Clear => {
                    session.reset()?;
                    println!("Cleared conversation.");
                }
                commands::CommandResult::Exit => {
                    break;
                }
                commands::CommandResult::Message(msg) => {
                    println!("{}", msg);
                }
                commands::CommandResult::ChangeModel(new_model) => {
                    println!("Switched to: {}", new_model.id);
                    session.set_model(new_model);
                }
                commands::CommandResult::Retry(id) => {
                    println!();
                    stream_reply(session, Outgoing::Retry(id), true).await?;
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        println!();
        let attachments = std::mem::take(&mut pending_images);
        let outgoing = Outgoing::Message(input.to_string(), attachments);
        stream_reply(session, outgoing, true).await?;
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinpilot_chat::SessionConfig;
    use std::time::Duration;

    fn session_for(model: coinpilot_ai::Model) -> ChatSession {
        let transport = Arc::new(ProviderTransport::with_api_key("test"));
        ChatSession::new(SessionConfig::new(model), transport)
    }

    #[test]
    fn test_interrupt_when_idle_requests_exit() {
        let session = session_for(coinpilot_ai::models::default_model());
        assert!(!interrupt(&session.handle()));
    }

    #[tokio::test]
    async fn test_interrupt_aborts_reply_in_flight() {
        // Accepts connections but never answers, so the reply stays open
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let model = coinpilot_ai::models::resolve_model("gpt-4o-mini", Some(&base_url));

        let mut session = session_for(model);
        let handle = session.handle();
        let task = tokio::spawn(async move {
            let result = session.submit("hello", Vec::new()).await;
            (session, result)
        });

        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_running() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(interrupt(&handle));

        let (session, result) = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        result.unwrap();
        assert!(session.exchanges().is_empty());
        assert!(session.context().is_empty());
        assert!(!interrupt(&handle));
        drop(listener);
    }
}
