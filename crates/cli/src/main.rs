mod config;
mod error;
mod logging;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use editor::{Document, EditorSurface, EditorTools, FormatValue};
use runtime::{Backend, CancellationToken, Orchestrator, ToolHost};
use tokio::sync::mpsc;
use tracing::debug;
use weather::WeatherTools;

use config::Config;
use error::{Error, Result};

const DEFAULT_QUESTION: &str = "What should I wear today in Budapest?";

#[derive(Parser)]
#[command(name = "penman")]
#[command(about = "Edit documents and answer questions through model tool calls", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to ./penman.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a document with natural-language requests
    Edit {
        /// File to load into the editor
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Ask the weather assistant what to wear
    Ask {
        /// The question to ask
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?.with_env(|name| std::env::var(name).ok());

    match cli.command {
        Some(Commands::Edit { file }) => cmd_edit(&config, file.as_deref()).await,
        None => cmd_edit(&config, None).await,
        Some(Commands::Ask { prompt }) => {
            cmd_ask(&config, prompt.as_deref().unwrap_or(DEFAULT_QUESTION)).await
        }
    }
}

/// A line typed at the editor prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Show,
    ClearSelection,
    Select { start: usize, length: usize },
    Request(&'a str),
    Invalid(String),
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let input = match line {
        "quit" | "exit" => Input::Quit,
        ":show" => Input::Show,
        ":clear" => Input::ClearSelection,
        _ => match line.strip_prefix(":select") {
            Some(rest) => parse_selection(rest),
            None if line.starts_with(':') => Input::Invalid(format!("unknown command '{line}'")),
            None => Input::Request(line),
        },
    };
    Some(input)
}

fn parse_selection(args: &str) -> Input<'static> {
    let mut numbers = args.split_whitespace().map(str::parse::<usize>);
    match (numbers.next(), numbers.next(), numbers.next()) {
        (Some(Ok(start)), Some(Ok(length)), None) => Input::Select { start, length },
        _ => Input::Invalid("usage: :select START LENGTH".to_string()),
    }
}

async fn cmd_edit(config: &Config, file: Option<&Path>) -> Result<()> {
    println!("penman v{}", env!("CARGO_PKG_VERSION"));

    let text = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| Error::Document {
            path: path.to_path_buf(),
            source,
        })?,
        None => String::new(),
    };

    let backend = config.backend()?;
    println!("Backend: {backend}");

    let tools = EditorTools::new(Document::from(text.as_str()));
    let mut orchestrator = Orchestrator::new(backend, tools, editor::SYSTEM_INSTRUCTION)
        .with_config(config.orchestrator_config());

    println!("Commands: :show, :select START LENGTH, :clear, quit");
    println!("Press Ctrl+C to cancel a running request, or at the prompt to exit.\n");
    print_document(orchestrator.host().surface());

    let mut lines = stdin_lines();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.recv() => match line {
                Some(line) => line?,
                // EOF
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let Some(input) = parse_input(&line) else {
            continue;
        };
        match input {
            Input::Quit => break,
            Input::Show => print_document(orchestrator.host().surface()),
            Input::ClearSelection => orchestrator.host_mut().surface_mut().clear_selection(),
            Input::Select { start, length } => {
                let document = orchestrator.host_mut().surface_mut();
                document.select(start, length);
                if let Some(selection) = document.selection() {
                    println!("Selected {} characters at {}", selection.length, selection.start);
                }
            }
            Input::Invalid(message) => eprintln!("{message}"),
            Input::Request(request) => {
                let context = editor::context_for(orchestrator.host().surface());
                match cancellable(&mut orchestrator, request, Some(&context)).await {
                    Ok(answer) => {
                        println!("\n{answer}\n");
                        print_document(orchestrator.host().surface());
                    }
                    Err(e) => eprintln!("Error: {e}\n"),
                }
            }
        }
    }

    let usage = orchestrator.usage();
    debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "editor session ended"
    );
    Ok(())
}

async fn cmd_ask(config: &Config, prompt: &str) -> Result<()> {
    let backend = config.backend()?;
    let tools = WeatherTools::new();
    let mut orchestrator = Orchestrator::new(backend, tools, weather::SYSTEM_INSTRUCTION)
        .with_config(config.orchestrator_config());

    let answer = cancellable(&mut orchestrator, prompt, None).await?;
    println!("{answer}");
    Ok(())
}

/// Lines from stdin, read on a detached thread so a pending read never
/// blocks shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run one request, cancelling it when Ctrl+C is pressed.
async fn cancellable<B: Backend, H: ToolHost>(
    orchestrator: &mut Orchestrator<B, H>,
    prompt: &str,
    context: Option<&str>,
) -> runtime::Result<String> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = orchestrator.run_with_cancel(prompt, context, &cancel).await;
    watcher.abort();
    result
}

fn print_document(document: &Document) {
    println!("----");
    println!("{}", document.text());
    println!("----");
    for line in describe_formats(document) {
        println!("{line}");
    }
    println!();
}

/// One line per formatted run and per formatted line of the document.
fn describe_formats(document: &Document) -> Vec<String> {
    let mut out = Vec::new();

    for run in document.runs() {
        if run.formats.is_empty() {
            continue;
        }
        let end = run.start + run.text.chars().count();
        out.push(format!(
            "  [{}..{}] {:?} {}",
            run.start,
            end,
            run.text,
            describe(run.formats.iter())
        ));
    }

    for (number, (text, formats)) in document.lines().into_iter().enumerate() {
        if formats.is_empty() {
            continue;
        }
        out.push(format!(
            "  line {} {:?} {}",
            number + 1,
            text,
            describe(formats.iter())
        ));
    }

    out
}

fn describe<'a, K: std::fmt::Display + 'a>(
    formats: impl Iterator<Item = (&'a K, &'a FormatValue)>,
) -> String {
    formats
        .map(|(style, value)| format!("{style}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repl_commands() {
        assert_eq!(parse_input("   "), None);
        assert_eq!(parse_input("quit\n"), Some(Input::Quit));
        assert_eq!(parse_input("exit"), Some(Input::Quit));
        assert_eq!(parse_input(":show"), Some(Input::Show));
        assert_eq!(parse_input(":clear"), Some(Input::ClearSelection));
        assert_eq!(
            parse_input(":select 4 10"),
            Some(Input::Select {
                start: 4,
                length: 10
            })
        );
        assert_eq!(
            parse_input("make the title bold"),
            Some(Input::Request("make the title bold"))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(matches!(parse_input(":select 4"), Some(Input::Invalid(_))));
        assert!(matches!(parse_input(":select a b"), Some(Input::Invalid(_))));
        assert!(matches!(parse_input(":select 1 2 3"), Some(Input::Invalid(_))));
        assert!(matches!(parse_input(":undo"), Some(Input::Invalid(_))));
    }

    #[test]
    fn describes_inline_and_line_formats() {
        let mut document = Document::from("Title\nbody");
        document.format_inline(editor::InlineStyle::Bold, 0, 5, &FormatValue::Bool(true));
        document.format_block(editor::BlockStyle::Header, 0, 1, &FormatValue::parse("1"));

        assert_eq!(
            describe_formats(&document),
            vec![
                "  [0..5] \"Title\" bold=true".to_string(),
                "  line 1 \"Title\" header=1".to_string(),
            ]
        );
    }

    #[test]
    fn plain_document_has_no_format_lines() {
        assert!(describe_formats(&Document::from("plain text")).is_empty());
    }
}
