use crate::engine::CardGenerationService;
use crate::model::{GeneratorConfig, WorkflowSnapshot};
use crate::orchestrator::{join_counts, run_controller, GenerationWorkflow, UiCommand};
use crate::text_summary::{build_card_lines, build_text_summary};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "flashcard-gen",
    version,
    about = "Turn a block of text into study flash cards with a language model"
)]
pub struct Cli {
    /// API key for the generation service (falls back to $API_KEY)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the generation service
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    pub base_url: String,

    /// Model used for analysis and generation
    #[arg(long, default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Transport timeout for each provider request
    #[arg(long, default_value = "60s")]
    pub request_timeout: humantime::Duration,

    /// Read the text from this file ("-" reads stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Number of cards to generate in batch modes (default: largest offered)
    #[arg(long)]
    pub count: Option<u32>,

    /// Print the final snapshot as JSON and exit
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print generated cards as text and exit
    #[arg(long)]
    pub text: bool,

    /// Print every answer instead of only the flipped card's
    #[arg(long)]
    pub show_answers: bool,

    /// Also write the generated cards to this JSON file
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

impl Cli {
    pub fn is_batch(&self) -> bool {
        self.json || self.text
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.is_batch() {
        return run_batch(args).await;
    }
    run_interactive(args).await
}

/// Build a `GeneratorConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> GeneratorConfig {
    GeneratorConfig {
        api_key: args
            .api_key
            .clone()
            .or_else(|| std::env::var("API_KEY").ok()),
        base_url: args.base_url.clone(),
        model: args.model.clone(),
        request_timeout: Duration::from(args.request_timeout),
        user_agent: format!("flashcard-gen/{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("read input {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("read input from stdin")?;
            Ok(text)
        }
    }
}

/// Pick the count to generate: the requested one if it was offered, otherwise the largest option.
/// Initial draft for an interactive session. Stdin carries the session
/// commands there, so `-` cannot also supply the text.
fn read_session_draft(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        None => Ok(None),
        Some(p) if p == Path::new("-") => anyhow::bail!(
            "--input - reads stdin, which carries commands in an interactive session; \
             pass a file path or use --text/--json for a batch run"
        ),
        Some(p) => std::fs::read_to_string(p)
            .map(Some)
            .with_context(|| format!("read input {}", p.display())),
    }
}

pub(crate) fn choose_count(requested: Option<u32>, options: &[u32]) -> Result<u32> {
    match requested {
        Some(n) if options.contains(&n) => Ok(n),
        Some(n) => Err(anyhow::anyhow!(
            "--count {n} is not available for this text; choose one of: {}",
            join_counts(options)
        )),
        None => options
            .iter()
            .copied()
            .max()
            .context("analysis produced no card counts"),
    }
}

/// Analyze, generate and print once.
async fn run_batch(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let service = CardGenerationService::from_config(&cfg)?;
    let text = read_input(args.input.as_deref()).await?;
    let mut workflow = GenerationWorkflow::new(service);

    workflow.analyze(&text).await.context("analysis failed")?;
    let count = choose_count(args.count, &workflow.snapshot().count_options)?;
    workflow
        .generate(count)
        .await
        .context("card generation failed")?;

    let (out_tx, out_handle) = spawn_output_writer();
    let snap = workflow.snapshot();

    if let Some(path) = args.export_json.as_deref() {
        crate::storage::export_json(path, &crate::storage::build_export(snap, &cfg))?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Exported: {}", path.display())));
    }

    if args.json {
        let out = serde_json::to_string_pretty(snap)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in build_card_lines(snap, args.show_answers).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

const HELP_LINES: &[&str] = &[
    "Commands:",
    "  text <...>     Replace the draft text",
    "  add <...>      Append a line to the draft",
    "  analyze        Ask for a range of card counts",
    "  count <N>      Generate N cards",
    "  flip <N>       Show or hide the answer of card N",
    "  back           Return to editing (keeps the draft)",
    "  reset          Start over",
    "  help           Show this help",
    "  quit           Exit",
];

/// What one line typed into the interactive session asks for.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SessionInput {
    Command(UiCommand),
    Help,
    Nothing,
}

pub(crate) fn parse_session_line(line: &str) -> Result<SessionInput, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let number = |what: &str| -> Result<u32, String> {
        rest.parse::<u32>()
            .map_err(|_| format!("`{word}` needs a {what}, e.g. `{word} 4`"))
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(SessionInput::Nothing),
        "help" | "?" => return Ok(SessionInput::Help),
        "text" => UiCommand::SetText(rest.to_string()),
        "add" => UiCommand::AppendText(rest.to_string()),
        "analyze" => UiCommand::Analyze,
        "count" | "generate" => UiCommand::Generate(number("card count")?),
        "flip" => match number("card number")? {
            0 => return Err("card numbers start at 1".into()),
            n => UiCommand::Flip(n as usize - 1),
        },
        "back" => UiCommand::BackToEdit,
        "reset" => UiCommand::Reset,
        "quit" | "exit" | "q" => UiCommand::Quit,
        other => return Err(format!("unknown command `{other}` (type `help`)")),
    };
    Ok(SessionInput::Command(cmd))
}

/// Read session commands from stdin on a plain thread.
///
/// A blocked stdin read must not hold up runtime shutdown, so this does not
/// use `spawn_blocking`.
fn spawn_command_reader(
    cmd_tx: mpsc::UnboundedSender<UiCommand>,
    out_tx: mpsc::UnboundedSender<OutputLine>,
) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_session_line(&line) {
                Ok(SessionInput::Command(cmd)) => {
                    let quit = cmd == UiCommand::Quit;
                    if cmd_tx.send(cmd).is_err() || quit {
                        return;
                    }
                }
                Ok(SessionInput::Help) => {
                    for l in HELP_LINES {
                        let _ = out_tx.send(OutputLine::Stdout((*l).to_string()));
                    }
                }
                Ok(SessionInput::Nothing) => {}
                Err(msg) => {
                    let _ = out_tx.send(OutputLine::Stderr(msg));
                }
            }
        }
        // EOF on stdin ends the session.
        let _ = cmd_tx.send(UiCommand::Quit);
    });
}

async fn run_interactive(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let service = CardGenerationService::from_config(&cfg)?;
    let configured = service.is_configured();
    let mut workflow = GenerationWorkflow::new(service);

    if let Some(text) = read_session_draft(args.input.as_deref())? {
        workflow.set_input_text(&text)?;
    }

    let (out_tx, out_handle) = spawn_output_writer();
    for l in HELP_LINES {
        let _ = out_tx.send(OutputLine::Stdout((*l).to_string()));
    }
    if !configured {
        let _ = out_tx.send(OutputLine::Stderr(
            "No API key configured: set GEMINI_API_KEY or pass --api-key.".into(),
        ));
    }
    render(&out_tx, workflow.snapshot(), args.show_answers);

    let mut snapshots = workflow.subscribe();
    let presenter_tx = out_tx.clone();
    let show_answers = args.show_answers;
    let presenter = tokio::spawn(async move {
        // Ends once the controller drops the workflow.
        while snapshots.changed().await.is_ok() {
            let snap = snapshots.borrow_and_update().clone();
            render(&presenter_tx, &snap, show_answers);
        }
    });

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    spawn_command_reader(cmd_tx, out_tx.clone());

    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let final_snapshot = run_controller(workflow, cmd_rx, ctrl_c).await;
    let _ = presenter.await;

    if let Some(path) = args.export_json.as_deref() {
        if final_snapshot.cards.is_empty() {
            let _ = out_tx.send(OutputLine::Stderr("Nothing to export.".into()));
        } else {
            crate::storage::export_json(
                path,
                &crate::storage::build_export(&final_snapshot, &cfg),
            )?;
            let _ = out_tx.send(OutputLine::Stderr(format!("Exported: {}", path.display())));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

fn render(out_tx: &mpsc::UnboundedSender<OutputLine>, snap: &WorkflowSnapshot, show_answers: bool) {
    for line in build_text_summary(snap, show_answers).lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interactive_draft_comes_from_a_file_not_stdin() {
        assert!(read_session_draft(None).unwrap().is_none());

        let err = read_session_draft(Some(Path::new("-"))).unwrap_err().to_string();
        assert!(err.contains("--input -"), "{err}");

        let path = std::env::temp_dir()
            .join(format!("flashcard-gen-draft-{}.txt", std::process::id()));
        std::fs::write(&path, "Photosynthesis notes").unwrap();
        let draft = read_session_draft(Some(&path)).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(draft.as_deref(), Some("Photosynthesis notes"));
    }

    #[test]
    fn choose_count_prefers_requested_then_largest() {
        assert_eq!(choose_count(Some(6), &[4, 6, 8]).unwrap(), 6);
        assert_eq!(choose_count(None, &[4, 6, 8]).unwrap(), 8);
        assert_eq!(choose_count(None, &[5]).unwrap(), 5);
    }

    #[test]
    fn choose_count_rejects_unoffered_counts() {
        let err = choose_count(Some(7), &[4, 6, 8]).unwrap_err().to_string();
        assert!(err.contains("4, 6, 8"));
        assert!(choose_count(None, &[]).is_err());
    }

    #[test]
    fn session_lines_map_to_commands() {
        assert_eq!(
            parse_session_line("text  The cell cycle  "),
            Ok(SessionInput::Command(UiCommand::SetText(
                "The cell cycle".into()
            )))
        );
        assert_eq!(
            parse_session_line("COUNT 8"),
            Ok(SessionInput::Command(UiCommand::Generate(8)))
        );
        assert_eq!(
            parse_session_line("flip 1"),
            Ok(SessionInput::Command(UiCommand::Flip(0)))
        );
        assert_eq!(
            parse_session_line("back"),
            Ok(SessionInput::Command(UiCommand::BackToEdit))
        );
        assert_eq!(parse_session_line("   "), Ok(SessionInput::Nothing));
        assert_eq!(parse_session_line("help"), Ok(SessionInput::Help));
    }

    #[test]
    fn session_lines_report_bad_input() {
        assert!(parse_session_line("flip 0").is_err());
        assert!(parse_session_line("count many").is_err());
        assert!(parse_session_line("dance").is_err());
    }

    #[test]
    fn config_carries_explicit_key() {
        let args = Cli::parse_from([
            "flashcard-gen",
            "--api-key",
            "k-123",
            "--request-timeout",
            "5s",
            "--text",
        ]);
        let cfg = build_config(&args);
        assert_eq!(cfg.credential(), Some("k-123"));
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert!(args.is_batch());
    }
}
