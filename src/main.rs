use std::io::Read;
use std::path::PathBuf;
use std::{env, fs, process};

use anyhow::{Context, bail};
use clap::Parser;
use sketch2canvas::agent::OllamaGenerator;
use sketch2canvas::extract::{CANVAS_TAGS, JSON_FENCE};
use sketch2canvas::logger::init_tracing;
use sketch2canvas::pipeline::{Mode, Pipeline, PipelineConfig, StatusUpdate};
use sketch2canvas::variables::VariablePattern;
use tokio::sync::mpsc;
use tracing::info;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "sketch2canvas",
    about = "Turn a model's sketch-conversion response into a JSON Canvas file",
    version
)]
struct Cli {
    /// Raw collaborator response: a file path, or `-` for stdin
    input: PathBuf,

    /// Canvas name; output becomes `$OBSIDIAN_VAULT/<name>.canvas`
    #[arg(long, default_value = "sketch")]
    name: String,

    /// Explicit output path, overriding the vault-derived one
    #[arg(long)]
    out: Option<PathBuf>,

    /// Normalize into the Cannoli plugin's role-colored form
    #[arg(long)]
    cannoli: bool,

    /// Detach and expand green metaprompt nodes
    #[arg(long)]
    metaprompts: bool,

    /// Placeholder template with a single VAR marker, e.g. `$VAR`
    #[arg(long, default_value = sketch2canvas::variables::DEFAULT_PATTERN)]
    pattern: String,

    /// Expect the payload in a ```json fence instead of <canvas> tags
    #[arg(long)]
    fenced: bool,

    /// Model used for the secondary generation passes
    #[arg(long, default_value = "llama3:latest")]
    model: String,

    /// Ollama endpoint, e.g. http://localhost:11434
    #[arg(long)]
    ollama_url: Option<Url>,

    /// Log level directive (e.g. error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for a daily rolling log file
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn resolve_output(cli: &Cli) -> PathBuf {
    if let Some(out) = &cli.out {
        return out.clone();
    }
    let vault = env::var("OBSIDIAN_VAULT").map(PathBuf::from).unwrap_or_default();
    vault.join(format!("{}.canvas", cli.name))
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_tracing(&cli.log_level, cli.log_dir.clone())?;

    let raw = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read response from stdin")?;
        buf
    } else {
        fs::read_to_string(&cli.input)
            .with_context(|| format!("failed to read response from {}", cli.input.display()))?
    };

    let pattern = match VariablePattern::compile(&cli.pattern) {
        Ok(p) => p,
        Err(e) => bail!("invalid --pattern: {}", e),
    };

    let output = resolve_output(&cli);
    info!(output = %output.display(), "starting conversion");

    let config = PipelineConfig {
        mode: if cli.cannoli { Mode::Cannoli } else { Mode::Default },
        metaprompts: cli.metaprompts,
        pattern,
        delimiters: if cli.fenced { JSON_FENCE } else { CANVAS_TAGS },
        output,
    };
    let generator = OllamaGenerator::new(cli.model, cli.ollama_url);

    // progressive status goes to stdout as NDJSON, one event per line
    let (tx, mut rx) = mpsc::channel::<StatusUpdate>(16);
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            if let Ok(line) = serde_json::to_string(&update) {
                println!("{}", line);
            }
        }
    });

    let pipeline = Pipeline::new(config, &generator, tx);
    let result = pipeline.run(&raw).await;
    drop(pipeline); // closes the event channel so the printer drains and exits
    printer.await.ok();

    match result {
        Ok(_) => Ok(()),
        Err(_) => process::exit(1),
    }
}
