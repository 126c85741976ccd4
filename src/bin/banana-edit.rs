//! CLI for Banana Edit - natural-language photo editing.

use banana_edit::{
    find_preset, EditSession, GeminiEditor, GeminiModel, ImageEditor, SourceImage, WorkflowState,
    PRESETS,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "banana-edit")]
#[command(about = "Edit photos with natural language via Gemini image models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an edit to an image
    Edit(EditArgs),

    /// List preset prompts
    Presets,
}

#[derive(Args)]
struct EditArgs {
    /// Image to edit
    input: PathBuf,

    /// Describe the edit
    #[arg(short, long, conflicts_with = "preset", required_unless_present = "preset")]
    prompt: Option<String>,

    /// Use a preset prompt (key or label, see `presets`)
    #[arg(short = 'P', long)]
    preset: Option<String>,

    /// Output file path (defaults to nano-banana-edit-<millis>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model to use
    #[arg(short, long, value_enum, default_value = "flash")]
    model: ModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// Gemini 2.5 Flash Image
    Flash,
    /// Gemini 3 Pro Image
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Edit(args) => {
            edit_image(args, cli.json).await?;
        }
        Commands::Presets => {
            list_presets(cli.json)?;
        }
    }

    Ok(())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_prompt(args: &EditArgs) -> anyhow::Result<String> {
    match (&args.prompt, &args.preset) {
        (Some(prompt), _) => Ok(prompt.clone()),
        (None, Some(name)) => find_preset(name)
            .map(|p| p.text.to_string())
            .ok_or_else(|| anyhow::anyhow!("Unknown preset: {name} (run `banana-edit presets`)")),
        (None, None) => anyhow::bail!("Either --prompt or --preset is required"),
    }
}

async fn edit_image(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let prompt = resolve_prompt(&args)?;
    if prompt.trim().is_empty() {
        anyhow::bail!("Prompt must not be empty");
    }

    let editor = GeminiEditor::builder().model(args.model.into()).build()?;
    let source = SourceImage::open(&args.input).await?;

    let mut session = EditSession::new(editor);
    let mut states = session.subscribe();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            tracing::info!(%state, "workflow state changed");
        }
    });

    session.select_image(source);
    session.set_prompt(prompt);

    let start = Instant::now();
    session.generate().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let model = session.editor().model().as_str();
    let editor_name = session.editor().name().to_string();
    let outcome = match (session.state(), session.result(), session.error()) {
        (WorkflowState::Complete, Some(image), _) => {
            let output = args.output.clone().unwrap_or_else(|| {
                let millis = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                PathBuf::from(image.download_file_name(millis))
            });
            let size = image.save(&output)?;
            Ok((output, size, image.mime_type.clone()))
        }
        (_, _, Some(message)) => Err(message.to_string()),
        (state, _, _) => Err(format!("edit did not complete (state: {state})")),
    };

    drop(session);
    let _ = watcher.await;

    match outcome {
        Ok((output, size, mime_type)) => {
            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "output": output.display().to_string(),
                    "size_bytes": size,
                    "mime_type": mime_type,
                    "model": model,
                    "duration_ms": duration_ms,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Edited image: {} ({} bytes) via {}",
                    output.display(),
                    size,
                    editor_name
                );
                println!("Duration: {}ms", duration_ms);
            }
            Ok(())
        }
        Err(message) => {
            if json_output {
                let result = serde_json::json!({
                    "success": false,
                    "error": message,
                    "model": model,
                    "duration_ms": duration_ms,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!(message)
        }
    }
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(PRESETS)?);
    } else {
        println!("Available presets:\n");
        for p in PRESETS {
            println!("  {} {} ({})", p.icon, p.label, p.key);
            println!("    {}", p.text);
        }
    }

    Ok(())
}
