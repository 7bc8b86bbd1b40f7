// Generate a storyboard for a local script file and print it as JSON.
//
// Usage: storyboard <script-file> [--out <dir>]
use base64::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storyboard_studio::config::AppConfig;
use storyboard_studio::gemini_client::GeminiClient;
use storyboard_studio::script::read_script_file;
use storyboard_studio::storyboard::{StoryboardOrchestrator, StoryboardState};

struct Args {
    script: PathBuf,
    out_dir: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut script = None;
    let mut out_dir = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                out_dir = Some(PathBuf::from(args.next().ok_or("--out requires a directory")?));
            }
            _ if script.is_none() => script = Some(PathBuf::from(arg)),
            _ => return Err(format!("Unexpected argument: {}", arg)),
        }
    }
    Ok(Args {
        script: script.ok_or("Usage: storyboard <script-file> [--out <dir>]")?,
        out_dir,
    })
}

async fn write_images(state: &StoryboardState, dir: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    tokio::fs::create_dir_all(dir).await?;
    let mut written = 0;
    for item in &state.storyboard {
        let Some(uri) = item.image_url.as_data_uri() else {
            continue;
        };
        let encoded = uri.split_once(',').map(|(_, data)| data).unwrap_or_default();
        let bytes = BASE64_STANDARD.decode(encoded)?;
        let path = dir.join(format!("scene_{}.jpg", item.scene.scene_number));
        tokio::fs::write(&path, bytes).await?;
        written += 1;
    }
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = AppConfig::from_env()?;
    let client = GeminiClient::new(&config)?;
    let orchestrator = StoryboardOrchestrator::new(Arc::new(client));

    let script = read_script_file(&args.script).await?;
    orchestrator.load_script(script).await?;

    let state = orchestrator.generate().await?;
    println!("{}", serde_json::to_string_pretty(&state.storyboard)?);

    if let Some(dir) = args.out_dir {
        let written = write_images(&state, &dir).await?;
        eprintln!("✅ Wrote {} image(s) to {}", written, dir.display());
    }

    let failed = state.storyboard.iter().filter(|i| i.image_url.as_data_uri().is_none()).count();
    if failed > 0 {
        eprintln!("⚠️ {} scene(s) failed to render", failed);
    }
    Ok(())
}
