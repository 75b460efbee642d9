// ============================================================================
// maskpaint CLI: run the service, or drive the editor headlessly
// ============================================================================
//
// Usage examples:
//   maskpaint serve --config maskpaint.json
//   maskpaint submit --server http://127.0.0.1:8787 --session <id> --strokes strokes.json
//   maskpaint render --image photo.png --strokes strokes.json --out mask.png --width 512 --height 512
//
// A strokes file is a serialized `CanvasState`:
//   {"strokes":[{"mode":"paint","width":20.0,"points":[{"x":10,"y":10},{"x":80,"y":40}]}]}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use maskpaint_canvas::{CanvasState, MaskEditor, Size};
use thiserror::Error;

use crate::client::{EditorClient, mask_request};
use crate::config::ServerConfig;
use crate::error::{ClientError, ServiceError};
use crate::params::{InpaintParameters, RawParameters};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Mask painting service and headless editor for Discord inpainting.
#[derive(Parser, Debug)]
#[command(name = "maskpaint", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the session/storage service.
    Serve(ServeArgs),
    /// Replay strokes onto a session's image and save the mask.
    Submit(SubmitArgs),
    /// Rasterize strokes over a local image into a mask PNG.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// JSON config file. Defaults plus environment overrides when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Listen address, overrides the config file.
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Service base URL.
    #[arg(long, value_name = "URL")]
    pub server: String,

    /// Session id returned by start-session.
    #[arg(long, value_name = "ID")]
    pub session: String,

    /// Strokes file (JSON canvas state) in canvas coordinates.
    #[arg(long, value_name = "FILE")]
    pub strokes: PathBuf,

    /// Inpainting prompt.
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Denoising strength (0.1-1.0).
    #[arg(long)]
    pub denoise: Option<f64>,

    /// Sampling steps (10-50).
    #[arg(long)]
    pub steps: Option<f64>,

    /// Guidance scale (1-20).
    #[arg(long)]
    pub guidance: Option<f64>,

    /// Scheduler: karras, euler_a, euler, ddim.
    #[arg(long)]
    pub scheduler: Option<String>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Source image.
    #[arg(long, value_name = "FILE")]
    pub image: PathBuf,

    /// Strokes file (JSON canvas state) in canvas coordinates.
    #[arg(long, value_name = "FILE")]
    pub strokes: PathBuf,

    /// Where to write the mask PNG (original image size).
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,

    /// Optional display-size preview PNG with the painted area overlaid.
    #[arg(long, value_name = "FILE")]
    pub preview: Option<PathBuf>,

    /// Canvas width the strokes were drawn at. Defaults to the image width.
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Canvas height the strokes were drawn at. Defaults to the image height.
    #[arg(long, requires = "width")]
    pub height: Option<u32>,
}

impl SubmitArgs {
    fn parameters(&self) -> InpaintParameters {
        InpaintParameters::normalize(Some(&RawParameters {
            denoise: self.denoise,
            steps: self.steps,
            guidance: self.guidance,
            scheduler: self.scheduler.clone(),
        }))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum CliError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Canvas(#[from] maskpaint_canvas::CanvasError),

    #[error("could not encode preview: {0}")]
    Preview(#[from] image::ImageError),
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run a subcommand and return an OS exit code.
pub async fn run(args: CliArgs) -> ExitCode {
    let result = match args.command {
        Command::Serve(serve) => run_serve(serve).await,
        Command::Submit(submit) => run_submit(submit).await,
        Command::Render(render) => run_render(render),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Load the service config for `serve`, applying the CLI override.
pub fn load_config(args: &ServeArgs) -> Result<ServerConfig, CliError> {
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    Ok(config)
}

async fn run_serve(args: ServeArgs) -> Result<(), CliError> {
    let config = load_config(&args)?;
    crate::server::serve(config).await?;
    Ok(())
}

async fn run_submit(args: SubmitArgs) -> Result<(), CliError> {
    let strokes = read_strokes(&args.strokes)?;
    let client = EditorClient::new(args.server.clone());
    let (session, mut editor) = client.open_editor(&args.session).await?;
    log::info!(
        "Opened session {} ({}x{}), replaying {} strokes",
        session.id,
        session.width,
        session.height,
        strokes.strokes.len()
    );
    editor.load_state(strokes)?;

    let request = mask_request(&session.id, &editor, args.prompt.clone(), &args.parameters())?;
    let saved = client.save_mask(&request).await?;
    println!("{}", saved.mask_url);
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<(), CliError> {
    let strokes = read_strokes(&args.strokes)?;
    let image = read_file(&args.image)?;
    let display = args.width.zip(args.height).map(|(w, h)| Size::new(w, h));

    let mut editor = MaskEditor::open(&image, display)?;
    editor.load_state(strokes)?;

    let mask = editor.mask()?;
    write_file(&args.out, &mask.to_png()?)?;
    println!(
        "{} ({}x{}, {:.1}% masked)",
        args.out.display(),
        mask.width(),
        mask.height(),
        mask.coverage() * 100.0
    );

    if let Some(path) = &args.preview {
        editor
            .render_preview()?
            .save_with_format(path, image::ImageFormat::Png)?;
        println!("{}", path.display());
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read_strokes(path: &Path) -> Result<CanvasState, CliError> {
    let json = read_file(path)?;
    Ok(CanvasState::from_json(&String::from_utf8_lossy(&json))?)
}
