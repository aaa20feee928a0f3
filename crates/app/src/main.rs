use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use frame_capture_core::{
    AppConfig, CaptureError, CaptureServer, HttpUploadClient, RenderDriver, SceneKind,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> frame_capture_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { server } => {
            server.apply(&mut config);
            run_serve(&config).await
        }
        Commands::Render { render, endpoint } => {
            render.apply(&mut config);
            if let Some(endpoint) = endpoint {
                config.upload.endpoint = endpoint;
            }
            run_render(&config).await
        }
        Commands::Capture { render, server } => {
            render.apply(&mut config);
            server.apply(&mut config);
            run_capture(&config).await
        }
    }
}

async fn run_serve(config: &AppConfig) -> frame_capture_core::Result<()> {
    tracing::info!(root = %config.server.root.display(), "starting capture server");
    CaptureServer::bind(&config.server).await?.serve().await
}

async fn run_render(config: &AppConfig) -> frame_capture_core::Result<()> {
    tracing::info!(
        endpoint = %config.upload.endpoint,
        scene = ?config.render.scene,
        "rendering frames"
    );
    let uploader = HttpUploadClient::new(config.upload.endpoint.clone());
    let summary = RenderDriver::from_config(&config.render, uploader).run().await?;
    tracing::info!(frames = summary.frames, time = summary.final_time, "run complete");
    Ok(())
}

/// Runs the capture server in-process and renders against it.
async fn run_capture(config: &AppConfig) -> frame_capture_core::Result<()> {
    let server = CaptureServer::bind(&config.server).await?;
    let endpoint = server.endpoint()?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(async move {
        let _ = shutdown_rx.await;
    }));

    let uploader = HttpUploadClient::new(endpoint);
    let outcome = RenderDriver::from_config(&config.render, uploader).run().await;

    let _ = shutdown_tx.send(());
    handle
        .await
        .map_err(|err| CaptureError::msg(format!("capture server task failed: {err}")))??;

    let summary = outcome?;
    tracing::info!(frames = summary.frames, time = summary.final_time, "capture complete");
    Ok(())
}

fn load_config(path: Option<&Path>) -> frame_capture_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_path(path),
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline frame renderer and capture server", long_about = None)]
struct Cli {
    /// JSON configuration file; command line flags override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Accept frame uploads and write them to `<root>/frames`.
    Serve {
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Render the animation and upload every frame to a running server.
    Render {
        #[command(flatten)]
        render: RenderArgs,
        /// Upload endpoint, e.g. http://localhost:3000/saveFrame.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Start a capture server and render against it in one process.
    Capture {
        #[command(flatten)]
        render: RenderArgs,
        #[command(flatten)]
        server: ServerArgs,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Frames per virtual time-unit.
    #[arg(long)]
    fps: Option<u32>,
    /// Virtual time at which the run stops.
    #[arg(long)]
    horizon: Option<f64>,
    /// Built-in scene: `nebula` or `gradient`.
    #[arg(long)]
    scene: Option<SceneKind>,
}

impl RenderArgs {
    fn apply(self, config: &mut AppConfig) {
        let render = &mut config.render;
        render.width = self.width.unwrap_or(render.width);
        render.height = self.height.unwrap_or(render.height);
        render.fps = self.fps.unwrap_or(render.fps);
        render.horizon = self.horizon.unwrap_or(render.horizon);
        render.scene = self.scene.unwrap_or(render.scene);
    }
}

#[derive(Args, Debug)]
struct ServerArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    /// Directory under which the `frames` folder is created.
    #[arg(long)]
    root: Option<PathBuf>,
}

impl ServerArgs {
    fn apply(self, config: &mut AppConfig) {
        let server = &mut config.server;
        if let Some(host) = self.host {
            server.host = host;
        }
        if let Some(root) = self.root {
            server.root = root;
        }
        server.port = self.port.unwrap_or(server.port);
    }
}
