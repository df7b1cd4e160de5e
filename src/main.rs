use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use labelpress::api;
use labelpress::assets::AssetLoader;
use labelpress::models::AppConfig;
use labelpress::server;
use labelpress::services::{
    DestinationResolver, Dispatcher, ImageConverter, LabelPipeline, SystemDispatcher,
};

#[derive(Parser)]
#[command(name = "labelpress")]
#[command(about = "Print images on TSPL label printers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Convert an image file to a printer payload
    Render {
        /// Input image (bitmap, or any format the converter understands)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the payload to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Send the payload to the resolved printer
        #[arg(long)]
        send: bool,
    },
    /// Extract the embedded config.yaml for customization
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,

        /// List embedded assets without extracting
        #[arg(long)]
        list: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Labelpress API",
        description = "Print images on TSPL label printers",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(api::handle_print, api::handle_render, api::handle_printer,),
    components(schemas(api::PrinterResponse, api::DestinationInfo, api::ProfileInfo,)),
    tags(
        (name = "Labels", description = "Label conversion and printing"),
        (name = "Printer", description = "Printer discovery")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            input,
            output,
            send,
        }) => run_render_command(&input, output.as_deref(), send).await,
        Some(Commands::Init { force, list }) => run_init_command(force, list),
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Build the asset loader from `CONFIG_FILE` and load the config,
/// applying `PRINTER_DEVICE` / `PRINTER_QUEUE` overrides.
fn load_config() -> AppConfig {
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    let asset_loader = AssetLoader::new(config_file);

    // Seed if the configured path is missing
    if let Err(e) = asset_loader.seed_if_configured() {
        tracing::warn!(%e, "Failed to seed config file");
    }

    AppConfig::load_from_assets(&asset_loader).with_destination_override(
        std::env::var("PRINTER_DEVICE").ok(),
        std::env::var("PRINTER_QUEUE").ok(),
    )
}

/// Convert an image file to a payload (no server needed)
async fn run_render_command(
    input: &Path,
    output: Option<&Path>,
    send: bool,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labelpress=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if output.is_none() && !send {
        anyhow::bail!("Nothing to do: pass --output, --send, or both");
    }

    let config = load_config();
    let profile = config.printer.profile();

    let upload = std::fs::read(input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
    let converter = ImageConverter::new(&config.converter, profile.max_width_dots);
    let bitmap = converter.normalize(upload.into()).await?;

    let pipeline = Arc::new(LabelPipeline::new(profile));
    let label = pipeline
        .render_in_blocking_context(bitmap)
        .await
        .map_err(|e| anyhow::anyhow!("Render error: {e}"))?;

    println!(
        "Rendered {} ({}x{} px, {}x{} mm, {} bytes)",
        input.display(),
        label.width_px,
        label.height_px,
        label.width_mm,
        label.height_mm,
        label.payload.len()
    );

    if let Some(output) = output {
        std::fs::write(output, label.payload.as_bytes())?;
        println!("Wrote {}", output.display());
    }

    if send {
        let destination = DestinationResolver::new(config.destination.clone())
            .resolve()
            .await?;
        SystemDispatcher::new(config.dispatch.timeout())
            .dispatch(&destination, &label.payload)
            .await?;
        println!("Sent to {destination}");
    }

    Ok(())
}

/// Extract the embedded config to the filesystem
fn run_init_command(force: bool, list: bool) -> anyhow::Result<()> {
    if list {
        println!("Embedded assets:\n");
        for f in AssetLoader::list_embedded() {
            println!("  {f}");
        }
        return Ok(());
    }

    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    let loader = AssetLoader::new(config_file);

    let report = loader.init(force)?;

    for f in &report.written {
        println!("  + {f}");
    }
    for f in &report.skipped {
        println!("  - {f} (exists, use --force to overwrite)");
    }
    if report.written.is_empty() && report.skipped.is_empty() {
        println!("No files to extract.");
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Read environment variables
    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let printer_device = std::env::var("PRINTER_DEVICE").ok();
    let printer_queue = std::env::var("PRINTER_QUEUE").ok();

    // Header
    println!("Labelpress v{VERSION}");
    println!("Image upload server for TSPL label printers\n");

    // Environment variables section
    println!("Environment Variables:");
    println!(
        "  BIND_ADDR      = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  CONFIG_FILE    = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  PRINTER_DEVICE = {}",
        printer_device.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  PRINTER_QUEUE  = {}",
        printer_queue.as_deref().unwrap_or("(not set)")
    );

    // Config source
    let config_source = match config_file {
        Some(ref path) if Path::new(path).exists() => path.to_string(),
        Some(_) => "embedded (file not found)".to_string(),
        None => "embedded".to_string(),
    };
    println!("\nConfig: {config_source}");

    // Commands section
    println!("\nCommands:");
    println!("  labelpress serve    Start the HTTP server");
    println!("  labelpress render   Convert an image to a printer payload");
    println!("  labelpress init     Extract the embedded config");
    println!("\nRun 'labelpress --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labelpress=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let config = load_config();

    tracing::info!(
        dpi = config.printer.dpi,
        max_width_dots = config.printer.max_width_dots,
        serial = ?config.destination.serial,
        queue = ?config.destination.queue,
        "Printer configured"
    );

    // Create application state using shared server module
    let state = server::create_app_state(config);

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Labelpress server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
