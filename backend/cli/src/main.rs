mod api;
mod config_cmd;
mod convert_cmd;
mod draft;
mod pipeline_cmd;
mod terminal_output;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use studio_config::StudioConfig;
use studio_core::{ConversionGateway, DraftWriter, ViewMode};
use studio_editor::EditorController;
use studio_providers::{GenerationBackends, MockGateway, MockWriter};

#[derive(Parser)]
#[command(name = "mjml-studio")]
#[command(about = "MJML Studio: live MJML preview and AI-assisted email generation")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./mjml-studio.yaml or $MJML_STUDIO_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use in-process mock services instead of the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one MJML document to HTML
    Convert {
        /// MJML file, or `-` for stdin
        input: String,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Emit a standalone preview page instead of the raw HTML
        #[arg(long)]
        page: bool,
        /// View used with --page: preview or code
        #[arg(long, default_value = "preview")]
        view: ViewMode,
    },
    /// Watch an MJML file and serve a live preview of it
    Watch {
        file: PathBuf,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start the live preview server with the starter document
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// Start from an MJML draft generated from this prompt instead
        #[arg(long, value_name = "PROMPT")]
        from_prompt: Option<String>,
        /// PDF brief sent along with --from-prompt
        #[arg(long, requires = "from_prompt")]
        pdf: Option<PathBuf>,
    },
    /// Generate email copy from a prompt, then an HTML email from the copy
    Pipeline {
        #[arg(short, long, default_value = "")]
        prompt: String,
        /// Attach a file (only its name is sent)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
        /// Stop after the copy stage
        #[arg(long)]
        copy_only: bool,
        /// Skip the copy stage and compose HTML from this copy
        #[arg(long, conflicts_with_all = ["prompt", "files", "copy_only"])]
        copy: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = studio_config::config_file_path(cli.config.as_deref());
    let mut config = studio_config::load_and_prepare(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match &cli.command {
        Commands::Watch { .. } | Commands::Serve { .. } => {
            logging::init_logger(config.log_dir(), config.log_level());
        }
        _ => logging::init_console(config.log_level()),
    }
    info!(path = %config_path.display(), exists = config_path.exists(), "Loaded config");
    for warning in studio_config::validate(&config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    let result = match cli.command {
        Commands::Convert { input, out, page, view } => {
            let gateway = conversion_gateway(&config, cli.offline)?;
            convert_cmd::run(gateway, &input, out.as_deref(), page.then_some(view)).await
        }
        Commands::Watch { file, port } => {
            override_port(&mut config, port);
            let source = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let editor = EditorController::new(
                conversion_gateway(&config, cli.offline)?,
                config.debounce(),
                source,
            );
            let _watcher = watch::watch_source(&file, editor.clone())?;
            editor.mount();
            api::serve(&config.bind_address(), editor).await
        }
        Commands::Serve { port, from_prompt, pdf } => {
            override_port(&mut config, port);
            let gateway = conversion_gateway(&config, cli.offline)?;
            if from_prompt.is_some() {
                let request = draft::load_request(from_prompt, pdf.as_deref()).await?;
                let writer = draft_writer(&config, cli.offline)?;
                let editor = EditorController::new(gateway, config.debounce(), "");
                let _seed = draft::spawn_seed(writer, request, editor.clone());
                api::serve(&config.bind_address(), editor).await
            } else {
                let initial = config
                    .initial_source()
                    .unwrap_or(studio_editor::DEFAULT_SOURCE)
                    .to_string();
                let editor = EditorController::new(gateway, config.debounce(), initial);
                editor.mount();
                api::serve(&config.bind_address(), editor).await
            }
        }
        Commands::Pipeline { prompt, files, copy_only, copy, out } => {
            let backends = generation_backends(&config, cli.offline)?;
            let args = pipeline_cmd::PipelineArgs { prompt, files, copy_only, copy, out };
            pipeline_cmd::run(backends, args).await
        }
        Commands::Config => config_cmd::run(&config, &config_path),
    };

    if let Err(e) = &result {
        terminal_output::note_error(&format!("{e:#}"));
    }
    result
}

fn override_port(config: &mut StudioConfig, port: Option<u16>) {
    if let Some(port) = port {
        config.server.get_or_insert_with(Default::default).port = Some(port);
    }
}

fn conversion_gateway(config: &StudioConfig, offline: bool) -> Result<Arc<dyn ConversionGateway>> {
    if offline {
        info!("Offline mode: conversions are echoed by a mock gateway");
        return Ok(Arc::new(MockGateway::offline()));
    }
    Ok(studio_providers::conversion_gateway(config)?)
}

fn draft_writer(config: &StudioConfig, offline: bool) -> Result<Arc<dyn DraftWriter>> {
    if offline {
        info!("Offline mode: drafts use a canned mock document");
        return Ok(Arc::new(MockWriter::new()));
    }
    Ok(studio_providers::draft_writer(config)?)
}

fn generation_backends(config: &StudioConfig, offline: bool) -> Result<GenerationBackends> {
    if offline {
        info!("Offline mode: generation uses canned mock output");
        let writer = Arc::new(MockWriter::new());
        return Ok(GenerationBackends { copy: writer.clone(), html: writer });
    }
    Ok(studio_providers::generation_backends(config)?)
}
