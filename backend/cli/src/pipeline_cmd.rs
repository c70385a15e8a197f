//! `mjml-studio pipeline`: prompt → email copy → HTML email.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use studio_pipeline::Pipeline;
use studio_providers::GenerationBackends;

use crate::terminal_output::{heading, note_info, note_success};

pub struct PipelineArgs {
    pub prompt: String,
    pub files: Vec<PathBuf>,
    pub copy_only: bool,
    /// Ready-made copy; skips the copy stage.
    pub copy: Option<String>,
    pub out: Option<PathBuf>,
}

pub async fn run(backends: GenerationBackends, args: PipelineArgs) -> Result<()> {
    let pipeline = Pipeline::new(backends.copy, backends.html);

    match args.copy {
        Some(copy) => pipeline.set_copy(copy),
        None => {
            pipeline.set_prompt(args.prompt);
            for file in &args.files {
                pipeline.add_file(file);
            }
            note_info("Generating email copy…");
            let copy = pipeline
                .generate_copy()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            if args.copy_only {
                return emit(&copy, args.out.as_ref()).await;
            }
            eprintln!("{}\n{copy}\n", heading("Email copy"));
        }
    }

    note_info("Generating HTML…");
    let html = pipeline
        .generate_html()
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    emit(&html, args.out.as_ref()).await
}

async fn emit(text: &str, out: Option<&PathBuf>) -> Result<()> {
    match out {
        Some(path) => {
            tokio::fs::write(path, text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            note_success(&format!("Wrote {}", path.display()));
        }
        None => println!("{text}"),
    }
    Ok(())
}
