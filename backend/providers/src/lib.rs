pub mod draft;
pub mod endpoint;
pub mod http;
pub mod mjml;
pub mod mock;
pub mod openai;

#[cfg(test)]
pub(crate) mod test_server;

use std::sync::Arc;

use studio_config::{GenerationBackend, StudioConfig};
use studio_core::{
    ConversionGateway, CopyWriter, DraftWriter, HtmlComposer, StudioError, StudioResult,
};
use tracing::info;

pub use draft::DraftEndpoint;
pub use endpoint::EndpointWriter;
pub use mjml::MjmlGateway;
pub use mock::{MockGateway, MockReply, MockWriter};
pub use openai::OpenAiWriter;

/// The two pipeline stages, backed by one implementation each.
#[derive(Clone)]
pub struct GenerationBackends {
    pub copy: Arc<dyn CopyWriter>,
    pub html: Arc<dyn HtmlComposer>,
}

/// Build the conversion gateway described by `config`.
pub fn conversion_gateway(config: &StudioConfig) -> StudioResult<Arc<dyn ConversionGateway>> {
    let mut gateway = MjmlGateway::new(config.conversion_endpoint(), config.conversion_timeout())?;
    if let Some((app_id, api_key)) = config.conversion_credentials() {
        gateway = gateway.with_credentials(app_id, api_key);
    }
    info!(
        endpoint = %config.conversion_endpoint(),
        authenticated = config.conversion_credentials().is_some(),
        "Configured conversion gateway"
    );
    Ok(Arc::new(gateway))
}

/// Build the prompt → MJML draft client described by `config`.
pub fn draft_writer(config: &StudioConfig) -> StudioResult<Arc<dyn DraftWriter>> {
    let url = config.draft_endpoint().ok_or_else(|| {
        StudioError::Config("generation.draftEndpoint must be set to generate drafts".into())
    })?;
    let writer = DraftEndpoint::new(url, config.generation_timeout())?;
    info!(url = %url, "Configured draft endpoint");
    Ok(Arc::new(writer))
}

/// Build the copy/html generation backends described by `config`.
pub fn generation_backends(config: &StudioConfig) -> StudioResult<GenerationBackends> {
    match config.generation_backend() {
        GenerationBackend::Endpoint => {
            let (Some(copy_url), Some(html_url)) = (config.copy_endpoint(), config.html_endpoint())
            else {
                return Err(StudioError::Config(
                    "generation.copyEndpoint and generation.htmlEndpoint must both be set".into(),
                ));
            };
            let writer = Arc::new(EndpointWriter::new(
                copy_url,
                html_url,
                config.generation_timeout(),
            )?);
            info!(copy = %copy_url, html = %html_url, "Configured endpoint generation backend");
            Ok(GenerationBackends {
                copy: writer.clone(),
                html: writer,
            })
        }
        GenerationBackend::Openai => {
            let api_key = config.openai_api_key().ok_or_else(|| {
                StudioError::Config("openai backend requires generation.apiKey or OPENAI_API_KEY".into())
            })?;
            let writer = Arc::new(
                OpenAiWriter::new(api_key, config.model(), config.generation_timeout())?
                    .with_base_url(config.openai_base_url()),
            );
            info!(model = %config.model(), "Configured OpenAI generation backend");
            Ok(GenerationBackends {
                copy: writer.clone(),
                html: writer,
            })
        }
    }
}
