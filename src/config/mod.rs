// Configuration management module
// TOML-backed settings plus the interactive setup used by `pdf-qa config`

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, EmbeddingConfig, EmbeddingProvider, FastEmbedConfig, OllamaConfig,
    RetrievalConfig,
};

/// Resolve the configuration directory, honoring an explicit override
#[inline]
pub fn resolve_config_dir(
    override_dir: Option<&std::path::Path>,
) -> Result<std::path::PathBuf, ConfigError> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Config::default_base_dir(),
    }
}
