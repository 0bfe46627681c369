use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.embedding.provider, EmbeddingProvider::Ollama);
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "all-minilm:latest");
    assert_eq!(config.ollama.batch_size, 32);
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.retrieval.display_chars, 500);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.timeout_secs = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.retrieval.display_chars = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn chunk_overlap_must_be_smaller_than_size() {
    let mut config = Config::default();
    config.chunking.chunk_overlap = config.chunking.chunk_size;

    let err = config.validate().expect_err("overlap == size is invalid");
    assert!(matches!(err, ConfigError::InvalidChunkConfig(_)));
}

#[test]
fn ollama_settings_ignored_for_other_provider() {
    let mut config = Config::default();
    config.embedding.provider = EmbeddingProvider::FastEmbed;
    config.ollama.port = 0;

    let result = config.validate();
    if cfg!(feature = "fastembed") {
        assert!(result.is_ok());
    } else {
        assert!(matches!(
            result,
            Err(ConfigError::ProviderUnavailable(EmbeddingProvider::FastEmbed))
        ));
    }
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn https_url_generation() {
    let mut config = Config::default();
    config.ollama.protocol = "https".to_string();
    config.ollama.host = "secure.example.com".to_string();
    config.ollama.port = 443;

    let url = config
        .ollama_url()
        .expect("should generate https url successfully");
    assert_eq!(url.as_str(), "https://secure.example.com/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let mut parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    parsed_config.base_dir = config.base_dir.clone();
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_toml_uses_defaults() {
    let toml_str = r#"
        [embedding]
        provider = "ollama"

        [chunking]
        chunk_size = 400
    "#;

    let config: Config = toml::from_str(toml_str).expect("should parse partial toml");
    assert_eq!(config.chunking.chunk_size, 400);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.retrieval, RetrievalConfig::default());
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig {
        model: "test-model".to_string(),
        ..OllamaConfig::default()
    };

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());
    assert!(config.set_timeout_secs(120).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(1001).is_err());
    assert!(config.set_timeout_secs(0).is_err());

    assert_eq!(config.protocol, "https");
    assert_eq!(config.model, "new-model");
    assert_eq!(config.batch_size, 128);

    let mut retrieval = RetrievalConfig::default();
    assert!(retrieval.set_top_k(5).is_ok());
    assert!(retrieval.set_top_k(0).is_err());
    assert!(retrieval.set_top_k(51).is_err());
    assert!(retrieval.set_display_chars(300).is_ok());
    assert!(retrieval.set_display_chars(0).is_err());
    assert_eq!(retrieval.top_k, 5);
    assert_eq!(retrieval.display_chars, 300);
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing config falls back to defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base_dir = temp_dir.path().join("nested");

    let mut config = Config {
        base_dir: base_dir.clone(),
        ..Config::default()
    };
    config.ollama.host = "embedder.internal".to_string();
    config.chunking.chunk_size = 800;
    config.retrieval.top_k = 5;
    config.save().expect("should save config");

    assert!(base_dir.join("config.toml").exists());

    let loaded = Config::load(&base_dir).expect("should reload config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[chunking]\nchunk_size = 100\nchunk_overlap = 200\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn model_cache_dir_defaults_under_base_dir() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    assert_eq!(config.model_cache_dir(), temp_dir.path().join("models"));

    config.fastembed.cache_dir = Some(PathBuf::from("/var/cache/pdf-qa"));
    assert_eq!(config.model_cache_dir(), PathBuf::from("/var/cache/pdf-qa"));
}
