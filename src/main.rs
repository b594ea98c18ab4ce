use polidex::cli::{Cli, Commands, ConfigAction};
use polidex::config::Config;
use polidex::corpus::Corpus;
use polidex::error::{PolidexError, Result};
use polidex::reasoning::{GeminiSelector, NodeSelector};
use polidex::retrieval::{HybridRetriever, QueryFilters};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            query,
            limit,
            doc,
            json,
            offline,
        } => {
            cmd_query(cli.config, &query, limit, doc, json, offline)?;
        }
        Commands::Docs { id } => {
            cmd_docs(cli.config, id)?;
        }
        Commands::Status => {
            cmd_status(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose { "polidex=debug" } else { "polidex=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_query(
    config_path: Option<std::path::PathBuf>,
    query: &str,
    limit: Option<usize>,
    doc: Option<String>,
    json: bool,
    offline: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let top_k = limit.unwrap_or(config.retrieval.top_k);

    // The reasoning selector is optional: without it the tree strategy simply
    // contributes nothing
    let selector: Option<Arc<dyn NodeSelector>> = if offline || !config.reasoning.enabled {
        None
    } else {
        match GeminiSelector::from_config(&config.reasoning) {
            Ok(selector) => Some(Arc::new(selector)),
            Err(e) => {
                tracing::warn!("Reasoning client unavailable, continuing without it: {}", e);
                None
            }
        }
    };

    let engine = HybridRetriever::initialize(&config, selector)?;

    let filters = QueryFilters { document_id: doc };

    let rt = tokio::runtime::Runtime::new().map_err(|e| PolidexError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let result = rt.block_on(engine.retrieve(query, top_k, &filters));

    if json {
        let serialized =
            serde_json::to_string_pretty(&result).map_err(|e| PolidexError::Json {
                source: e,
                context: "Failed to serialize retrieval result".to_string(),
            })?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Query: {}", result.query);
    println!(
        "Found {} candidates, showing {}",
        result.total_found,
        result.chunks.len()
    );

    for (i, chunk) in result.chunks.iter().enumerate() {
        println!("\n[{}] {} (score: {:.2})", i + 1, chunk.source, chunk.score);
        if let Some(strategy) = chunk.metadata.get("strategy") {
            println!("    strategy: {}", strategy);
        }
        println!("{}", chunk.content);
    }

    if result.chunks.is_empty() {
        println!("\nNo relevant passages found.");
    }

    Ok(())
}

fn cmd_docs(config_path: Option<std::path::PathBuf>, id: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let corpus = Corpus::load(&config.corpus.corpus_dir)?;

    if let Some(doc_id) = id {
        let content = corpus
            .full_content(&doc_id)
            .ok_or(PolidexError::DocumentNotFound { id: doc_id })?;
        println!("{}", content);
        return Ok(());
    }

    let documents = corpus.list();
    println!("Documents: {} total", documents.len());
    for doc in documents {
        println!("  {} - {}", doc.id, doc.title);
        if !doc.description.is_empty() {
            println!("      {}", doc.description);
        }
    }

    Ok(())
}

fn cmd_status(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = HybridRetriever::initialize(&config, None)?;
    let status = engine.status();

    println!("Polidex Status");
    println!("==============");
    println!("\nDocuments: {}", status.document_count);
    println!("Chunks:    {}", status.chunk_count);
    println!(
        "Trees:     {} ({} nodes)",
        status.tree_count, status.tree_node_count
    );
    println!("Entities:  {}", status.entity_count);
    println!("\nMode: {}", status.mode);

    Ok(())
}

fn cmd_config(config_path: Option<std::path::PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| PolidexError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| PolidexError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'polidex config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        return Ok(config);
    }

    Config::load(&path)
}
