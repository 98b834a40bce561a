use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use sift_chunking::ChunkingConfig;
use sift_domain::{DocumentFields, SearchMode, document_hash};
use sift_service::{MetadataSearchRequest, SearchRequest, SearchService, SessionContext};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run the full retrieval pipeline for a query.
	Search {
		query: Option<String>,
		/// Collection filter such as `all` or `emails,web`.
		#[arg(long, default_value = "all")]
		collections: String,
		/// Metadata filters as a JSON object.
		#[arg(long, value_name = "JSON")]
		filters: Option<String>,
		#[arg(long)]
		top_k: Option<u32>,
		#[arg(long)]
		no_rerank: bool,
	},
	/// Look up passages by metadata alone.
	Metadata {
		/// Metadata filters as a JSON object.
		#[arg(value_name = "JSON")]
		filters: String,
		#[arg(long, default_value = "all")]
		collections: String,
		#[arg(long)]
		query: Option<String>,
		#[arg(long)]
		top_k: Option<u32>,
	},
	/// Split a document file into indexable chunks.
	Chunk {
		file: PathBuf,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;

	init_tracing(&config)?;
	tracing::info!(config = %args.config.display(), "Configuration loaded.");

	match args.command {
		Command::Search { query, collections, filters, top_k, no_rerank } => {
			let service = SearchService::new(config);
			let session = SessionContext::new();
			let request = SearchRequest {
				query,
				collections: Some(collections),
				mode: SearchMode::Auto,
				filters: parse_filters(filters.as_deref())?,
				top_k,
				use_reranking: no_rerank.then_some(false),
				..Default::default()
			};
			let response = service.search(&session, &request).await?;

			println!("{}", serde_json::to_string_pretty(&response)?);
		},
		Command::Metadata { filters, collections, query, top_k } => {
			let service = SearchService::new(config);
			let request = MetadataSearchRequest {
				collections: Some(collections),
				filters: parse_filters(Some(&filters))?,
				content_query: query,
				top_k,
				..Default::default()
			};
			let hits = service.search_by_metadata(&request).await?;

			println!("{}", serde_json::to_string_pretty(&hits)?);
		},
		Command::Chunk { file } => {
			let text = fs::read_to_string(&file)?;
			let file_name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
			let parent_hash = document_hash(&text, &DocumentFields { file_name, ..Default::default() });
			let cfg = ChunkingConfig {
				chunk_size: config.chunking.chunk_size as usize,
				chunk_overlap: config.chunking.chunk_overlap as usize,
				size_flexibility: config.chunking.size_flexibility,
			};
			let chunks = sift_chunking::split_document(&text, &parent_hash, &cfg);

			println!("{}", serde_json::to_string_pretty(&chunks)?);
		},
	}

	Ok(())
}

fn parse_filters(raw: Option<&str>) -> color_eyre::Result<Map<String, Value>> {
	let Some(raw) = raw else {
		return Ok(Map::new());
	};
	let value: Value = serde_json::from_str(raw)?;
	let Value::Object(map) = value else {
		return Err(eyre::eyre!("Filters must be a JSON object."));
	};

	Ok(map)
}

fn init_tracing(config: &sift_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
