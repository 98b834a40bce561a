mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, Dedupe, Enhancement, IndexProviderConfig, LlmProviderConfig, ProviderConfig,
	Providers, Ranking, Search, Service, Session,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.similarity_threshold) {
		return Err(Error::Validation {
			message: "search.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.search.metadata_candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "search.metadata_candidate_multiplier must be greater than zero.".to_string(),
		});
	}

	for (label, weight) in [
		("ranking.email_weight", cfg.ranking.email_weight),
		("ranking.document_weight", cfg.ranking.document_weight),
		("ranking.web_weight", cfg.ranking.web_weight),
		("ranking.recency_weight", cfg.ranking.recency_weight),
		("ranking.vector_weight", cfg.ranking.vector_weight),
		("ranking.fulltext_weight", cfg.ranking.fulltext_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if !(0.0..=1.0).contains(&cfg.ranking.reranker_weight) {
		return Err(Error::Validation {
			message: "ranking.reranker_weight must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.ranking.diversity_factor) {
		return Err(Error::Validation {
			message: "ranking.diversity_factor must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.ranking.recency_decay_days.is_finite() || cfg.ranking.recency_decay_days <= 0.0 {
		return Err(Error::Validation {
			message: "ranking.recency_decay_days must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.dedupe.similarity_threshold) {
		return Err(Error::Validation {
			message: "dedupe.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.chunking.chunk_size == 0 {
		return Err(Error::Validation {
			message: "chunking.chunk_size must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.chunk_overlap >= cfg.chunking.chunk_size {
		return Err(Error::Validation {
			message: "chunking.chunk_overlap must be less than chunking.chunk_size.".to_string(),
		});
	}
	if !(0.0..1.0).contains(&cfg.chunking.size_flexibility) {
		return Err(Error::Validation {
			message: "chunking.size_flexibility must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.session.cache_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "session.cache_ttl_secs must be greater than zero.".to_string(),
		});
	}

	for (label, api_base, timeout_ms) in [
		("vector", &cfg.providers.vector.api_base, cfg.providers.vector.timeout_ms),
		("fulltext", &cfg.providers.fulltext.api_base, cfg.providers.fulltext.timeout_ms),
		("rerank", &cfg.providers.rerank.api_base, cfg.providers.rerank.timeout_ms),
		("llm", &cfg.providers.llm.api_base, cfg.providers.llm.timeout_ms),
	] {
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	for api_base in [
		&mut cfg.providers.vector.api_base,
		&mut cfg.providers.fulltext.api_base,
		&mut cfg.providers.rerank.api_base,
		&mut cfg.providers.llm.api_base,
	] {
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_toml() -> String {
		r#"
[service]
log_level = "debug"

[providers.vector]
provider_id = "v"
api_base    = "http://localhost:9200/"
api_key     = "key"
path        = "/vector/search"
timeout_ms  = 5000

[providers.fulltext]
provider_id = "f"
api_base    = "http://localhost:9300"
api_key     = "key"
path        = "/fulltext/search"
timeout_ms  = 5000

[providers.rerank]
provider_id = "r"
api_base    = "http://localhost:9400"
api_key     = "key"
path        = "/rerank"
model       = "reranker-base"
timeout_ms  = 5000

[providers.llm]
provider_id = "l"
api_base    = "http://localhost:9500"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "chat-base"
temperature = 0.1
timeout_ms  = 5000

[ranking]
email_weight       = 1.0
document_weight    = 1.2
web_weight         = 0.8
recency_weight     = 0.3
recency_decay_days = 365.0
vector_weight      = 1.0
fulltext_weight    = 1.1
reranker_weight    = 0.7
diversity_factor   = 0.1
"#
		.to_string()
	}

	#[test]
	fn parses_and_validates_sample() {
		let mut cfg: Config = toml::from_str(&sample_toml()).unwrap();

		normalize(&mut cfg);

		assert!(validate(&cfg).is_ok());
		// Trailing slash was normalized away.
		assert_eq!(cfg.providers.vector.api_base, "http://localhost:9200");
		// Omitted sections fall back to their defaults.
		assert_eq!(cfg.search.top_k, 10);
		assert_eq!(cfg.dedupe.similarity_threshold, 0.85);
		assert_eq!(cfg.session.cache_ttl_secs, 300);
	}

	#[test]
	fn missing_ranking_weight_fails_parse() {
		let raw = sample_toml().replace("reranker_weight    = 0.7\n", "");

		assert!(toml::from_str::<Config>(&raw).is_err());
	}

	#[test]
	fn out_of_range_reranker_weight_fails_validation() {
		let raw = sample_toml().replace("reranker_weight    = 0.7", "reranker_weight    = 1.5");
		let cfg: Config = toml::from_str(&raw).unwrap();

		assert!(matches!(validate(&cfg), Err(Error::Validation { .. })));
	}

	#[test]
	fn overlap_must_stay_below_chunk_size() {
		let mut cfg: Config = toml::from_str(&sample_toml()).unwrap();

		cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;

		assert!(matches!(validate(&cfg), Err(Error::Validation { .. })));
	}
}
