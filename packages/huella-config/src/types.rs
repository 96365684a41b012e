use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub images: Images,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub comparison: Comparison,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	/// Vision model that turns one photo into species, breed, color and description.
	pub identification: LlmProviderConfig,
	/// Vision model that scores a query photo against a batch of candidate photos.
	pub comparison: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub temperature: Option<f32>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Images {
	/// Images strictly larger than this are downscaled and re-encoded before upload.
	#[serde(default = "default_max_inline_bytes")]
	pub max_inline_bytes: u64,
	#[serde(default = "default_max_width")]
	pub max_width: u32,
	#[serde(default = "default_jpeg_quality")]
	pub jpeg_quality: u8,
	#[serde(default = "default_fetch_timeout_ms")]
	pub fetch_timeout_ms: u64,
	/// Downloads larger than this are abandoned; the original reference is sent instead.
	#[serde(default = "default_max_fetch_bytes")]
	pub max_fetch_bytes: u64,
}
impl Default for Images {
	fn default() -> Self {
		Self {
			max_inline_bytes: default_max_inline_bytes(),
			max_width: default_max_width(),
			jpeg_quality: default_jpeg_quality(),
			fetch_timeout_ms: default_fetch_timeout_ms(),
			max_fetch_bytes: default_max_fetch_bytes(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_max_results")]
	pub max_results: u32,
	/// Upper bound on rows pulled from the relevance query before position scoring.
	#[serde(default = "default_relevance_pool")]
	pub relevance_pool: u32,
	#[serde(default = "default_basic_sample_size")]
	pub basic_sample_size: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			max_results: default_max_results(),
			relevance_pool: default_relevance_pool(),
			basic_sample_size: default_basic_sample_size(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comparison {
	#[serde(default = "default_max_images")]
	pub max_images: u32,
	#[serde(default = "default_contact_key_marker")]
	pub contact_key_marker: String,
}
impl Default for Comparison {
	fn default() -> Self {
		Self { max_images: default_max_images(), contact_key_marker: default_contact_key_marker() }
	}
}

fn default_max_inline_bytes() -> u64 {
	1_048_576
}

fn default_max_width() -> u32 {
	800
}

fn default_jpeg_quality() -> u8 {
	80
}

fn default_fetch_timeout_ms() -> u64 {
	15_000
}

fn default_max_fetch_bytes() -> u64 {
	16_777_216
}

fn default_max_results() -> u32 {
	20
}

fn default_relevance_pool() -> u32 {
	200
}

fn default_basic_sample_size() -> u32 {
	50
}

fn default_max_images() -> u32 {
	10
}

fn default_contact_key_marker() -> String {
	"contact_".to_string()
}
