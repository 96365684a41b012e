mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Comparison, Config, Images, LlmProviderConfig, Postgres, Providers, Search, Service, Storage,
};

use std::{fs, path::Path};

/// Hard ceiling on images per comparison request, regardless of configuration.
pub const MAX_COMPARISON_IMAGES: u32 = 10;

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, provider) in
		[("identification", &cfg.providers.identification), ("comparison", &cfg.providers.comparison)]
	{
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
		if provider.model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} model must be non-empty."),
			});
		}
		if provider.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
		if let Some(temperature) = provider.temperature
			&& (!temperature.is_finite() || temperature < 0.0)
		{
			return Err(Error::Validation {
				message: format!(
					"Provider {label} temperature must be a finite number, zero or greater."
				),
			});
		}
		if provider.default_headers.values().any(|value| !value.is_string()) {
			return Err(Error::Validation {
				message: format!("Provider {label} default_headers values must be strings."),
			});
		}
	}

	if cfg.images.max_inline_bytes == 0 {
		return Err(Error::Validation {
			message: "images.max_inline_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.images.max_width == 0 {
		return Err(Error::Validation {
			message: "images.max_width must be greater than zero.".to_string(),
		});
	}
	if !(1..=100).contains(&cfg.images.jpeg_quality) {
		return Err(Error::Validation {
			message: "images.jpeg_quality must be in the range 1-100.".to_string(),
		});
	}
	if cfg.images.fetch_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "images.fetch_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.images.max_fetch_bytes < cfg.images.max_inline_bytes {
		return Err(Error::Validation {
			message: "images.max_fetch_bytes must be at least images.max_inline_bytes.".to_string(),
		});
	}
	if cfg.search.max_results == 0 {
		return Err(Error::Validation {
			message: "search.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.relevance_pool < cfg.search.max_results {
		return Err(Error::Validation {
			message: "search.relevance_pool must be at least search.max_results.".to_string(),
		});
	}
	if cfg.search.basic_sample_size == 0 {
		return Err(Error::Validation {
			message: "search.basic_sample_size must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_COMPARISON_IMAGES).contains(&cfg.comparison.max_images) {
		return Err(Error::Validation {
			message: format!(
				"comparison.max_images must be in the range 1-{MAX_COMPARISON_IMAGES}."
			),
		});
	}
	if cfg.comparison.contact_key_marker.is_empty() {
		return Err(Error::Validation {
			message: "comparison.contact_key_marker must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in [&mut cfg.providers.identification, &mut cfg.providers.comparison] {
		let trimmed = provider.api_base.trim().trim_end_matches('/').to_string();

		provider.api_base = trimmed;
	}

	cfg.comparison.contact_key_marker = cfg.comparison.contact_key_marker.trim().to_string();
}
