use crate::error::{CliError, Result};
use directories::ProjectDirs;
use ewoks::core::io::signal::SignalPeptideLookup;
use futures_util::StreamExt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const UNIPROT_STREAM_URL: &str = "https://rest.uniprot.org/uniprotkb/stream";
const SIGNAL_FIELDS: &str = "accession,id,ft_signal";

#[derive(Debug, Clone, Copy)]
pub enum DataProgress {
    DownloadStarted { total_size: Option<u64> },
    Downloading { downloaded: u64 },
    Validating,
}

/// Result of fetching the annotations of one proteome.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, entries: usize },
    Skipped { path: PathBuf },
}

/// Owns the local directory of cached UniProt signal-peptide annotations.
#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    #[cfg(test)]
    pub fn with_custom_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
        }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    /// Location of the cached annotations for `proteome`.
    pub fn proteome_path(&self, proteome: &str) -> PathBuf {
        self.base_path.join(format!("{proteome}.json"))
    }

    /// Fetches the signal-peptide annotations of `proteome` from UniProt.
    ///
    /// A cached file is kept unless `force` is set. The response is parsed before it is
    /// written, so a truncated download never replaces a usable cache entry.
    pub async fn download_signal_peptides(
        &self,
        proteome: &str,
        force: bool,
        mut progress_callback: impl FnMut(DataProgress),
    ) -> Result<DownloadOutcome> {
        validate_proteome_id(proteome)?;
        let target = self.proteome_path(proteome);
        if target.exists() && !force {
            info!("Annotations for {} already cached at {:?}", proteome, &target);
            return Ok(DownloadOutcome::Skipped { path: target });
        }
        fs::create_dir_all(&self.base_path)?;

        let query = format!("(proteome:{proteome})");
        info!("Requesting signal-peptide annotations for {}", proteome);
        let client = reqwest::Client::new();
        let response = client
            .get(UNIPROT_STREAM_URL)
            .query(&[
                ("compressed", "false"),
                ("format", "json"),
                ("query", query.as_str()),
                ("fields", SIGNAL_FIELDS),
            ])
            .send()
            .await?
            .error_for_status()?;

        let total_size = response.content_length();
        progress_callback(DataProgress::DownloadStarted { total_size });

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::with_capacity(total_size.unwrap_or(0) as usize);

        while let Some(item) = stream.next().await {
            let chunk = item?;
            buffer.extend_from_slice(&chunk);
            downloaded += chunk.len() as u64;
            progress_callback(DataProgress::Downloading { downloaded });
        }

        progress_callback(DataProgress::Validating);
        let lookup = SignalPeptideLookup::from_uniprot_json(buffer.as_slice()).map_err(|e| {
            CliError::FileParsing {
                path: target.clone(),
                source: e.into(),
            }
        })?;
        if lookup.is_empty() {
            warn!("Proteome {} has no annotated signal peptides.", proteome);
        }

        let partial = target.with_extension("json.part");
        fs::write(&partial, &buffer)?;
        fs::rename(&partial, &target)?;
        info!(
            "Cached {} signal-peptide annotation(s) to {:?}",
            lookup.len(),
            &target
        );

        Ok(DownloadOutcome::Downloaded {
            path: target,
            entries: lookup.len(),
        })
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, path.to_string_lossy().as_bytes()).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn determine_data_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_data_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_data_path(),
        }
    }

    fn get_path_config_file() -> Result<PathBuf> {
        ProjectDirs::from("org", "ewoks", "ewoks")
            .map(|dirs| dirs.config_dir().join("signal-path.conf"))
            .ok_or_else(|| CliError::Data("Could not determine config directory path.".to_string()))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "ewoks", "ewoks")
            .map(|dirs| dirs.data_dir().join("signal-peptides"))
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}

/// Proteome ids end up in a query string and a file name.
fn validate_proteome_id(proteome: &str) -> Result<()> {
    if proteome.is_empty() || !proteome.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CliError::Argument(format!(
            "'{}' is not a valid UniProt proteome identifier (expected e.g. UP000005640).",
            proteome
        )));
    }
    Ok(())
}
