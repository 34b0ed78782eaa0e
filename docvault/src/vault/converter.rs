// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::vault::ConvertDocuments;
use async_trait::async_trait;
use docvault_base::error::VaultError;
use docvault_base::{internal_server_error, not_found};
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::process::Command;

/// Converts files with external tools and caches the results.
///
/// A cached result is reused while it isn't older than its source.
pub(crate) struct CommandConverter {
    cache_path: PathBuf,
    pdf_cmd: String,
    swf_cmd: String,
}

impl CommandConverter {
    /// # Arguments
    ///
    /// * `cache_path` - Folder for converted files
    /// * `pdf_cmd` - Office suite, called as `<cmd> --headless --convert-to pdf --outdir <dir> <file>`
    /// * `swf_cmd` - PDF to SWF converter, called as `<cmd> <pdf> -o <swf>`
    pub fn new(cache_path: PathBuf, pdf_cmd: &str, swf_cmd: &str) -> Self {
        Self {
            cache_path,
            pdf_cmd: pdf_cmd.to_string(),
            swf_cmd: swf_cmd.to_string(),
        }
    }

    fn output_dir(&self, source: &Path) -> PathBuf {
        let mut crc = crc64fast::Digest::new();
        crc.write(source.to_string_lossy().as_bytes());
        self.cache_path.join(format!("{:016x}", crc.sum64()))
    }

    fn output_path(&self, source: &Path, extension: &str) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "converted".to_string());
        self.output_dir(source)
            .join(format!("{}.{}", stem, extension))
    }

    async fn run(&self, cmd: &str, args: Vec<String>, output: &Path) -> Result<(), VaultError> {
        let mut parts = cmd.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(internal_server_error!("No converter command configured"));
        };

        let mut command = Command::new(program);
        command.args(parts).args(&args);
        debug!("Running {} {:?}", cmd, args);

        let status = command.status().await.map_err(|err| {
            error!("Failed to start converter '{}': {}", program, err);
            internal_server_error!("Failed to convert '{}'", output.display())
        })?;

        if !status.success() || !output.exists() {
            error!("Converter '{}' exited with {}", program, status);
            return Err(internal_server_error!(
                "Failed to convert '{}'",
                output.display()
            ));
        }
        Ok(())
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

async fn is_cached(source: &Path, output: &Path) -> bool {
    match (modified(source).await, modified(output).await) {
        (Some(source), Some(output)) => output >= source,
        _ => false,
    }
}

#[async_trait]
impl ConvertDocuments for CommandConverter {
    async fn convert_to_pdf(&self, source: &Path) -> Result<PathBuf, VaultError> {
        if !source.exists() {
            return Err(not_found!("File '{}' doesn't exist", source.display()));
        }

        let is_pdf = source
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            return Ok(source.to_path_buf());
        }

        let output = self.output_path(source, "pdf");
        if is_cached(source, &output).await {
            return Ok(output);
        }

        let out_dir = self.output_dir(source);
        tokio::fs::create_dir_all(&out_dir).await?;
        self.run(
            &self.pdf_cmd,
            vec![
                "--headless".to_string(),
                "--convert-to".to_string(),
                "pdf".to_string(),
                "--outdir".to_string(),
                out_dir.to_string_lossy().to_string(),
                source.to_string_lossy().to_string(),
            ],
            &output,
        )
        .await?;
        Ok(output)
    }

    async fn convert_to_swf(&self, source: &Path) -> Result<PathBuf, VaultError> {
        let pdf = self.convert_to_pdf(source).await?;

        let output = self.output_path(source, "swf");
        if is_cached(&pdf, &output).await {
            return Ok(output);
        }

        tokio::fs::create_dir_all(self.output_dir(source)).await?;
        self.run(
            &self.swf_cmd,
            vec![
                pdf.to_string_lossy().to_string(),
                "-o".to_string(),
                output.to_string_lossy().to_string(),
            ],
            &output,
        )
        .await?;
        Ok(output)
    }
}
