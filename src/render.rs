//! Converter invocation
//!
//! Runs the external converter for a single job:
//! `<converter> -o<dest> -T<format> <src>` (Graphviz-style attached flags).
//!
//! The destination directory is created before the spawn so the mirrored tree
//! materializes for arbitrarily nested sources. The converter's stderr is
//! captured in full; on success it is returned to the caller as diagnostic
//! text, on failure it becomes part of the error.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::job::RenderJob;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Build the converter command line for one source/destination pair
pub fn build_command(config: &RenderConfig, src: &Path, dest: &Path) -> Command {
    let mut out_flag = OsString::from("-o");
    out_flag.push(dest);

    let mut cmd = Command::new(&config.converter);
    cmd.arg(out_flag)
        .arg(format!("-T{}", config.format))
        .arg(src)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    cmd
}

/// Render one job, waiting for the converter to exit
///
/// Returns the converter's stderr output on success. The external tool may
/// write warnings there even when it exits 0.
pub async fn render_job(config: &RenderConfig, job: &RenderJob) -> Result<String, RenderError> {
    let src = job.source_path(&config.scan_root());
    let dest = job.dest_path(&config.mirror_root(), &config.format);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RenderError::OutputDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let mut cmd = build_command(config, &src, &dest);

    // One diagnostic line per job, before the spawn
    info!(
        converter = %config.converter.display(),
        format = %config.format,
        src = %src.display(),
        dest = %dest.display(),
        "dispatching conversion"
    );

    let output = cmd.output().await.map_err(|e| RenderError::SpawnFailed {
        converter: config.converter.clone(),
        source: e,
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(RenderError::ConverterFailed {
            path: src,
            status: output.status,
            stderr: stderr.trim_end().to_string(),
        });
    }

    Ok(stderr)
}
