use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use super::{output::forward_output, DownloadJob, PreWriteHook, StreamDownload};
use crate::error::{TrecError, TrecResult};

/// Downloads live streams with the `yt-dlp` CLI.
///
/// A download runs yt-dlp twice: once with `--print filename` to let it
/// resolve the output template against the stream metadata, and once to
/// record into exactly that file.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    channel_base: String,
}

impl YtDlp {
    pub const TWITCH_CHANNEL_BASE: &str = "https://twitch.tv";

    /// Locates `program` (a name on `PATH` or a path to the executable).
    pub fn locate<S: AsRef<OsStr>>(program: S) -> TrecResult<Self> {
        let program = which::which(program)?;
        tracing::debug!("Using yt-dlp at {}", program.display());
        Ok(Self::with_program(program))
    }

    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            channel_base: Self::TWITCH_CHANNEL_BASE.to_string(),
        }
    }

    pub fn channel_url(&self, user: &str) -> String {
        format!("{}/{user}", self.channel_base.trim_end_matches('/'))
    }

    fn resolve_filename(&self, job: &DownloadJob) -> TrecResult<PathBuf> {
        let mut home = OsString::from("home:");
        home.push(&job.output_dir);

        let output = Command::new(&self.program)
            .args(["--quiet", "--no-warnings", "--skip-download"])
            .args(["--print", "filename"])
            .arg("--paths")
            .arg(home)
            .arg("--output")
            .arg(&job.output_template)
            .args(&job.options)
            .arg(self.channel_url(&job.user))
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrecError::DownloadFailed(format!(
                "yt-dlp exited with {} while resolving the output file: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                TrecError::DownloadFailed("yt-dlp did not report an output file".to_string())
            })
    }

    fn record(&self, job: &DownloadJob, filename: &Path) -> TrecResult<()> {
        let mut child = Command::new(&self.program)
            .arg("--newline")
            .arg("--output")
            .arg(escape_template(filename))
            .args(&job.options)
            .arg(self.channel_url(&job.user))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        std::thread::scope(|s| {
            if let Some(stderr) = stderr {
                s.spawn(move || forward_output(stderr));
            }
            if let Some(stdout) = stdout {
                forward_output(stdout);
            }
        });

        let status = child.wait()?;
        if !status.success() {
            return Err(TrecError::DownloadFailed(format!(
                "yt-dlp exited with {status}"
            )));
        }

        Ok(())
    }
}

impl StreamDownload for YtDlp {
    fn download(&self, job: &DownloadJob, hook: PreWriteHook<'_>) -> TrecResult<()> {
        let filename = self.resolve_filename(job)?;
        tracing::debug!(
            "Resolved output file for stream {}: {}",
            job.user,
            filename.display()
        );

        hook.fire(&filename)?;
        self.record(job, &filename)
    }
}

/// Turns a resolved file name back into an output template that yt-dlp
/// expands to itself.
fn escape_template(filename: &Path) -> String {
    filename.to_string_lossy().replace('%', "%%")
}
