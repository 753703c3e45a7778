use std::io::{BufRead, BufReader, Read};

use tracing::Level;

const ERROR_PREFIXES: [&str; 3] = ["\x1b[0;31mERROR:\x1b[0m ", "ERROR: ", "ERROR:"];
const WARNING_PREFIXES: [&str; 3] = ["\x1b[0;33mWARNING:\x1b[0m ", "WARNING: ", "WARNING:"];

/// Maps a line printed by yt-dlp to a log level and the message without
/// yt-dlp's own level prefix. Blank lines yield `None`.
pub fn classify_line(line: &str) -> Option<(Level, &str)> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return None;
    }

    if let Some(message) = line.strip_prefix("[debug] ") {
        return Some((Level::DEBUG, message));
    }
    for prefix in ERROR_PREFIXES {
        if let Some(message) = line.strip_prefix(prefix) {
            return Some((Level::ERROR, message));
        }
    }
    for prefix in WARNING_PREFIXES {
        if let Some(message) = line.strip_prefix(prefix) {
            return Some((Level::WARN, message));
        }
    }

    Some((Level::INFO, line.strip_prefix("[info] ").unwrap_or(line)))
}

/// Re-emits every line of `reader` under the `yt_dlp` target until EOF.
pub(crate) fn forward_output<R: Read>(reader: R) {
    for line in BufReader::new(reader).lines() {
        let Ok(line) = line else {
            break;
        };

        let Some((level, message)) = classify_line(&line) else {
            continue;
        };

        if level == Level::ERROR {
            tracing::error!(target: "yt_dlp", "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: "yt_dlp", "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: "yt_dlp", "{message}");
        } else {
            tracing::info!(target: "yt_dlp", "{message}");
        }
    }
}
