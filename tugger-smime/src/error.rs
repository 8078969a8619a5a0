// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::format::SmimeFormat,
    std::{path::PathBuf, time::Duration},
    thiserror::Error,
};

/// Represents an error when signing or verifying S/MIME content.
#[derive(Debug, Error)]
pub enum SmimeError {
    /// One of the checked paths was relative or did not refer to an existing file.
    ///
    /// Holds every path that was checked, in the order it was supplied.
    #[error("{} must be absolute paths to existing files", join_paths(.0))]
    InvalidPaths(Vec<PathBuf>),

    /// A format tag did not name one of the `supported` formats.
    #[error(
        "'{format}' not found in the set of supported formats: {}",
        join_formats(.supported)
    )]
    UnsupportedFormat {
        format: String,
        supported: &'static [SmimeFormat],
    },

    /// `openssl` ran but exited with a non-zero status.
    ///
    /// `code` is `None` if the process was terminated by a signal.
    #[error("OpenSSL failed with #{}: {stderr}", format_code(.code))]
    Openssl { code: Option<i32>, stderr: String },

    #[error("unable to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("openssl did not finish within {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_formats(formats: &[SmimeFormat]) -> String {
    formats
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}
