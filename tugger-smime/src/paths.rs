// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Preflight checks on paths handed to `openssl`. */

use {
    crate::error::SmimeError,
    std::path::{Path, PathBuf},
};

/// Ensure every path is absolute and refers to an existing file.
///
/// On failure the error names every path that was checked, in input order,
/// not just the offending ones.
///
/// This is a preflight check. A file can still vanish before `openssl`
/// opens it.
pub fn validate_paths<P: AsRef<Path>>(paths: &[P]) -> Result<(), SmimeError> {
    let valid = paths
        .iter()
        .map(|p| p.as_ref())
        .all(|p| p.is_absolute() && p.is_file());

    if valid {
        Ok(())
    } else {
        Err(SmimeError::InvalidPaths(
            paths
                .iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect::<Vec<PathBuf>>(),
        ))
    }
}
