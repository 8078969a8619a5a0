// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! S/MIME signing and verification via `openssl`.
//!
//! This crate does not implement any cryptography. It validates inputs,
//! calls out to `openssl smime` and interprets the result. The signatures
//! it produces are the kind used by Apple Wallet passes and other formats
//! that want a detached PKCS #7 signature over arbitrary bytes.
//!
//! [sign] and [verify] accept formats as strings and are the simplest entry
//! points. [SmimeSign] and [SmimeVerify] expose every knob, including the
//! `openssl` executable to run and a timeout.
//!
//! Each call spawns one `openssl` process and blocks until it exits. No state
//! is shared between calls.

mod error;
pub use error::SmimeError;
mod format;
pub use format::SmimeFormat;
mod openssl;
pub use openssl::{find_openssl, resolve_program, SmimeCommand, OPENSSL_ENV};
mod paths;
pub use paths::validate_paths;
mod signing;
pub use signing::SmimeSign;
#[cfg(test)]
mod testutil;
mod verify;
pub use verify::{SmimeVerification, SmimeVerify};

use std::{path::Path, str::FromStr, time::Duration};

/// Sign `content`, returning the signature encoded as `output_format`.
///
/// `output_format` must be one of `SMIME`, `PEM`, or `DER`. All paths must be
/// absolute paths to existing files. They are checked before the format.
///
/// `openssl` is killed if it runs longer than `timeout`.
pub fn sign(
    signer_cert: impl AsRef<Path>,
    signer_key: impl AsRef<Path>,
    content: &[u8],
    output_format: &str,
    cert_chain: Option<&Path>,
    recipient_cert: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, SmimeError> {
    let mut request = SmimeSign::new(signer_cert, signer_key);
    request.timeout(timeout);

    if let Some(path) = cert_chain {
        request.certificate_chain(path);
    }
    if let Some(path) = recipient_cert {
        request.recipient_certificate(path);
    }

    validate_paths(&request.input_paths())?;
    request.output_format(SmimeFormat::from_str(output_format)?);

    request.run(content)
}

/// Verify a detached signature over the file at `content_path`.
///
/// `signer_cert` acts as the trust anchor. Returns `Ok(false)` whenever
/// `openssl` exits non-zero, regardless of the reason. A timeout is an error,
/// not `false`.
pub fn verify(
    signer_cert: impl AsRef<Path>,
    content_path: impl AsRef<Path>,
    signature_path: impl AsRef<Path>,
    signature_format: &str,
    timeout: Option<Duration>,
) -> Result<bool, SmimeError> {
    let mut request = SmimeVerify::new(signer_cert, content_path, signature_path);
    request.timeout(timeout);

    validate_paths(&request.input_paths())?;
    request.signature_format(SmimeFormat::from_str(signature_format)?);

    request.run()
}
