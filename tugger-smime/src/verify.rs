// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Verifying detached S/MIME signatures with `openssl smime -verify`. */

use {
    crate::{
        error::SmimeError,
        format::SmimeFormat,
        openssl::{find_openssl, SmimeCommand},
        paths::validate_paths,
    },
    log::{debug, info},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
};

/// Exit status `openssl smime` uses for "error verifying the message".
const EXIT_VERIFY_FAILURE: i32 = 4;

/// Result of a verification attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SmimeVerification {
    /// The signature is valid for the content and chains to the trust anchor.
    Verified,

    /// `openssl` read everything but rejected the signature.
    ///
    /// This covers content mismatches as well as certificate chain failures.
    SignatureRejected { stderr: String },

    /// `openssl` failed for another reason, such as an unreadable signature
    /// or a signature in a different encoding than declared.
    InvocationFailed { code: Option<i32>, stderr: String },
}

impl SmimeVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Represents an invocation of `openssl smime -verify` for a detached signature.
#[derive(Clone, Debug)]
pub struct SmimeVerify {
    signer_certificate: PathBuf,
    content: PathBuf,
    signature: PathBuf,
    signature_format: SmimeFormat,
    openssl: PathBuf,
    timeout: Option<Duration>,
}

impl SmimeVerify {
    /// Construct a new instance.
    ///
    /// `signer_certificate` is used as the trust anchor. `content` is the file
    /// that was signed and `signature` holds the signature over it.
    pub fn new(
        signer_certificate: impl AsRef<Path>,
        content: impl AsRef<Path>,
        signature: impl AsRef<Path>,
    ) -> Self {
        Self {
            signer_certificate: signer_certificate.as_ref().to_path_buf(),
            content: content.as_ref().to_path_buf(),
            signature: signature.as_ref().to_path_buf(),
            signature_format: SmimeFormat::default(),
            openssl: find_openssl(),
            timeout: None,
        }
    }

    /// Set the encoding of the signature file.
    ///
    /// This is passed into the `-inform` argument.
    pub fn signature_format(&mut self, format: SmimeFormat) -> &mut Self {
        self.signature_format = format;
        self
    }

    /// Use a specific `openssl` executable.
    pub fn openssl_program(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.openssl = path.as_ref().to_path_buf();
        self
    }

    /// Kill `openssl` if it runs longer than `timeout`.
    ///
    /// `None`, the default, waits forever.
    pub fn timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn input_paths(&self) -> Vec<&Path> {
        vec![
            self.signer_certificate.as_path(),
            self.content.as_path(),
            self.signature.as_path(),
        ]
    }

    /// Obtain the `openssl` command that [Self::run] would execute.
    pub fn command(&self) -> SmimeCommand {
        let mut command = SmimeCommand::new(&self.openssl);

        command
            .arg("-verify")
            .arg("-binary")
            .option("-CAfile", &self.signer_certificate)
            .option("-content", &self.content)
            .option("-in", &self.signature)
            .option("-inform", self.signature_format.as_str())
            .timeout(self.timeout);

        command
    }

    /// Verify the signature, distinguishing why verification failed.
    pub fn run_detailed(&self) -> Result<SmimeVerification, SmimeError> {
        validate_paths(&self.input_paths())?;

        info!(
            "verifying {} against {} ({})",
            self.signature.display(),
            self.content.display(),
            self.signature_format
        );

        let output = self.command().run(None, false)?;
        let stderr = String::from_utf8_lossy(&output.stderr)
            .trim_end()
            .to_string();

        let verification = match output.status.code() {
            Some(0) => SmimeVerification::Verified,
            Some(EXIT_VERIFY_FAILURE) => SmimeVerification::SignatureRejected { stderr },
            code => SmimeVerification::InvocationFailed { code, stderr },
        };

        debug!("verification result: {:?}", verification);

        Ok(verification)
    }

    /// Verify the signature.
    ///
    /// Any non-zero exit from `openssl` yields `false`. Use
    /// [Self::run_detailed] to tell a bad signature apart from a failed
    /// invocation.
    pub fn run(&self) -> Result<bool, SmimeError> {
        Ok(self.run_detailed()?.is_verified())
    }
}
