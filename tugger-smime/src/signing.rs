// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Producing S/MIME signatures with `openssl smime -sign`. */

use {
    crate::{
        error::SmimeError,
        format::SmimeFormat,
        openssl::{failure, find_openssl, SmimeCommand},
        paths::validate_paths,
    },
    log::info,
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
};

/// Represents an invocation of `openssl smime -sign` to sign some content.
///
/// Content is signed in binary mode, so it is never subject to MIME
/// canonicalization.
#[derive(Clone, Debug)]
pub struct SmimeSign {
    signer_certificate: PathBuf,
    signer_key: PathBuf,
    output_format: SmimeFormat,
    certificate_chain: Option<PathBuf>,
    recipient_certificate: Option<PathBuf>,
    openssl: PathBuf,
    timeout: Option<Duration>,
}

impl SmimeSign {
    /// Construct a new instance using a signer certificate and its private key.
    pub fn new(signer_certificate: impl AsRef<Path>, signer_key: impl AsRef<Path>) -> Self {
        Self {
            signer_certificate: signer_certificate.as_ref().to_path_buf(),
            signer_key: signer_key.as_ref().to_path_buf(),
            output_format: SmimeFormat::default(),
            certificate_chain: None,
            recipient_certificate: None,
            openssl: find_openssl(),
            timeout: None,
        }
    }

    /// Set the encoding of the emitted signature.
    ///
    /// This is passed into the `-outform` argument.
    pub fn output_format(&mut self, format: SmimeFormat) -> &mut Self {
        self.output_format = format;
        self
    }

    /// Include intermediate certificates from a file in the signature.
    ///
    /// This is passed into the `-certfile` argument.
    pub fn certificate_chain(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.certificate_chain = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the recipient certificate.
    ///
    /// This is passed as the final positional argument.
    pub fn recipient_certificate(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.recipient_certificate = Some(path.as_ref().to_path_buf());
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

    /// Paths that must exist for signing to proceed, in validation order.
    pub fn input_paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.signer_certificate.as_path(), self.signer_key.as_path()];
        paths.extend(self.certificate_chain.as_deref());
        paths.extend(self.recipient_certificate.as_deref());

        paths
    }

    /// Obtain the `openssl` command that [Self::run] would execute.
    pub fn command(&self) -> SmimeCommand {
        let mut command = SmimeCommand::new(&self.openssl);

        command
            .arg("-binary")
            .arg("-sign")
            .option("-signer", &self.signer_certificate)
            .option("-inkey", &self.signer_key)
            .option("-outform", self.output_format.as_str())
            .timeout(self.timeout);

        if let Some(chain) = &self.certificate_chain {
            command.option("-certfile", chain);
        }

        if let Some(recipient) = &self.recipient_certificate {
            command.arg(recipient);
        }

        command
    }

    /// Sign `content`, returning the signature in the requested encoding.
    pub fn run(&self, content: &[u8]) -> Result<Vec<u8>, SmimeError> {
        validate_paths(&self.input_paths())?;

        info!(
            "signing {} bytes with {} ({})",
            content.len(),
            self.signer_certificate.display(),
            self.output_format
        );

        let output = self.command().run(Some(content), true)?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(failure(&output))
        }
    }
}
