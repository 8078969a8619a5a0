// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::openssl::{find_openssl, resolve_program},
    anyhow::{anyhow, Result},
    once_cell::sync::Lazy,
    std::path::{Path, PathBuf},
};

pub static DEFAULT_TEMP_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
    tempfile::Builder::new()
        .prefix("tugger-smime-test")
        .tempdir()
        .expect("unable to create temporary directory")
});

/// Content that gets signed in tests.
pub const MANIFEST_JSON: &[u8] = br#"{
  "icon.png": "0296b01347b3173e98438a003b0e88986340b2d8",
  "logo.png": "25de09e2d3b01ce1fe00c2ca9a90a2be1aaa05cf",
  "pass.json": "145ea5a5db784fff485126c77ecf7a1fc2a88ee7"
}
"#;

static OPENSSL_AVAILABLE: Lazy<bool> = Lazy::new(|| match resolve_program(&find_openssl()) {
    Ok(program) => duct::cmd(program, ["version"])
        .stdout_null()
        .stderr_null()
        .run()
        .is_ok(),
    Err(_) => false,
});

/// Whether an `openssl` executable can be run.
pub fn openssl_available() -> bool {
    *OPENSSL_AVAILABLE
}

/// Certificates, keys, and content used by signing tests.
pub struct Fixtures {
    pub signer_cert: PathBuf,
    pub signer_key: PathBuf,
    pub chain_cert: PathBuf,
    pub recipient_cert: PathBuf,
    pub manifest_path: PathBuf,
}

static FIXTURES: Lazy<Option<Fixtures>> = Lazy::new(|| {
    if !openssl_available() {
        return None;
    }

    Some(create_fixtures(&DEFAULT_TEMP_DIR.path().join("fixtures")).expect("creating fixtures"))
});

/// Obtain shared fixtures, or `None` if `openssl` is not available.
pub fn fixtures() -> Option<&'static Fixtures> {
    FIXTURES.as_ref()
}

fn generate_self_signed(dir: &Path, name: &str) -> Result<(PathBuf, PathBuf)> {
    let cert = dir.join(format!("{}.cert", name));
    let key = dir.join(format!("{}.pem", name));

    let output = duct::cmd(
        resolve_program(&find_openssl())?,
        [
            "req".into(),
            "-x509".into(),
            "-newkey".into(),
            "rsa:2048".into(),
            "-nodes".into(),
            "-days".into(),
            "30".into(),
            "-subj".into(),
            format!("/CN={}@example.com", name),
            "-keyout".into(),
            key.display().to_string(),
            "-out".into(),
            cert.display().to_string(),
        ],
    )
    .stdout_null()
    .stderr_capture()
    .unchecked()
    .run()?;

    if output.status.success() {
        Ok((cert, key))
    } else {
        Err(anyhow!(
            "generating {} certificate: {}",
            name,
            String::from_utf8_lossy(&output.stderr)
        ))
    }
}

fn create_fixtures(dir: &Path) -> Result<Fixtures> {
    std::fs::create_dir_all(dir)?;

    let (signer_cert, signer_key) = generate_self_signed(dir, "signer")?;
    let (chain_cert, _) = generate_self_signed(dir, "intermediate")?;
    let (recipient_cert, _) = generate_self_signed(dir, "recipient")?;

    let manifest_path = dir.join("manifest.json");
    std::fs::write(&manifest_path, MANIFEST_JSON)?;

    Ok(Fixtures {
        signer_cert,
        signer_key,
        chain_cert,
        recipient_cert,
        manifest_path,
    })
}

/// Write an executable shell script standing in for `openssl`.
#[cfg(target_family = "unix")]
pub fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;

    Ok(path)
}
