// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::error::SmimeError,
    std::{fmt::Display, str::FromStr},
};

/// Encoding of a signature produced or consumed by `openssl smime`.
///
/// Corresponds to the `-outform` and `-inform` arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SmimeFormat {
    /// MIME multipart message. This is what `openssl` uses by default.
    Smime,
    /// Base64 encoded PKCS #7 structure wrapped in PEM armor.
    Pem,
    /// Raw DER encoded PKCS #7 structure.
    Der,
}

impl Default for SmimeFormat {
    fn default() -> Self {
        Self::Smime
    }
}

impl SmimeFormat {
    /// All recognized formats, in their canonical order.
    pub fn all() -> &'static [Self] {
        &[Self::Smime, Self::Pem, Self::Der]
    }

    /// The tag used on the `openssl` command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smime => "SMIME",
            Self::Pem => "PEM",
            Self::Der => "DER",
        }
    }
}

impl Display for SmimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmimeFormat {
    type Err = SmimeError;

    // Tags are case sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| SmimeError::UnsupportedFormat {
                format: s.to_string(),
                supported: Self::all(),
            })
    }
}

impl TryFrom<&str> for SmimeFormat {
    type Error = SmimeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known() -> Result<(), SmimeError> {
        for format in SmimeFormat::all() {
            assert_eq!(SmimeFormat::from_str(format.as_str())?, *format);
        }

        Ok(())
    }

    #[test]
    fn parse_unknown() {
        for tag in ["INCORRECT", "smime", "Pem", "der", "", "PKCS7"] {
            match SmimeFormat::from_str(tag) {
                Err(SmimeError::UnsupportedFormat { format, supported }) => {
                    assert_eq!(format, tag);
                    assert_eq!(
                        supported,
                        &[SmimeFormat::Smime, SmimeFormat::Pem, SmimeFormat::Der]
                    );
                }
                other => panic!("unexpected result for {:?}: {:?}", tag, other),
            }
        }
    }

    #[test]
    fn default_is_smime() {
        assert_eq!(SmimeFormat::default(), SmimeFormat::Smime);
    }
}
