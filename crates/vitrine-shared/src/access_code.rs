//! Public access codes handed out when a tenant is published.
//!
//! Eight symbols from an alphabet without look-alike characters, displayed
//! as `XXXX-XXXX`. Parsing is forgiving about case, spaces and the dash.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{ACCESS_CODE_ALPHABET, ACCESS_CODE_LEN};
use crate::error::AccessCodeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(String);

impl AccessCode {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..ACCESS_CODE_LEN)
            .map(|_| ACCESS_CODE_ALPHABET[rng.gen_range(0..ACCESS_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    pub fn parse(input: &str) -> Result<Self, AccessCodeError> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let found = normalized.chars().count();
        if found != ACCESS_CODE_LEN {
            return Err(AccessCodeError::InvalidLength {
                expected: ACCESS_CODE_LEN,
                found,
            });
        }

        if let Some(bad) = normalized
            .chars()
            .find(|c| !c.is_ascii() || !ACCESS_CODE_ALPHABET.contains(&(*c as u8)))
        {
            return Err(AccessCodeError::InvalidCharacter(bad));
        }

        Ok(Self(normalized))
    }

    /// The bare symbols, without the display dash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccessCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (head, tail) = self.0.split_at(ACCESS_CODE_LEN / 2);
        write!(f, "{head}-{tail}")
    }
}

impl TryFrom<String> for AccessCode {
    type Error = AccessCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> Self {
        code.0
    }
}
