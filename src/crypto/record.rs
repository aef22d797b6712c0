// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Record-level encryption of the three sensitive card attributes.
//!
//! Each attribute is a [`SensitiveValue`]: either `Plain` or `Sealed`. The
//! state travels with the value, so "is this encrypted" can never drift out
//! of sync with what is stored.
//!
//! The two directions fail differently:
//!
//! - [`RecordCipher::seal`] is all-or-nothing. One failing field aborts the
//!   whole record and nothing partially sealed escapes.
//! - [`RecordCipher::open`] is best-effort. A field that cannot be opened is
//!   redacted to `None` and the remaining fields are still returned.

use serde::{Deserialize, Serialize};

use super::{CryptoResult, FieldCipher, FieldSealer};

/// A sensitive attribute value and whether it is ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SensitiveValue {
    /// Cleartext. Only ever held in memory on the way in or out.
    Plain(String),
    /// Field-cipher token.
    Sealed(String),
}

impl SensitiveValue {
    pub fn is_sealed(&self) -> bool {
        matches!(self, SensitiveValue::Sealed(_))
    }

    /// The cleartext, if this value is not sealed.
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            SensitiveValue::Plain(value) => Some(value),
            SensitiveValue::Sealed(_) => None,
        }
    }
}

/// Names of the sensitive attributes, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitiveField {
    Number,
    Cvv,
    Expiry,
}

impl SensitiveField {
    pub const ALL: [SensitiveField; 3] = [Self::Number, Self::Cvv, Self::Expiry];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensitiveField::Number => "number",
            SensitiveField::Cvv => "cvv",
            SensitiveField::Expiry => "expiry",
        }
    }
}

/// The three sensitive attributes of a card record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<SensitiveValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv: Option<SensitiveValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<SensitiveValue>,
}

impl SensitiveFields {
    /// Build from optional cleartext inputs.
    pub fn from_plain(
        number: Option<String>,
        cvv: Option<String>,
        expiry: Option<String>,
    ) -> Self {
        Self {
            number: number.map(SensitiveValue::Plain),
            cvv: cvv.map(SensitiveValue::Plain),
            expiry: expiry.map(SensitiveValue::Plain),
        }
    }

    pub fn get(&self, field: SensitiveField) -> Option<&SensitiveValue> {
        match field {
            SensitiveField::Number => self.number.as_ref(),
            SensitiveField::Cvv => self.cvv.as_ref(),
            SensitiveField::Expiry => self.expiry.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, field: SensitiveField) -> &mut Option<SensitiveValue> {
        match field {
            SensitiveField::Number => &mut self.number,
            SensitiveField::Cvv => &mut self.cvv,
            SensitiveField::Expiry => &mut self.expiry,
        }
    }

    /// Cleartext of `field`, if present and not sealed.
    pub fn plain(&self, field: SensitiveField) -> Option<String> {
        self.get(field)
            .and_then(SensitiveValue::as_plain)
            .map(str::to_string)
    }

    /// True when any attribute is still ciphertext.
    pub fn any_sealed(&self) -> bool {
        SensitiveField::ALL
            .iter()
            .any(|f| self.get(*f).is_some_and(SensitiveValue::is_sealed))
    }
}

/// Applies a [`FieldSealer`] to every sensitive attribute of a record.
#[derive(Clone)]
pub struct RecordCipher<S = FieldCipher> {
    sealer: S,
}

impl<S: FieldSealer> RecordCipher<S> {
    pub fn new(sealer: S) -> Self {
        Self { sealer }
    }

    /// Seal every present, non-blank `Plain` attribute.
    ///
    /// Absent or blank attributes and already-sealed values are left as they
    /// are. The input is never modified; on error no sealed record exists.
    pub fn seal(&self, fields: &SensitiveFields) -> CryptoResult<SensitiveFields> {
        let mut sealed = SensitiveFields::default();

        for field in SensitiveField::ALL {
            let value = match fields.get(field) {
                Some(SensitiveValue::Plain(plain)) => match self.sealer.seal(plain)? {
                    Some(token) => Some(SensitiveValue::Sealed(token)),
                    None => Some(SensitiveValue::Plain(plain.clone())),
                },
                other => other.cloned(),
            };
            *sealed.slot_mut(field) = value;
        }

        Ok(sealed)
    }

    /// Open every sealed attribute.
    ///
    /// A sealed value that fails to decrypt becomes `None` and is logged;
    /// the other attributes are still opened.
    pub fn open(&self, fields: &SensitiveFields) -> SensitiveFields {
        let mut opened = SensitiveFields::default();

        for field in SensitiveField::ALL {
            let value = match fields.get(field) {
                Some(SensitiveValue::Sealed(token)) => match self.sealer.open(token) {
                    Ok(plain) => Some(SensitiveValue::Plain(plain)),
                    Err(e) => {
                        tracing::warn!(
                            field = field.as_str(),
                            error = %e,
                            "Sensitive field could not be decrypted, redacting"
                        );
                        None
                    }
                },
                other => other.cloned(),
            };
            *opened.slot_mut(field) = value;
        }

        opened
    }
}
