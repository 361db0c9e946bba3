//! Transparent decryption at the read boundary.
//!
//! Read paths return sealed shapes from the store; call sites apply
//! [`Reveal`] before results leave this crate. The traversal is a closed,
//! statically-typed set of shapes rather than a runtime walk over untyped
//! objects: a plain shape has no field that could carry an envelope, so
//! ciphertext cannot survive interception, and a new container shape that
//! forgets to reveal its columns fails to compile rather than leaking.

use crate::types::{DataColumn, Dataset, SealedColumn, SealedDataset};
use serde_json::Value;
use tablevault_crypto::EnvelopeCrypto;
use tracing::warn;

/// Decrypts a sealed value into its plaintext counterpart, consuming the
/// sealed form.
///
/// Containers compose field-wise: a result shape holding sealed columns
/// anywhere inside it (lists, optionals, nested relations) implements
/// `Reveal` by revealing each part.
pub trait Reveal {
    type Plain;

    fn reveal(self, crypto: &EnvelopeCrypto) -> Self::Plain;
}

impl Reveal for SealedColumn {
    type Plain = DataColumn;

    /// A column that cannot be decrypted degrades to an empty value list
    /// instead of failing the read, so one corrupted column never hides
    /// its healthy siblings. The envelope is consumed either way.
    fn reveal(self, crypto: &EnvelopeCrypto) -> DataColumn {
        let data = match crypto.decrypt(&self.envelope) {
            Ok(plaintext) => match serde_json::from_str::<Vec<Value>>(&plaintext) {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        dataset_id = %self.dataset_id,
                        column_id = %self.id,
                        column = %self.name,
                        error = %e,
                        "decrypted column payload is not a value sequence; returning empty data"
                    );
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(
                    dataset_id = %self.dataset_id,
                    column_id = %self.id,
                    column = %self.name,
                    error = %e,
                    "column decryption failed; returning empty data"
                );
                Vec::new()
            }
        };

        DataColumn {
            id: self.id,
            dataset_id: self.dataset_id,
            name: self.name,
            column_type: self.column_type,
            index: self.index,
            date_format: self.date_format,
            data,
        }
    }
}

impl Reveal for SealedDataset {
    type Plain = Dataset;

    fn reveal(self, crypto: &EnvelopeCrypto) -> Dataset {
        Dataset {
            meta: self.meta,
            columns: self.columns.reveal(crypto),
        }
    }
}

impl<T: Reveal> Reveal for Vec<T> {
    type Plain = Vec<T::Plain>;

    fn reveal(self, crypto: &EnvelopeCrypto) -> Self::Plain {
        self.into_iter().map(|item| item.reveal(crypto)).collect()
    }
}

impl<T: Reveal> Reveal for Option<T> {
    type Plain = Option<T::Plain>;

    fn reveal(self, crypto: &EnvelopeCrypto) -> Self::Plain {
        self.map(|item| item.reveal(crypto))
    }
}

impl<T: Reveal> Reveal for Box<T> {
    type Plain = Box<T::Plain>;

    fn reveal(self, crypto: &EnvelopeCrypto) -> Self::Plain {
        Box::new((*self).reveal(crypto))
    }
}
