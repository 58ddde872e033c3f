//! Primary-key generation for vote rows.

use serde::Deserialize;
use ulid::Ulid;
use uuid::Uuid;

/// Backing format for generated vote primary keys.
///
/// The engine treats the key as an opaque string, so the format is pure
/// storage policy, selected in configuration. Both variants are
/// time-ordered and safe for pagination by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdFormat {
    /// 26-character lowercase ULID.
    #[default]
    Ulid,
    /// Hyphenated UUID version 7.
    Uuidv7,
}

/// Generates vote primary keys in the configured format.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    format: IdFormat,
}

impl IdGenerator {
    /// Create a generator producing keys in `format`.
    #[must_use]
    pub const fn new(format: IdFormat) -> Self {
        Self { format }
    }

    /// The configured format.
    #[must_use]
    pub const fn format(&self) -> IdFormat {
        self.format
    }

    /// Generate a fresh key.
    #[must_use]
    pub fn generate(&self) -> String {
        match self.format {
            IdFormat::Ulid => Ulid::new().to_string().to_lowercase(),
            IdFormat::Uuidv7 => Uuid::now_v7().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_ulid() {
        let id_gen = IdGenerator::default();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id_gen.format(), IdFormat::Ulid);
        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_uuidv7_format() {
        let id = IdGenerator::new(IdFormat::Uuidv7).generate();

        assert_eq!(id.len(), 36);
        // Version nibble is fixed at 7.
        assert_eq!(id.as_bytes()[14], b'7');
    }

    #[test]
    fn test_format_deserializes_from_config_labels() {
        assert_eq!(
            serde_json::from_str::<IdFormat>("\"ulid\"").ok(),
            Some(IdFormat::Ulid)
        );
        assert_eq!(
            serde_json::from_str::<IdFormat>("\"uuidv7\"").ok(),
            Some(IdFormat::Uuidv7)
        );
    }
}
