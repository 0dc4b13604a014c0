// Grading service - per-guild grade formats and the encode/decode entry points.
//
// NO Discord dependencies here - guilds are plain u64 ids.

use super::grading_models::{Grade, GradeError, GradeFormat};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum FormatStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GradingError {
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error("Store error: {0}")]
    Store(#[from] FormatStoreError),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Where each guild's grade format lives.
#[async_trait]
pub trait GradeFormatStore: Send + Sync {
    /// `None` when the guild never customised its format.
    async fn get_format(&self, guild_id: u64) -> Result<Option<GradeFormat>, FormatStoreError>;

    async fn save_format(&self, guild_id: u64, format: GradeFormat)
        -> Result<(), FormatStoreError>;

    /// Returns whether a stored format was removed.
    async fn delete_format(&self, guild_id: u64) -> Result<bool, FormatStoreError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct GradingService<S: GradeFormatStore> {
    store: S,
}

impl<S: GradeFormatStore> GradingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The guild's format, falling back to the defaults.
    pub async fn format_for(&self, guild_id: u64) -> Result<GradeFormat, GradingError> {
        Ok(self.store.get_format(guild_id).await?.unwrap_or_default())
    }

    /// Validate and store a new format for a guild.
    pub async fn set_format(&self, guild_id: u64, format: GradeFormat) -> Result<(), GradingError> {
        format.validate()?;
        self.store.save_format(guild_id, format).await?;
        tracing::info!(guild_id, "Grade format updated");
        Ok(())
    }

    /// Drop a guild's custom format. Returns false if it had none.
    pub async fn reset_format(&self, guild_id: u64) -> Result<bool, GradingError> {
        Ok(self.store.delete_format(guild_id).await?)
    }

    /// Strictly convert a number and render it with the guild's format.
    pub async fn render(&self, guild_id: u64, value: f64) -> Result<(Grade, String), GradingError> {
        let format = self.format_for(guild_id).await?;
        let grade = Grade::try_from_number(value, format.scale_limit)?;
        let text = format.encode(&grade);
        Ok((grade, text))
    }

    /// Decode text with the guild's format.
    pub async fn parse(&self, guild_id: u64, text: &str) -> Result<Grade, GradingError> {
        let format = self.format_for(guild_id).await?;
        Ok(format.decode(text)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    /// In-memory store for testing
    struct MockFormatStore {
        formats: DashMap<u64, GradeFormat>,
    }

    impl MockFormatStore {
        fn new() -> Self {
            Self {
                formats: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl GradeFormatStore for MockFormatStore {
        async fn get_format(&self, guild_id: u64) -> Result<Option<GradeFormat>, FormatStoreError> {
            Ok(self.formats.get(&guild_id).map(|f| f.clone()))
        }

        async fn save_format(
            &self,
            guild_id: u64,
            format: GradeFormat,
        ) -> Result<(), FormatStoreError> {
            self.formats.insert(guild_id, format);
            Ok(())
        }

        async fn delete_format(&self, guild_id: u64) -> Result<bool, FormatStoreError> {
            Ok(self.formats.remove(&guild_id).is_some())
        }
    }

    #[tokio::test]
    async fn test_unknown_guild_uses_defaults() {
        let service = GradingService::new(MockFormatStore::new());
        assert_eq!(service.format_for(1).await.unwrap(), GradeFormat::default());
    }

    #[tokio::test]
    async fn test_set_format_is_per_guild() {
        let service = GradingService::new(MockFormatStore::new());
        let letters = GradeFormat {
            use_letters: true,
            ..Default::default()
        };
        service.set_format(1, letters.clone()).await.unwrap();

        assert_eq!(service.format_for(1).await.unwrap(), letters);
        assert_eq!(service.format_for(2).await.unwrap(), GradeFormat::default());

        let (_, text) = service.render(1, 6.0).await.unwrap();
        assert_eq!(text, "A");
        let (_, text) = service.render(2, 6.0).await.unwrap();
        assert_eq!(text, "6");
    }

    #[tokio::test]
    async fn test_set_format_rejects_invalid() {
        let service = GradingService::new(MockFormatStore::new());
        let bad = GradeFormat {
            scale_limit: 0,
            ..Default::default()
        };
        let err = service.set_format(1, bad).await.unwrap_err();
        assert!(matches!(
            err,
            GradingError::Grade(GradeError::InvalidFormat(_))
        ));
        assert_eq!(service.format_for(1).await.unwrap(), GradeFormat::default());
    }

    #[tokio::test]
    async fn test_render_is_strict() {
        let service = GradingService::new(MockFormatStore::new());
        let err = service.render(1, 11.0).await.unwrap_err();
        assert!(matches!(
            err,
            GradingError::Grade(GradeError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_parse_and_reset() {
        let service = GradingService::new(MockFormatStore::new());
        let custom = GradeFormat {
            special_label: "EX".to_string(),
            ..Default::default()
        };
        service.set_format(1, custom).await.unwrap();
        assert!(service.parse(1, "EX").await.unwrap().is_special());

        assert!(service.reset_format(1).await.unwrap());
        assert!(!service.reset_format(1).await.unwrap());
        assert!(service.parse(1, "EX").await.is_err());
        assert!(service.parse(1, "Sp").await.unwrap().is_special());
    }
}
