use crate::error::ProviderError;
use crate::types::Coordinates;

/// Imagery lookup for a site. Returns a reference (URL or handle) to the image.
pub trait ImageryProvider: Send + Sync {
    fn source(&self) -> &'static str;

    fn fetch_image(&self, coordinates: &Coordinates) -> Result<String, ProviderError>;
}

/// Classifies fetched imagery. Returns structure confidence in `[0, 1]`.
pub trait ImageClassifier: Send + Sync {
    fn source(&self) -> &'static str;

    fn classify(&self, image_ref: &str) -> Result<f64, ProviderError>;
}

/// Legal-entity registry lookup. `Ok(true)` means the entity is registered and active.
pub trait CompanyRegistry: Send + Sync {
    fn source(&self) -> &'static str;

    fn verify_company(&self, reg_id: &str) -> Result<bool, ProviderError>;
}
