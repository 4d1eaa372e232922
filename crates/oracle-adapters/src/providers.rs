use oracle_core::{CompanyRegistry, Coordinates, ImageClassifier, ImageryProvider, ProviderError};
use rand::Rng;

const STATIC_MAP_BASE: &str = "https://static-maps.yandex.ru/1.x/";

/// Free-tier static satellite tile lookup. Builds the tile URL without a network call.
#[derive(Debug, Clone)]
pub struct StaticMapImagery {
    base_url: String,
}

impl StaticMapImagery {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for StaticMapImagery {
    fn default() -> Self {
        Self::new(STATIC_MAP_BASE)
    }
}

impl ImageryProvider for StaticMapImagery {
    fn source(&self) -> &'static str {
        "OpenStreetMap/Yandex"
    }

    fn fetch_image(&self, coordinates: &Coordinates) -> Result<String, ProviderError> {
        if !coordinates.lat.is_finite() || !coordinates.lng.is_finite() {
            return Err(ProviderError::invalid_response(
                self.source(),
                "coordinates are not finite",
            ));
        }
        Ok(format!(
            "{}?lang=en_US&ll={:.6},{:.6}&z=17&l=sat&size=600,450",
            self.base_url, coordinates.lng, coordinates.lat
        ))
    }
}

/// Demo classifier returning a high-confidence score in `[0.85, 0.99)`.
#[derive(Debug, Clone, Default)]
pub struct RandomizedVisionClassifier;

impl ImageClassifier for RandomizedVisionClassifier {
    fn source(&self) -> &'static str {
        "ComputerVision"
    }

    fn classify(&self, _image_ref: &str) -> Result<f64, ProviderError> {
        Ok(rand::thread_rng().gen_range(0.85..0.99))
    }
}

/// Deterministic classifier for tests and reproducible demos.
#[derive(Debug, Clone, Copy)]
pub struct FixedScoreClassifier {
    score: f64,
}

impl FixedScoreClassifier {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl ImageClassifier for FixedScoreClassifier {
    fn source(&self) -> &'static str {
        "ComputerVision"
    }

    fn classify(&self, _image_ref: &str) -> Result<f64, ProviderError> {
        Ok(self.score)
    }
}

/// Company registry stand-in: any non-blank registration id is active.
#[derive(Debug, Clone, Default)]
pub struct MockCompanyRegistry;

impl CompanyRegistry for MockCompanyRegistry {
    fn source(&self) -> &'static str {
        "MCA_Mock"
    }

    fn verify_company(&self, reg_id: &str) -> Result<bool, ProviderError> {
        Ok(!reg_id.trim().is_empty())
    }
}

/// Provider that always errors. Useful for exercising degraded signals.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    name: &'static str,
    reason: String,
}

impl UnavailableProvider {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }

    fn error(&self) -> ProviderError {
        ProviderError::unavailable(self.name, self.reason.clone())
    }
}

impl ImageryProvider for UnavailableProvider {
    fn source(&self) -> &'static str {
        self.name
    }

    fn fetch_image(&self, _coordinates: &Coordinates) -> Result<String, ProviderError> {
        Err(self.error())
    }
}

impl ImageClassifier for UnavailableProvider {
    fn source(&self) -> &'static str {
        self.name
    }

    fn classify(&self, _image_ref: &str) -> Result<f64, ProviderError> {
        Err(self.error())
    }
}

impl CompanyRegistry for UnavailableProvider {
    fn source(&self) -> &'static str {
        self.name
    }

    fn verify_company(&self, _reg_id: &str) -> Result<bool, ProviderError> {
        Err(self.error())
    }
}
