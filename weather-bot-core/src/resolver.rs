use crate::{
    model::{CityCandidate, LocationQuery},
    provider::GeocodingProvider,
};

/// Suggests similarly named places for a location the weather provider did not know.
///
/// The original text is tried first and its romanized form second; the first
/// attempt that yields anything wins and later attempts are never made.
#[derive(Debug)]
pub struct CityResolver {
    geocoder: Box<dyn GeocodingProvider>,
}

impl CityResolver {
    pub fn new(geocoder: Box<dyn GeocodingProvider>) -> Self {
        Self { geocoder }
    }

    pub async fn resolve(&self, query: &LocationQuery) -> Vec<CityCandidate> {
        let attempts = [query.as_str().to_string(), query.transliterated()];

        for (i, attempt) in attempts.iter().enumerate() {
            let candidates = self.geocoder.search(attempt).await;
            if !candidates.is_empty() {
                tracing::debug!(
                    "Attempt {} ({attempt:?}) produced {} candidate(s)",
                    i + 1,
                    candidates.len()
                );
                return candidates;
            }
            tracing::debug!("Attempt {} ({attempt:?}) produced no candidates", i + 1);
        }

        Vec::new()
    }
}
