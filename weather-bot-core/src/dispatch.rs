use crate::{
    Config,
    error::Result,
    format,
    model::{LocationQuery, LookupOutcome, Reply},
    provider::{WeatherProvider, geocoding_provider_from_config, weather_provider_from_config},
    resolver::CityResolver,
};

/// Turns one incoming message into one reply.
///
/// Holds no per-request state, so a single instance can serve concurrent messages.
#[derive(Debug)]
pub struct Dispatcher {
    weather: Box<dyn WeatherProvider>,
    resolver: CityResolver,
}

impl Dispatcher {
    pub fn new(weather: Box<dyn WeatherProvider>, resolver: CityResolver) -> Self {
        Self { weather, resolver }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let weather = weather_provider_from_config(config)?;
        let geocoder = geocoding_provider_from_config(config)?;
        Ok(Self::new(weather, CityResolver::new(geocoder)))
    }

    pub async fn handle(&self, text: &str) -> Result<Reply> {
        let text = text.trim();

        if text.is_empty() {
            return Ok(Reply::Prompt(format::EMPTY_QUERY.to_string()));
        }
        if is_start_command(text) {
            return Ok(Reply::Greeting(format::GREETING.to_string()));
        }

        let query = LocationQuery::new(text);

        match self.weather.lookup(query.as_str()).await? {
            LookupOutcome::Found(report) => Ok(Reply::Report(format::render_report(&report))),
            LookupOutcome::NotFound => {
                tracing::info!("No weather for \"{query}\", looking for similar cities");

                let candidates = self.resolver.resolve(&query).await;
                if candidates.is_empty() {
                    return Ok(Reply::NoMatches(format::no_matches(query.as_str())));
                }

                Ok(Reply::Suggestions {
                    text: format::suggestions_prompt(query.as_str()),
                    options: candidates.iter().map(|c| c.display_name()).collect(),
                })
            }
        }
    }

    /// Like [`Dispatcher::handle`], but a failed request becomes a generic apology
    /// instead of an error.
    pub async fn handle_or_apologize(&self, text: &str) -> Reply {
        match self.handle(text).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!("Lookup for {:?} failed: {err}", text.trim());
                Reply::Failure(format::GENERIC_FAILURE.to_string())
            }
        }
    }
}

/// `/start`, optionally addressed to a specific bot (`/start@my_bot`).
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}
