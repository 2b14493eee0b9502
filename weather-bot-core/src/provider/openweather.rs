use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{LocationKind, LookupOutcome, WeatherReport},
    provider::truncate_body,
};

use super::WeatherProvider;

const PROVIDER: &str = "openweather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Status and body of the current-weather call. Errors carry no URL, since the
    /// query string holds the API key.
    async fn fetch_current(
        &self,
        location: &str,
    ) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location),
                ("lang", "ru"),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = res.status();
        let body = res.text().await.map_err(reqwest::Error::without_url)?;
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

/// Build a report from a success-status body. Every field except the country is required.
pub(crate) fn parse_report(location: &str, body: &str) -> Result<WeatherReport> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse {
            provider: PROVIDER,
            reason: e.to_string(),
        })?;

    let description = parsed
        .weather
        .first()
        .map(|w| sentence_case(&w.description))
        .ok_or_else(|| Error::MalformedResponse {
            provider: PROVIDER,
            reason: "`weather` array is empty".to_string(),
        })?;

    let country = parsed.sys.country.unwrap_or_default();

    Ok(WeatherReport {
        location: location.to_string(),
        kind: LocationKind::classify(location, &country),
        country,
        temperature_c: parsed.main.temp,
        description,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
    })
}

/// Upper-case the first character, leave the rest untouched.
pub(crate) fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn lookup(&self, location: &str) -> Result<LookupOutcome> {
        tracing::debug!("Looking up weather for {location:?}");

        let (status, body) = match self.fetch_current(location).await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!("OpenWeather request for {location:?} failed: {e}");
                return Ok(LookupOutcome::NotFound);
            }
        };

        if !status.is_success() {
            tracing::debug!(
                "OpenWeather returned status {status} for {location:?}: {}",
                truncate_body(&body)
            );
            return Ok(LookupOutcome::NotFound);
        }

        parse_report(location, &body).map(LookupOutcome::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london_body() -> serde_json::Value {
        json!({
            "name": "London",
            "main": {"temp": 15.2, "humidity": 70},
            "weather": [{"description": "clear sky"}],
            "wind": {"speed": 3.1},
            "sys": {"country": "GB"}
        })
    }

    fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new("KEY".into(), server.uri(), Client::new())
    }

    #[test]
    fn sentence_case_changes_only_first_char() {
        assert_eq!(sentence_case("clear sky"), "Clear sky");
        assert_eq!(sentence_case("небольшой дождь"), "Небольшой дождь");
        assert_eq!(sentence_case("overcast CLOUDS"), "Overcast CLOUDS");
        assert_eq!(sentence_case(""), "");
    }

    #[test]
    fn parse_report_maps_all_fields() {
        let report = parse_report("London", &london_body().to_string()).unwrap();

        assert_eq!(report.location, "London");
        assert_eq!(report.country, "GB");
        assert_eq!(report.kind, LocationKind::City);
        assert_eq!(report.temperature_c, 15.2);
        assert_eq!(report.description, "Clear sky");
        assert_eq!(report.humidity_pct, 70);
        assert_eq!(report.wind_speed_mps, 3.1);
    }

    #[test]
    fn missing_country_defaults_to_empty() {
        let mut body = london_body();
        body["sys"] = json!({});
        let report = parse_report("London", &body.to_string()).unwrap();
        assert_eq!(report.country, "");

        body.as_object_mut().unwrap().remove("sys");
        let report = parse_report("London", &body.to_string()).unwrap();
        assert_eq!(report.country, "");
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        for strip in ["main", "weather", "wind"] {
            let mut body = london_body();
            body.as_object_mut().unwrap().remove(strip);
            let err = parse_report("London", &body.to_string()).unwrap_err();
            assert!(
                matches!(err, Error::MalformedResponse { provider: "openweather", .. }),
                "removing {strip} should be malformed"
            );
        }

        let mut body = london_body();
        body["main"] = json!({"temp": 1.0});
        assert!(parse_report("London", &body.to_string()).is_err());

        let mut body = london_body();
        body["weather"] = json!([]);
        let err = parse_report("London", &body.to_string()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn lookup_sends_fixed_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "London"))
            .and(query_param("lang", "ru"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider(&server).lookup("London").await.unwrap();
        let LookupOutcome::Found(report) = outcome else {
            panic!("expected a report, got {outcome:?}");
        };
        assert_eq!(report.description, "Clear sky");
    }

    #[tokio::test]
    async fn non_success_status_is_not_found_regardless_of_body() {
        let server = MockServer::start().await;

        for (status, body) in [
            (404, json!({"cod": "404", "message": "city not found"})),
            (401, london_body()),
            (500, json!("oops")),
        ] {
            server.reset().await;
            Mock::given(method("GET"))
                .and(path("/data/2.5/weather"))
                .respond_with(ResponseTemplate::new(status).set_body_json(body))
                .mount(&server)
                .await;

            let outcome = provider(&server).lookup("Nowhere").await.unwrap();
            assert_eq!(outcome, LookupOutcome::NotFound, "status {status}");
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_not_found() {
        let provider =
            OpenWeatherProvider::new("KEY".into(), "http://127.0.0.1:1".into(), Client::new());
        let outcome = provider.lookup("London").await.unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn transport_errors_do_not_expose_api_key() {
        let provider = OpenWeatherProvider::new(
            "SECRET_KEY".into(),
            "http://127.0.0.1:1".into(),
            Client::new(),
        );

        let err = provider.fetch_current("London").await.unwrap_err();

        assert!(!err.to_string().contains("SECRET_KEY"), "{err}");
        assert!(!format!("{err:?}").contains("SECRET_KEY"), "{err:?}");
        assert!(err.url().is_none());
    }

    #[tokio::test]
    async fn repeated_lookups_are_identical() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let first = provider.lookup("London").await.unwrap();
        let second = provider.lookup("London").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server).lookup("London").await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }
}
