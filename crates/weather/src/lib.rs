//! Weather and clothing tools for the Penman runtime.
//!
//! A second capability surface: the model looks up the current
//! temperature for a location and maps the weather to clothing advice,
//! chaining the two lookups across rounds.

use runtime::{ToolCall, ToolError, ToolHost, ToolSpec, decode_arguments};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const GET_WEATHER: &str = "get_weather";
pub const GET_CLOTHING: &str = "get_clothing";

/// System instruction for the clothing assistant.
pub const SYSTEM_INSTRUCTION: &str = "You help people dress for the weather. \
Look up the current temperature with get_weather, classify it as hot, warm, chilly, cold or \
freezing, ask get_clothing for a suggestion and answer in one or two sentences.";

/// Weather conditions understood by `get_clothing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Warm,
    Chilly,
    Cold,
    Freezing,
    Hot,
}

impl Condition {
    pub fn clothing(self) -> &'static str {
        match self {
            Self::Warm => "T-shirt and shorts",
            Self::Chilly => "Sweater and jeans",
            Self::Cold => "Heavy coat and gloves",
            Self::Freezing => "Thermal underwear and a parka",
            Self::Hot => "Tank top and shorts",
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ClothingArgs {
    weather_condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
}

/// Tool host backed by the Open-Meteo forecast API.
pub struct WeatherTools {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    specs: Vec<ToolSpec>,
}

impl Default for WeatherTools {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherTools {
    pub fn new() -> Self {
        Self::with_base_url(OPEN_METEO_URL)
    }

    /// Use a different forecast service root, e.g. a local mirror.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: REQUEST_TIMEOUT,
            specs: weather_specs(),
        }
    }

    /// Limit for a whole forecast request, connect to last byte.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current temperature in °C at the given coordinates.
    pub async fn current_temperature(&self, latitude: f64, longitude: f64) -> Result<f64, ToolError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,wind_speed_10m".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("weather lookup: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ToolError::Execution(format!("weather lookup: {status}")));
        }

        let forecast: Forecast = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("weather response: {e}")))?;
        Ok(forecast.current.temperature_2m)
    }
}

impl ToolHost for WeatherTools {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&mut self, call: &ToolCall) -> Result<String, ToolError> {
        debug!(name = %call.name, arguments = %call.arguments, "weather tool call");
        match call.name.as_str() {
            GET_WEATHER => {
                let args: WeatherArgs = decode_arguments(&call.arguments)?;
                let temperature = self.current_temperature(args.latitude, args.longitude).await?;
                Ok(temperature.to_string())
            }
            GET_CLOTHING => {
                let args: ClothingArgs = decode_arguments(&call.arguments)?;
                Ok(args.weather_condition.clothing().to_string())
            }
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

/// Declarations of the weather functions.
pub fn weather_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            GET_WEATHER,
            "Get the current temperature in degrees Celsius for a location.",
            json!({
                "type": "object",
                "properties": {
                    "latitude": {"type": "number"},
                    "longitude": {"type": "number"}
                },
                "required": ["latitude", "longitude"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            GET_CLOTHING,
            "Get the appropriate clothing for a weather condition.",
            json!({
                "type": "object",
                "properties": {
                    "weather_condition": {
                        "type": "string",
                        "enum": ["warm", "chilly", "cold", "freezing", "hot"],
                        "description": "The weather condition to get clothing for."
                    }
                },
                "required": ["weather_condition"],
                "additionalProperties": false
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall::new("call_1", name, arguments)
    }

    #[tokio::test]
    async fn clothing_for_condition() {
        let mut tools = WeatherTools::new();
        let out = tools
            .execute(&call(GET_CLOTHING, r#"{"weather_condition":"freezing"}"#))
            .await
            .unwrap();
        assert_eq!(out, "Thermal underwear and a parka");
    }

    #[tokio::test]
    async fn unknown_condition_is_invalid_arguments() {
        let mut tools = WeatherTools::new();
        let err = tools
            .execute(&call(GET_CLOTHING, r#"{"weather_condition":"balmy"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn weather_reads_current_temperature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("latitude".into(), "47.4979".into()),
                Matcher::UrlEncoded("longitude".into(), "19.0402".into()),
                Matcher::UrlEncoded("current".into(), "temperature_2m,wind_speed_10m".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"current": {"time": "2024-11-02T10:00", "temperature_2m": 7.5, "wind_speed_10m": 3.1}}"#)
            .create_async()
            .await;

        let mut tools = WeatherTools::with_base_url(server.url());
        let out = tools
            .execute(&call(GET_WEATHER, r#"{"latitude":47.4979,"longitude":19.0402}"#))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out, "7.5");
    }

    #[tokio::test]
    async fn weather_service_failure_is_execution_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let mut tools = WeatherTools::with_base_url(server.url());
        let err = tools
            .execute(&call(GET_WEATHER, r#"{"latitude":0,"longitude":0}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }

    #[tokio::test]
    async fn stalled_weather_service_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without answering.
            let _socket = listener.accept().await;
            std::future::pending::<()>().await;
        });

        let mut tools =
            WeatherTools::with_base_url(format!("http://{addr}")).with_timeout(Duration::from_millis(200));
        let err = tokio::time::timeout(
            Duration::from_secs(5),
            tools.execute(&call(GET_WEATHER, r#"{"latitude":0,"longitude":0}"#)),
        )
        .await
        .expect("request should give up on its own")
        .unwrap_err();

        assert!(matches!(err, ToolError::Execution(_)));
    }

    #[test]
    fn specs_declare_both_functions() {
        let names: Vec<_> = weather_specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![GET_WEATHER, GET_CLOTHING]);
    }
}
