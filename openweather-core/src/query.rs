use std::fmt;

use reqwest::Url;

use crate::error::WeatherError;

/// Current-weather endpoint of the OpenWeather 2.5 API.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Shape of a location query; selects which segments are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryVariant {
    CityOnly,
    CityAndCountry,
    CityStateAndCountry,
}

impl QueryVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryVariant::CityOnly => "city",
            QueryVariant::CityAndCountry => "city-country",
            QueryVariant::CityStateAndCountry => "city-state-country",
        }
    }

    pub const fn all() -> &'static [QueryVariant] {
        &[
            QueryVariant::CityOnly,
            QueryVariant::CityAndCountry,
            QueryVariant::CityStateAndCountry,
        ]
    }
}

impl fmt::Display for QueryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for QueryVariant {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "city" => Ok(QueryVariant::CityOnly),
            "city-country" => Ok(QueryVariant::CityAndCountry),
            "city-state-country" => Ok(QueryVariant::CityStateAndCountry),
            _ => Err(WeatherError::InvalidQuery(format!(
                "unknown query variant '{value}'; use city, city-country or city-state-country"
            ))),
        }
    }
}

/// A location as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: String,
    pub state_code: Option<String>,
    pub country_code: Option<String>,
}

impl LocationQuery {
    /// Builds a query from raw parts. A state code requires a country code,
    /// since the provider only resolves states within a country.
    pub fn new(
        city: impl Into<String>,
        state_code: Option<String>,
        country_code: Option<String>,
    ) -> Result<Self, WeatherError> {
        let state_code = state_code.filter(|s| !s.trim().is_empty());
        let country_code = country_code.filter(|s| !s.trim().is_empty());

        if state_code.is_some() && country_code.is_none() {
            return Err(WeatherError::InvalidQuery(
                "a state code requires a country code".to_string(),
            ));
        }

        Ok(Self {
            city: city.into(),
            state_code,
            country_code,
        })
    }

    pub fn city(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state_code: None,
            country_code: None,
        }
    }

    pub fn city_country(city: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state_code: None,
            country_code: Some(country_code.into()),
        }
    }

    pub fn city_state_country(
        city: impl Into<String>,
        state_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            state_code: Some(state_code.into()),
            country_code: Some(country_code.into()),
        }
    }

    /// Narrowest variant that uses every populated segment.
    pub fn variant(&self) -> QueryVariant {
        match (present(&self.state_code), present(&self.country_code)) {
            (Some(_), Some(_)) => QueryVariant::CityStateAndCountry,
            (None, Some(_)) => QueryVariant::CityAndCountry,
            _ => QueryVariant::CityOnly,
        }
    }

    /// Comma-joined `q` value for `variant`, or an error naming the missing segment.
    pub fn segments(&self, variant: QueryVariant) -> Result<String, WeatherError> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(missing("city", variant));
        }
        let city = city.to_string();

        let parts = match variant {
            QueryVariant::CityOnly => vec![city],
            QueryVariant::CityAndCountry => {
                let country = present(&self.country_code)
                    .ok_or_else(|| missing("country code", variant))?;
                vec![city, country.to_string()]
            }
            QueryVariant::CityStateAndCountry => {
                let state = present(&self.state_code)
                    .ok_or_else(|| missing("state code", variant))?;
                let country = present(&self.country_code)
                    .ok_or_else(|| missing("country code", variant))?;
                vec![city, state.to_string(), country.to_string()]
            }
        };

        Ok(parts.join(","))
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segments(self.variant()) {
            Ok(q) => f.write_str(&q),
            Err(_) => f.write_str(&self.city),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn missing(segment: &str, variant: QueryVariant) -> WeatherError {
    WeatherError::InvalidQuery(format!("{segment} is required for a '{variant}' query"))
}

/// Turns a [`LocationQuery`] into a request URL. The API key is injected here
/// and never baked into the binary.
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    base_url: String,
    api_key: String,
}

impl EndpointBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn build(
        &self,
        variant: QueryVariant,
        query: &LocationQuery,
    ) -> Result<Url, WeatherError> {
        let q = query.segments(variant)?;
        let params = [("q", q.as_str()), ("appid", self.api_key.as_str())];

        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| WeatherError::InvalidQuery(format!("invalid base URL: {e}")))
    }
}
