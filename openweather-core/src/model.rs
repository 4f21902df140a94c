//! Decoded current-weather response.
//!
//! Every field is optional: the provider omits fields freely, so absence is
//! data, not an error. Unknown fields (e.g. `sys.type`) are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherModel {
    pub coord: Option<Coord>,
    pub weather: Option<Vec<Condition>>,
    pub base: Option<String>,
    pub main: Option<MainMeasurements>,
    pub visibility: Option<i64>,
    pub wind: Option<Wind>,
    pub clouds: Option<Clouds>,
    pub dt: Option<i64>,
    pub sys: Option<Sys>,
    pub timezone: Option<i64>,
    pub id: Option<i64>,
    pub name: Option<String>,
    pub cod: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coord {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

/// One weather-condition entry. The provider may return several.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainMeasurements {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<i64>,
    pub humidity: Option<i64>,
    pub sea_level: Option<i64>,
    pub grnd_level: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wind {
    pub speed: Option<f64>,
    pub deg: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clouds {
    pub all: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub cod: Option<i64>,
}

impl WeatherModel {
    pub fn from_json(body: &str) -> Result<Self, WeatherError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, WeatherError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// First condition entry, if any.
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.as_ref().and_then(|w| w.first())
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(unix_to_utc)
    }

    pub fn sunrise_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sys.as_ref()?.sunrise?)
    }

    pub fn sunset_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sys.as_ref()?.sunset?)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
