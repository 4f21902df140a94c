use std::fmt;

use crate::model::WeatherModel;

pub const CITY: &str = "City";
pub const COORDINATES: &str = "Coordinates";
pub const DESCRIPTION: &str = "Description";
pub const TEMPERATURE: &str = "Temperature";
pub const FEELS_LIKE: &str = "Feels Like";

const NOT_AVAILABLE: &str = "N/A";

/// Display strings derived from a [`WeatherModel`], in render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    entries: Vec<(&'static str, String)>,
}

impl Projection {
    pub fn get(&self, label: &str) -> Option<&str> {
        let (_, value) = self.entries.iter().find(|(l, _)| *l == label)?;
        Some(value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(l, v)| (*l, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, label: &'static str, value: String) {
        self.entries.push((label, value));
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.iter() {
            writeln!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}

pub fn project(model: &WeatherModel) -> Projection {
    let mut out = Projection::default();

    let city = model.name.clone().unwrap_or_else(|| "No Name".to_string());
    out.push(CITY, city);

    let coordinates = model
        .coord
        .as_ref()
        .and_then(|c| Some(format!("Latitude: {} Longitude: {}", c.lat?, c.lon?)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    out.push(COORDINATES, coordinates);

    let description = model
        .primary_condition()
        .and_then(|c| c.description.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    out.push(DESCRIPTION, description);

    let main = model.main.as_ref();
    if let Some(temp) = main.and_then(|m| m.temp) {
        out.push(TEMPERATURE, degrees(temp));
    }
    if let Some(feels_like) = main.and_then(|m| m.feels_like) {
        out.push(FEELS_LIKE, degrees(feels_like));
    }

    out
}

fn degrees(value: f64) -> String {
    format!("{value}°")
}
