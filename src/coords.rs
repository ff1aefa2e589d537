// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Coordinate input parsing and deep links.

use thiserror::Error;
use url::Url;
use wfs_client::LonLat;

/// Errors from coordinate text, arguments or links.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("enter coordinates as \"lat, lng\"")]
    Empty,

    #[error("missing longitude, enter coordinates as \"lat, lng\"")]
    MissingLongitude,

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("invalid link: {0}")]
    InvalidLink(#[from] url::ParseError),
}

/// Parse `"lat, lng"` text. Only the first two comma-separated tokens count.
pub fn parse_lat_lng(text: &str) -> Result<LonLat, CoordinateError> {
    if text.trim().is_empty() {
        return Err(CoordinateError::Empty);
    }

    let mut tokens = text.split(',').map(str::trim);
    let lat = tokens.next().ok_or(CoordinateError::Empty)?;
    let lng = tokens.next().ok_or(CoordinateError::MissingLongitude)?;

    validate(parse_number("latitude", lat)?, parse_number("longitude", lng)?)
}

/// Check a latitude/longitude pair is finite and in range.
pub fn validate(lat: f64, lng: f64) -> Result<LonLat, CoordinateError> {
    check_range("latitude", lat, 90.0)?;
    check_range("longitude", lng, 180.0)?;
    Ok(LonLat::new(lng, lat))
}

/// Read `lat` and `lng` from a link's query string.
///
/// Returns `Ok(None)` when either parameter is absent.
pub fn parse_deep_link(link: &str) -> Result<Option<LonLat>, CoordinateError> {
    let url = Url::parse(link)?;

    let mut lat = None;
    let mut lng = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "lat" => lat = Some(value.into_owned()),
            "lng" => lng = Some(value.into_owned()),
            _ => {}
        }
    }

    match (lat, lng) {
        (Some(lat), Some(lng)) => validate(
            parse_number("latitude", &lat)?,
            parse_number("longitude", &lng)?,
        )
        .map(Some),
        _ => Ok(None),
    }
}

fn parse_number(field: &'static str, token: &str) -> Result<f64, CoordinateError> {
    match token.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CoordinateError::InvalidNumber {
            field,
            value: token.to_string(),
        }),
    }
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), CoordinateError> {
    if !value.is_finite() {
        return Err(CoordinateError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    if value.abs() > limit {
        return Err(CoordinateError::OutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lat_lng() {
        assert_eq!(parse_lat_lng("54.9, -3.4"), Ok(LonLat::new(-3.4, 54.9)));
        assert_eq!(parse_lat_lng("  51.5,-0.12  "), Ok(LonLat::new(-0.12, 51.5)));
    }

    #[test]
    fn test_extra_tokens_are_ignored() {
        assert_eq!(parse_lat_lng("54.9, -3.4, 100"), Ok(LonLat::new(-3.4, 54.9)));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(parse_lat_lng(""), Err(CoordinateError::Empty));
        assert_eq!(parse_lat_lng("   "), Err(CoordinateError::Empty));
        assert_eq!(parse_lat_lng("54.9"), Err(CoordinateError::MissingLongitude));
        assert_eq!(
            parse_lat_lng("north, -3.4"),
            Err(CoordinateError::InvalidNumber {
                field: "latitude",
                value: "north".to_string()
            })
        );
        assert_eq!(
            parse_lat_lng("54.9, "),
            Err(CoordinateError::InvalidNumber {
                field: "longitude",
                value: String::new()
            })
        );
        assert!(matches!(
            parse_lat_lng("NaN, 1"),
            Err(CoordinateError::InvalidNumber { field: "latitude", .. })
        ));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            parse_lat_lng("91, 0"),
            Err(CoordinateError::OutOfRange {
                field: "latitude",
                value: 91.0
            })
        );
        assert_eq!(
            parse_lat_lng("0, -180.5"),
            Err(CoordinateError::OutOfRange {
                field: "longitude",
                value: -180.5
            })
        );
        assert!(parse_lat_lng("-90, 180").is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CoordinateError::MissingLongitude.to_string(),
            "missing longitude, enter coordinates as \"lat, lng\""
        );
        assert_eq!(
            CoordinateError::OutOfRange {
                field: "latitude",
                value: 91.0
            }
            .to_string(),
            "latitude 91 is out of range"
        );
    }

    #[test]
    fn test_deep_link() {
        let pos = parse_deep_link("https://epds.example.org/map/?lat=54.9&lng=-3.4").unwrap();
        assert_eq!(pos, Some(LonLat::new(-3.4, 54.9)));
    }

    #[test]
    fn test_deep_link_missing_parameter() {
        assert_eq!(parse_deep_link("https://epds.example.org/map/?lat=54.9"), Ok(None));
        assert_eq!(parse_deep_link("https://epds.example.org/map/"), Ok(None));
    }

    #[test]
    fn test_deep_link_errors() {
        assert!(matches!(
            parse_deep_link("not a link"),
            Err(CoordinateError::InvalidLink(_))
        ));
        assert!(matches!(
            parse_deep_link("https://x.org/?lat=abc&lng=1"),
            Err(CoordinateError::InvalidNumber { field: "latitude", .. })
        ));
    }
}
