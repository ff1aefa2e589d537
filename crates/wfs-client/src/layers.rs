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

//! Layer catalogue and display modes.
//!
//! Each [`LayerName`] maps to one WFS feature type published by the EPDS
//! workspace. A [`DisplayMode`] groups the layers that are loaded together.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Placeholder for missing attribute values in descriptions.
const UNKNOWN_VALUE: &str = "unknown";

/// Returned when parsing a layer or mode from an unrecognised name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

/// A named remote data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerName {
    /// RSPB nature reserves (polygons).
    Reserves,
    /// Tree protection orders near reserves (points).
    Tpo,
    /// Solar farm planning applications inside SSSIs (points).
    Solr,
    /// Sites of Special Scientific Interest (polygons).
    Sssi,
}

impl LayerName {
    pub const ALL: [Self; 4] = [Self::Reserves, Self::Tpo, Self::Solr, Self::Sssi];

    /// Stable short name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reserves => "reserves",
            Self::Tpo => "tpo",
            Self::Solr => "solr",
            Self::Sssi => "sssi",
        }
    }

    /// Feature type name inside the WFS workspace.
    #[must_use]
    pub fn feature_type(self) -> &'static str {
        match self {
            Self::Reserves => "rspb_reserves",
            Self::Tpo => "trees_near_rspb_reserves",
            Self::Solr => "Solr_in_SSSI",
            Self::Sssi => "all_sssi",
        }
    }

    /// Human-readable name used as a table heading.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Reserves => "RSPB Reserves",
            Self::Tpo => "Tree Protection Orders",
            Self::Solr => "Solar Farm Application",
            Self::Sssi => "SSSI Locations",
        }
    }

    /// One-line hover description of a feature from this layer.
    #[must_use]
    pub fn describe(self, properties: &Map<String, Value>) -> String {
        match self {
            Self::Reserves => format!("RSPB Reserve: {}", attribute_text(properties, "name")),
            Self::Tpo => format!(
                "Tree protection order: {}",
                attribute_text(properties, "description")
            ),
            Self::Solr => format!(
                "Solar farm application: {}",
                attribute_text(properties, "description")
            ),
            Self::Sssi => format!(
                "Site of Special Scientific Interest: {}",
                capitalise_first(&attribute_text(properties, "country"))
            ),
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerName {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| UnknownName {
                kind: "layer",
                value: s.to_string(),
            })
    }
}

/// Which group of layers is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    TreesReserves,
    SolrSssi,
    AllData,
}

impl DisplayMode {
    pub const ALL: [Self; 3] = [Self::TreesReserves, Self::SolrSssi, Self::AllData];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TreesReserves => "trees_reserves",
            Self::SolrSssi => "solr_sssi",
            Self::AllData => "all_data",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::TreesReserves => "Tree orders & reserves",
            Self::SolrSssi => "Solar farms & SSSIs",
            Self::AllData => "All data",
        }
    }

    /// Layers of this mode in draw order (bottom first).
    #[must_use]
    pub fn layers(self) -> &'static [LayerName] {
        match self {
            Self::TreesReserves => &[LayerName::Reserves, LayerName::Tpo],
            Self::SolrSssi => &[LayerName::Solr, LayerName::Sssi],
            Self::AllData => &[
                LayerName::Sssi,
                LayerName::Reserves,
                LayerName::Solr,
                LayerName::Tpo,
            ],
        }
    }

    #[must_use]
    pub fn contains(self, layer: LayerName) -> bool {
        self.layers().contains(&layer)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownName {
                kind: "display mode",
                value: s.to_string(),
            })
    }
}

/// Text for a single attribute: strings verbatim, null or missing as
/// `unknown`, anything else as JSON.
#[must_use]
pub fn attribute_text(properties: &Map<String, Value>, key: &str) -> String {
    match properties.get(key) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => UNKNOWN_VALUE.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Upper-case the first character, leaving the rest untouched.
#[must_use]
pub fn capitalise_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
