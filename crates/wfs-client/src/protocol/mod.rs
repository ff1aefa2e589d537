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

//! Protocol layer for WFS GetFeature requests.
//!
//! Builds the fixed-layout GetFeature URL for a layer and extent, and decodes
//! the GeoJSON `FeatureCollection` the server answers with.

mod feature;

pub use feature::{decode_feature_collection, Feature, Geometry, HitTest, HitTolerance};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extent::{Extent, EPSG_3857};
use crate::layers::LayerName;

/// WFS protocol version sent with every request.
pub const WFS_VERSION: &str = "1.1.0";

/// CRS the features are returned in.
pub const SOURCE_SRS: &str = "EPSG:4326";

/// Requested output format.
pub const OUTPUT_FORMAT: &str = "application/json";

/// Errors that can occur while fetching or decoding features.
#[derive(Debug, Error)]
pub enum WfsError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("expected a FeatureCollection, got a {0}")]
    NotAFeatureCollection(&'static str),

    #[error("request cancelled")]
    Cancelled,
}

/// Location of the WFS service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WfsEndpoint {
    /// URL scheme, normally `http`.
    pub scheme: String,
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Service path on the host.
    pub path: String,
    /// Workspace prefix for feature type names.
    pub workspace: String,
}

impl Default for WfsEndpoint {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            path: "/geoserver/wfs".to_string(),
            workspace: "EPDS".to_string(),
        }
    }
}

impl WfsEndpoint {
    /// Service URL without a query string.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }

    /// Fully qualified type name, e.g. `EPDS:all_sssi`.
    #[must_use]
    pub fn type_name(&self, layer: LayerName) -> String {
        format!("{}:{}", self.workspace, layer.feature_type())
    }

    /// GetFeature URL for one layer scoped to `extent`.
    ///
    /// Only the type name and bounding box vary between requests.
    #[must_use]
    pub fn get_feature_url(&self, layer: LayerName, extent: &Extent) -> String {
        format!(
            "{}?version={WFS_VERSION}&request=GetFeature&srsname={SOURCE_SRS}&typename={}&outputFormat={OUTPUT_FORMAT}&bbox={}",
            self.base_url(),
            self.type_name(layer),
            extent.to_bbox_param(EPSG_3857),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = WfsEndpoint::default();
        assert_eq!(endpoint.base_url(), "http://localhost:8080/geoserver/wfs");
        assert_eq!(endpoint.type_name(LayerName::Sssi), "EPDS:all_sssi");
    }

    #[test]
    fn test_get_feature_url_layout() {
        let endpoint = WfsEndpoint {
            host: "10.0.0.7".to_string(),
            ..Default::default()
        };
        let extent = Extent::new(-400_000.0, 7_200_000.0, -350_000.0, 7_250_000.5);

        let url = endpoint.get_feature_url(LayerName::Solr, &extent);
        assert_eq!(
            url,
            "http://10.0.0.7:8080/geoserver/wfs?version=1.1.0&request=GetFeature&srsname=EPSG:4326\
             &typename=EPDS:Solr_in_SSSI&outputFormat=application/json\
             &bbox=-400000,7200000,-350000,7250000.5,EPSG:3857"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = WfsError::Status {
            status: 503,
            url: "http://x/wfs".to_string(),
        };
        assert_eq!(err.to_string(), "server returned HTTP 503 for http://x/wfs");
        assert_eq!(
            WfsError::NotAFeatureCollection("Geometry").to_string(),
            "expected a FeatureCollection, got a Geometry"
        );
    }
}
