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

//! WFS client library for the EPDS environmental planning layers.
//!
//! This library knows how to ask a GeoServer WFS endpoint for the EPDS
//! feature layers and how to make sense of the answer. It has no GUI
//! dependency and is organised in layers that can be used on their own:
//!
//! - **Extent layer**: Web Mercator projection and query bounding boxes
//! - **Layer catalogue**: named layers, display modes and hover descriptions
//! - **Protocol layer**: GetFeature URL building, GeoJSON decoding and
//!   screen-space hit testing
//! - **Loader layer**: cancellable async fetches tagged with a generation
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use wfs_client::{Extent, LayerLoader, LayerName, LoadEvent, LoadRequest, LoaderConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut loader = LayerLoader::new(LoaderConfig::default(), tokio::runtime::Handle::current())
//!         .expect("HTTP client");
//!
//!     loader.request(LoadRequest {
//!         layer: LayerName::Sssi,
//!         extent: Extent::new(-420_000.0, 7_280_000.0, -340_000.0, 7_340_000.0),
//!         generation: 1,
//!     });
//!
//!     match loader.recv().await {
//!         Some(LoadEvent::Loaded { features, .. }) => println!("{} features", features.len()),
//!         Some(LoadEvent::Failed { error, .. }) => eprintln!("load failed: {error}"),
//!         None => {}
//!     }
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//! }
//! ```
//!
//! ## Protocol Layer Only
//!
//! ```
//! use wfs_client::{Extent, LayerName, WfsEndpoint};
//!
//! let endpoint = WfsEndpoint::default();
//! let url = endpoint.get_feature_url(LayerName::Tpo, &Extent::new(0.0, 0.0, 10.0, 10.0));
//! assert!(url.contains("typename=EPDS:trees_near_rspb_reserves"));
//! ```

pub mod extent;
pub mod layers;
pub mod loader;
pub mod protocol;

pub use extent::{Extent, LonLat};
pub use layers::{DisplayMode, LayerName, UnknownName};
pub use loader::{LayerLoader, LoadEvent, LoadRequest, LoaderConfig};
pub use protocol::{
    decode_feature_collection, Feature, Geometry, HitTest, HitTolerance, WfsEndpoint, WfsError,
};
