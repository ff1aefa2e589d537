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

//! Messages for a host process embedding the map window.

use std::io::{self, Write};

use serde::Serialize;

/// Sent once on startup so the host can size its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HostMessage {
    #[serde(rename = "heightRequest")]
    pub height_request: f32,
}

impl HostMessage {
    /// Write the message as a single JSON line.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Announce the window's outer height on stdout.
pub fn announce_height(height: f32) -> io::Result<()> {
    HostMessage {
        height_request: height,
    }
    .write_to(io::stdout().lock())
}
