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

//! System status and diagnostics.
//!
//! Tracks the feature server in use, load totals and a rolling log of
//! user-visible diagnostic messages.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Number of diagnostic messages kept
const MAX_DIAGNOSTICS: usize = 50;

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Status shown in the status pane
#[derive(Debug)]
pub struct SystemStatus {
    /// WFS base URL
    pub server_url: String,

    /// Where the server host came from (CLI, environment, config or default)
    pub host_source: &'static str,

    /// Config file location, if known
    pub config_path: Option<String>,

    /// Successful layer loads since startup
    pub layers_loaded: u64,

    /// Failed layer loads since startup
    pub layers_failed: u64,

    /// Features held by the most recent successful load
    pub last_feature_count: usize,

    /// When the last load finished
    pub last_load_at: Option<DateTime<Utc>>,

    // Diagnostic messages (keep last 50)
    pub diagnostics: VecDeque<DiagnosticMessage>,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new(String::new(), "default")
    }
}

impl SystemStatus {
    #[must_use]
    pub fn new(server_url: String, host_source: &'static str) -> Self {
        Self {
            server_url,
            host_source,
            config_path: None,
            layers_loaded: 0,
            layers_failed: 0,
            last_feature_count: 0,
            last_load_at: None,
            diagnostics: VecDeque::with_capacity(MAX_DIAGNOSTICS),
        }
    }

    /// Record a successful layer load
    pub fn record_load(&mut self, layer: &str, count: usize) {
        self.layers_loaded += 1;
        self.last_feature_count = count;
        self.last_load_at = Some(Utc::now());
        self.add_diagnostic(DiagnosticLevel::Info, format!("{layer}: {count} features"));
    }

    /// Record a failed layer load
    pub fn record_failure(&mut self, layer: &str, error: &str) {
        self.layers_failed += 1;
        self.last_load_at = Some(Utc::now());
        self.add_diagnostic(DiagnosticLevel::Error, format!("{layer}: {error}"));
    }

    /// Add a diagnostic message
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        self.diagnostics.push_back(DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        });

        // Keep only the last N messages
        while self.diagnostics.len() > MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_are_capped() {
        let mut status = SystemStatus::default();
        for i in 0..60 {
            status.add_diagnostic(DiagnosticLevel::Info, format!("message {i}"));
        }
        assert_eq!(status.diagnostics.len(), MAX_DIAGNOSTICS);
        assert_eq!(status.diagnostics.front().map(|d| d.message.as_str()), Some("message 10"));
        assert_eq!(status.diagnostics.back().map(|d| d.message.as_str()), Some("message 59"));
    }

    #[test]
    fn test_load_counters() {
        let mut status = SystemStatus::new("http://localhost:8080/geoserver/wfs".to_string(), "default");
        status.record_load("sssi", 12);
        status.record_failure("tpo", "server returned HTTP 500");

        assert_eq!(status.layers_loaded, 1);
        assert_eq!(status.layers_failed, 1);
        assert_eq!(status.last_feature_count, 12);
        assert!(status.last_load_at.is_some());

        let latest = status.diagnostics.back().unwrap();
        assert_eq!(latest.level, DiagnosticLevel::Error);
        assert_eq!(latest.message, "tpo: server returned HTTP 500");
    }
}
