// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Coordinator settings, read from JSON. Every field is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Most sessions the registry holds at once. Zero means no limit.
    pub max_sessions: usize,
    /// Seconds without activity after which a running session is abandoned. Zero disables it.
    pub idle_timeout_secs: u64,
    /// Whether `prune` drops finished and abandoned sessions from the registry.
    pub prune_finished: bool,
    /// Seconds a finished or abandoned session stays readable before `prune` may drop it,
    /// counted from its last activity. Zero drops it on the next prune.
    pub finished_retention_secs: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_sessions: 0,
            idle_timeout_secs: 30 * 60,
            prune_finished: true,
            finished_retention_secs: 10 * 60,
        }
    }
}

impl Config {
    pub fn from_reader<R: Read>(reader: R) -> Result<Config, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        Config::from_reader(BufReader::new(file))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_secs))
        }
    }

    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_secs)
    }

    pub fn session_limit(&self) -> Option<usize> {
        if self.max_sessions == 0 {
            None
        } else {
            Some(self.max_sessions)
        }
    }
}
