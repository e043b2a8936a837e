//! Ingestor configuration.
//!
//! [`Tools`] is what the helpers read their limits from. Build one in code, or
//! load a [`Config`] from the environment and convert it:
//!
//! ```rust,no_run
//! use carryall::{Config, Tools};
//! use envconfig::Envconfig;
//!
//! let tools: Tools = Config::init_from_env().expect("bad config").into();
//! ```

use std::convert::Infallible;
use std::str::FromStr;

use envconfig::Envconfig;

/// One mebibyte. Default cap for JSON bodies.
pub const MEGABYTE: usize = 1024 * 1024;

/// One gibibyte. Default cap for multipart upload bodies.
pub const GIGABYTE: u64 = 1024 * 1024 * 1024;

/// Limits and allow-lists for the body ingestor.
///
/// Zero limits mean "use the default" ([`MEGABYTE`] for JSON, [`GIGABYTE`] for
/// uploads). The defaults are resolved per call and never written back.
#[derive(Clone, Debug, Default)]
pub struct Tools {
    pub max_json_size: usize,
    pub allow_unknown_fields: bool,
    pub max_file_size: u64,
    /// Accepted upload MIME types. Empty accepts everything.
    pub allowed_file_types: Vec<String>,
}

impl Tools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_json_size(mut self, bytes: usize) -> Self {
        self.max_json_size = bytes;
        self
    }

    pub fn with_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_allowed_file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_file_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn json_limit(&self) -> usize {
        if self.max_json_size == 0 { MEGABYTE } else { self.max_json_size }
    }

    pub(crate) fn upload_limit(&self) -> u64 {
        if self.max_file_size == 0 { GIGABYTE } else { self.max_file_size }
    }
}

/// Environment-backed configuration.
#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "MAX_JSON_SIZE", default = "0")]
    pub max_json_size: usize,

    #[envconfig(from = "ALLOW_UNKNOWN_FIELDS", default = "false")]
    pub allow_unknown_fields: bool,

    #[envconfig(from = "MAX_FILE_SIZE", default = "0")]
    pub max_file_size: u64,

    #[envconfig(from = "ALLOWED_FILE_TYPES", default = "")]
    pub allowed_file_types: MimeList,
}

impl From<Config> for Tools {
    fn from(config: Config) -> Self {
        Self {
            max_json_size: config.max_json_size,
            allow_unknown_fields: config.allow_unknown_fields,
            max_file_size: config.max_file_size,
            allowed_file_types: config.allowed_file_types.0,
        }
    }
}

/// Comma-separated list of MIME types, e.g. `image/jpeg, image/png`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MimeList(pub Vec<String>);

impl FromStr for MimeList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MimeList(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }
}
