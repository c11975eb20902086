// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Load a configuration from a number of layered sources.
//!
//! Values are taken from the following, where later sources override
//! earlier ones:
//!  - the `Default` of the configuration type.
//!  - an optional TOML file.
//!  - environment variables starting with a prefix. Nested fields are
//!    separated by `__`, so `AXIS_SWITCH__NUM_INPUTS=4` sets
//!    `switch.num_inputs` for the prefix `AXIS_`.
//!
//! ```rust
//! use axis_config::load_config;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Deserialize, Serialize)]
//! struct Config {
//!     depth: usize,
//! }
//!
//! let config: Config = load_config(None, "DOC_EXAMPLE_").unwrap();
//! assert_eq!(config.depth, 0);
//! ```

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use figment::Error;

/// Separator between the levels of a nested field in an environment
/// variable name.
pub const ENV_SPLIT: &str = "__";

/// Build the [Figment] that [load_config] extracts from.
///
/// # Errors
///
/// If `conf_file` is given but is not an existing file.
pub fn figment_for<T>(conf_file: Option<&Path>, env_prefix: &str) -> Result<Figment, Error>
where
    T: Serialize + Default,
{
    let mut figment = Figment::new().merge(Serialized::defaults(T::default()));

    if let Some(conf_file) = conf_file {
        if conf_file.is_dir() {
            return Err(Error::from(format!(
                "{} is not a file path",
                conf_file.display()
            )));
        }
        if !conf_file.exists() {
            return Err(Error::from(format!("{} not found", conf_file.display())));
        }
        figment = figment.merge(Toml::file(conf_file));
    }

    Ok(figment.merge(Env::prefixed(env_prefix).split(ENV_SPLIT)))
}

/// Load a configuration of type `T`.
///
/// # Errors
///
/// If the configuration file is missing or any source contains a value that
/// does not match `T`.
pub fn load_config<T>(conf_file: Option<&Path>, env_prefix: &str) -> Result<T, Error>
where
    T: Serialize + DeserializeOwned + Default,
{
    figment_for::<T>(conf_file, env_prefix)?.extract()
}
