use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use engine::options::parse_assignments;
use engine::{Format, OptionError, Options};
use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "mdt.toml";

/// Contents of a config file. Conversion options sit at the top level:
///
/// ```toml
/// format = "latex"
/// template = "paper.tex.tpl"
///
/// [numbering]
/// depth_limit = 2
///
/// [render]
/// link_filetypes = "true"
///
/// [substitutions]
/// author = "A. U. Thor"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub options: Options,
    pub template: Option<PathBuf>,
    /// Extra template variables.
    pub substitutions: BTreeMap<String, String>,
}

impl Config {
    /// Conversion options with the command line applied on top: `format`
    /// replaces the configured one and `key=value` assignments extend the
    /// render options.
    pub fn options_with<S: AsRef<str>>(
        &self,
        format: Option<Format>,
        assignments: &[S],
    ) -> (Options, Vec<OptionError>) {
        let mut options = self.options.clone();
        if let Some(format) = format {
            options.format = format;
        }
        let (render, errors) = parse_assignments(assignments);
        options.render.extend(render);
        (options, errors)
    }

    /// Template variables, later sources winning: `base` (document
    /// variables), then `[substitutions]`, then `key=value` assignments.
    pub fn variables_with<S: AsRef<str>>(
        &self,
        base: BTreeMap<String, String>,
        assignments: &[S],
    ) -> (BTreeMap<String, String>, Vec<OptionError>) {
        let mut vars = base;
        vars.extend(self.substitutions.clone());
        let (extra, errors) = parse_assignments(assignments);
        vars.extend(extra);
        (vars, errors)
    }
}

/// Load `path`, or [`DEFAULT_CONFIG`] if it exists, or the defaults.
pub fn load(path: Option<&Path>) -> Result<Config, CliError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.is_file() {
                debug!("no config file, using defaults");
                return Ok(Config::default());
            }
            default
        }
    };

    let text = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|source| CliError::Config {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}
