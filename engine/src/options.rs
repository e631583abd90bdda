use std::collections::BTreeMap;

use mdt::Role;
use tracing::{debug, warn};

use crate::error::OptionError;

/// Split a `key=value` option string.
pub fn parse_assignment(option: &str) -> Result<(String, String), OptionError> {
    let (key, value) = option.split_once('=').ok_or_else(|| OptionError::MissingValue {
        option: option.to_string(),
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(OptionError::EmptyKey {
            option: option.to_string(),
        });
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Parse a list of `key=value` strings into a map. Malformed entries are
/// skipped and returned as errors; later entries win.
pub fn parse_assignments<S: AsRef<str>>(options: &[S]) -> (BTreeMap<String, String>, Vec<OptionError>) {
    let mut map = BTreeMap::new();
    let mut errors = Vec::new();
    for option in options {
        let option: &str = option.as_ref();
        match parse_assignment(option) {
            Ok((key, value)) => {
                map.insert(key, value);
            }
            Err(e) => {
                warn!(%option, error = %e, "skipping malformed option");
                errors.push(e);
            }
        }
    }
    (map, errors)
}

/// Backend options understood by the renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Append the link target's file type to hyperlinks (typesetting backend).
    pub link_filetypes: bool,
    /// Span roles the typesetting backend skips entirely.
    pub ignore_roles: Vec<Role>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            link_filetypes: false,
            ignore_roles: vec![
                Role::SectionNumber,
                Role::BlockLabel,
                Role::BlockNumber,
                Role::BlockName,
                Role::BlockReferences,
                Role::ProofSubject,
                Role::Qed,
            ],
        }
    }
}

impl RenderOptions {
    /// Read the known keys out of a raw option map. Values that fail to
    /// parse keep the default and are reported.
    pub fn from_map(map: &BTreeMap<String, String>) -> (Self, Vec<OptionError>) {
        let mut options = RenderOptions::default();
        let mut errors = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "link_filetypes" => match parse_bool(key, value) {
                    Ok(flag) => options.link_filetypes = flag,
                    Err(e) => errors.push(e),
                },
                "ignore_classes" => {
                    options.ignore_roles.clear();
                    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                        match role_by_class(name) {
                            Some(role) => options.ignore_roles.push(role),
                            None => errors.push(OptionError::UnknownClass {
                                option: format!("{}={}", key, value),
                                name: name.to_string(),
                            }),
                        }
                    }
                }
                _ => debug!(%key, "ignoring unknown render option"),
            }
        }
        for e in &errors {
            warn!(error = %e, "skipping malformed render option");
        }
        (options, errors)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, OptionError> {
    match value {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(OptionError::NotABool {
            option: format!("{}={}", key, value),
            value: value.to_string(),
        }),
    }
}

fn role_by_class(name: &str) -> Option<Role> {
    const ROLES: [Role; 10] = [
        Role::BlockHeading,
        Role::BlockLabel,
        Role::BlockNumber,
        Role::BlockName,
        Role::BlockReferences,
        Role::ProofSubject,
        Role::Qed,
        Role::SectionNumber,
        Role::ReferenceNumber,
        Role::TocTitle,
    ];
    ROLES.into_iter().find(|role| role.class_name() == name)
}
