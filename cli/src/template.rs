use std::collections::BTreeMap;

use tracing::debug;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "{{ content }}";

/// Replace every `{{ key }}` in `template` with its variable. Unknown keys
/// expand to nothing.
pub fn substitute(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..open]);
        let key = rest[open + 2..open + 2 + close].trim();
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => debug!(%key, "template variable is not defined"),
        }
        rest = &rest[open + 2 + close + 2..];
    }
    out.push_str(rest);
    out
}
