/// A macro body split into literal text and parameter slots.
///
/// Splitting once at definition time makes substitution simultaneous: an
/// argument that happens to contain another parameter's name is never
/// substituted a second time.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroBody {
    pub parts: Vec<BodyPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyPart {
    /// Literal text content.
    Literal(String),
    /// Index into the macro's parameter list.
    Param(usize),
}

impl MacroBody {
    pub fn literal(s: impl Into<String>) -> Self {
        MacroBody {
            parts: vec![BodyPart::Literal(s.into())],
        }
    }

    /// Split `body` on every occurrence of a parameter name. When several
    /// names match at the same position the longest one wins.
    pub fn compile(body: &str, params: &[&str]) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = body;

        while !rest.is_empty() {
            let hit = params
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty() && rest.starts_with(**name))
                .max_by_key(|(_, name)| name.len());
            match hit {
                Some((index, name)) => {
                    if !literal.is_empty() {
                        parts.push(BodyPart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(BodyPart::Param(index));
                    rest = &rest[name.len()..];
                }
                None => {
                    let ch = rest.chars().next().unwrap_or_default();
                    literal.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        if !literal.is_empty() {
            parts.push(BodyPart::Literal(literal));
        }
        MacroBody { parts }
    }

    /// Render the body with `values[i]` in place of parameter `i`.
    pub fn instantiate(&self, values: &[&str]) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                BodyPart::Literal(s) => out.push_str(s),
                BodyPart::Param(i) => out.push_str(values.get(*i).copied().unwrap_or_default()),
            }
        }
        out
    }
}
