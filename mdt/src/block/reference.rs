/// What a proof is a proof of, from `Proof (of ...):`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProofSubject {
    /// `of #key`: a label reference, rendered with the resolved number.
    Reference(String),
    /// `of <free text>`: kept verbatim.
    Text(String),
}

impl ProofSubject {
    /// Parse a proof name. Returns `None` unless it has the `of <subject>` shape.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.trim().strip_prefix("of")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let subject = rest.trim();
        if subject.is_empty() {
            return None;
        }
        match subject.strip_prefix('#') {
            Some(key) if !key.is_empty() && !key.contains(char::is_whitespace) => {
                Some(ProofSubject::Reference(key.to_string()))
            }
            _ => Some(ProofSubject::Text(subject.to_string())),
        }
    }
}
