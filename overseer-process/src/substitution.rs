use std::collections::HashMap;

use overseer_error::ProcessError;

/// Resolves the fixed, closed set of `%TAG%` substitution placeholders a
/// process exposes to its own templates.
///
/// Unlike the `%NAME%`/`%VALUE%` pair handled by `overseer_options`'s
/// formatter, substitution tags describe process identity and filesystem
/// layout, so they're resolved here rather than in the option model.
#[derive(Debug, Clone, Default)]
pub struct Substitutor {
    values: HashMap<&'static str, String>,
}

pub const TAG_PID: &str = "PID";
pub const TAG_ROOTPATH: &str = "ROOTPATH";
pub const TAG_DATAROOTPATH: &str = "DATAROOTPATH";
pub const TAG_CONFIGFILE: &str = "CONFIGFILE";
pub const TAG_LOGFILE: &str = "LOGFILE";
pub const TAG_LOGFILENAME: &str = "LOGFILENAME";
pub const TAG_LOGFILELOCATION: &str = "LOGFILELOCATION";

const ALL_TAGS: &[&str] = &[
    TAG_PID,
    TAG_ROOTPATH,
    TAG_DATAROOTPATH,
    TAG_CONFIGFILE,
    TAG_LOGFILE,
    TAG_LOGFILENAME,
    TAG_LOGFILELOCATION,
];

impl Substitutor {
    pub fn new() -> Self {
        Substitutor {
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, tag: &'static str, value: impl Into<String>) -> &mut Self {
        debug_assert!(ALL_TAGS.contains(&tag), "unknown substitution tag: {tag}");
        self.values.insert(tag, value.into());
        self
    }

    pub fn has_substitute(&self, tag: &str) -> bool {
        self.values.contains_key(tag)
    }

    /// Replace every `%TAG%` occurrence in `text`. Fails with
    /// `substitutionNotFound` on the first tag-shaped token (`%XYZ%`) this
    /// substitutor has no value for.
    pub fn substitute(&self, text: &str) -> Result<String, ProcessError> {
        let mut out = String::with_capacity(text.len());
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                if let Some(end) = text[i + 1..].find('%') {
                    let tag = &text[i + 1..i + 1 + end];
                    if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_uppercase()) {
                        match self.values.get(tag) {
                            Some(value) => {
                                out.push_str(value);
                                i += end + 2;
                                continue;
                            }
                            None => {
                                return Err(ProcessError::SubstitutionNotFound {
                                    detail: Some(tag.to_string()),
                                });
                            }
                        }
                    }
                }
            }
            let ch = text[i..].chars().next().unwrap();
            out.push(ch);
            i += ch.len_utf8();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_tags() {
        let mut sub = Substitutor::new();
        sub.set(TAG_PID, "42");
        sub.set(TAG_LOGFILE, "/data/echo-1.log");
        let rendered = sub.substitute("pid=%PID% log=%LOGFILE%").unwrap();
        assert_eq!(rendered, "pid=42 log=/data/echo-1.log");
    }

    #[test]
    fn unknown_tag_fails() {
        let sub = Substitutor::new();
        let err = sub.substitute("%NOTATAG%").unwrap_err();
        assert!(matches!(err, ProcessError::SubstitutionNotFound { .. }));
    }

    #[test]
    fn lone_percent_sign_is_passed_through() {
        let sub = Substitutor::new();
        assert_eq!(
            sub.substitute("plain text, 100% done").unwrap(),
            "plain text, 100% done"
        );
    }
}
