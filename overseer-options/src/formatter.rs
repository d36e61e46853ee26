use crate::value::OptionValue;

/// Renders an option's value into a string, using the `%NAME%`/`%VALUE%`
/// placeholder vocabulary.
///
/// Substitution placeholders (`%PID%`, `%ROOTPATH%`, ...) are a separate,
/// later pass applied by the process supervisor over the fully-formatted
/// text — this type never sees them.
#[derive(Debug, Clone)]
pub struct FormatTemplate {
    pattern: String,
    multiline: bool,
}

impl FormatTemplate {
    pub fn new(pattern: impl Into<String>, multiline: bool) -> Self {
        FormatTemplate {
            pattern: pattern.into(),
            multiline,
        }
    }

    /// `"%NAME% = %VALUE%"`, single-line.
    pub fn default_for(name: &str) -> Self {
        let _ = name;
        FormatTemplate::new("%NAME%=%VALUE%", false)
    }

    pub fn multiline(&self) -> bool {
        self.multiline
    }

    /// Render one option's value against this template.
    ///
    /// When `multiline` is unset, list values are joined with `,` into a
    /// single `%VALUE%` substitution. When set, the template is emitted
    /// once per element (one `%VALUE%` line per element), elements
    /// separated by `\n`.
    pub fn render(&self, name: &str, value: &OptionValue) -> String {
        let named = self.pattern.replace("%NAME%", name);
        if !self.multiline {
            let joined = value.elements().join(",");
            named.replace("%VALUE%", &joined)
        } else {
            value
                .elements()
                .iter()
                .map(|element| named.replace("%VALUE%", element))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_single_line() {
        let tmpl = FormatTemplate::new("%NAME% %VALUE%", false);
        let rendered = tmpl.render("port", &OptionValue::Single("8080".into()));
        assert_eq!(rendered, "port 8080");
    }

    #[test]
    fn list_value_joined_with_comma_when_not_multiline() {
        let tmpl = FormatTemplate::new("%NAME%=%VALUE%", false);
        let value = OptionValue::List(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(tmpl.render("tags", &value), "tags=a,b,c");
    }

    #[test]
    fn list_value_one_line_per_element_when_multiline() {
        let tmpl = FormatTemplate::new("HiddenServicePort %VALUE%", true);
        let value = OptionValue::List(vec!["80".into(), "443".into()]);
        assert_eq!(
            tmpl.render("HiddenServicePort", &value),
            "HiddenServicePort 80\nHiddenServicePort 443"
        );
    }
}
