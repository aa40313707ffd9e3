//! Descriptor templates with `{{name}}` placeholders.
//!
//! A [`Template`] is parsed once; the placeholders it references are known
//! before rendering. [`Template::render`] checks that every one of them has a
//! value before producing any output.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TemplateError;

/// How substituted values are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escape {
    #[default]
    None,
    /// Escape `& < > " '` for XML text and attribute values.
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

/// A parsed descriptor template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    escape: Escape,
}

impl Template {
    /// Parse `source`. Whitespace inside the braces is ignored, so
    /// `{{ device }}` and `{{device}}` are the same placeholder.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or(TemplateError::Unterminated {
                offset: offset + start,
            })?;
            let name = after_open[..end].trim();
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(TemplateError::InvalidName {
                    name: name.to_string(),
                    offset: offset + start,
                });
            }
            segments.push(Segment::Placeholder(name.to_string()));

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            segments,
            escape: Escape::None,
        })
    }

    pub fn with_escape(mut self, escape: Escape) -> Self {
        self.escape = escape;
        self
    }

    pub fn escape(&self) -> Escape {
        self.escape
    }

    /// Names of all placeholders the template references.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }

    /// Substitute `values` into the template. Values for names the template
    /// does not reference are ignored.
    pub fn render(&self, values: &BTreeMap<String, String>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .placeholders()
            .into_iter()
            .find(|name| !values.contains_key(*name))
        {
            return Err(TemplateError::MissingPlaceholder {
                name: missing.to_string(),
            });
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = &values[name];
                    match self.escape {
                        Escape::None => out.push_str(value),
                        Escape::Xml => push_xml_escaped(&mut out, value),
                    }
                }
            }
        }
        Ok(out)
    }
}

fn push_xml_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn placeholders_are_collected() {
        let t = Template::parse("<a>{{ family }}</a><b>{{device}}</b>{{family}}").unwrap();
        assert_eq!(t.placeholders().into_iter().collect::<Vec<_>>(), ["device", "family"]);
    }

    #[test]
    fn render_substitutes() {
        let t = Template::parse("load {{file}} on {{ cable }}.").unwrap();
        let out = t
            .render(&values(&[("file", "top.bit"), ("cable", "USB2"), ("unused", "x")]))
            .unwrap();
        assert_eq!(out, "load top.bit on USB2.");
    }

    #[test]
    fn missing_value_fails_closed() {
        let t = Template::parse("{{a}} and {{b}}").unwrap();
        let err = t.render(&values(&[("a", "1")])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingPlaceholder {
                name: "b".into()
            }
        );
        assert_eq!(err.to_string(), "no value for placeholder {{b}}");
    }

    #[test]
    fn unterminated_and_invalid() {
        assert_eq!(
            Template::parse("ok {{name").unwrap_err(),
            TemplateError::Unterminated { offset: 3 }
        );
        assert!(matches!(
            Template::parse("{{}}"),
            Err(TemplateError::InvalidName { .. })
        ));
        assert!(matches!(
            Template::parse("{{two words}}"),
            Err(TemplateError::InvalidName { .. })
        ));
    }

    #[test]
    fn single_braces_are_text() {
        let t = Template::parse("{ not } a {placeholder}").unwrap();
        assert!(t.placeholders().is_empty());
        assert_eq!(t.render(&BTreeMap::new()).unwrap(), "{ not } a {placeholder}");
    }

    #[test]
    fn xml_escaping() {
        let t = Template::parse("<File>{{f}}</File>").unwrap().with_escape(Escape::Xml);
        let out = t.render(&values(&[("f", "a&b <\"c\">.bit")])).unwrap();
        assert_eq!(out, "<File>a&amp;b &lt;&quot;c&quot;&gt;.bit</File>");

        let plain = Template::parse("{{f}}").unwrap();
        assert_eq!(plain.render(&values(&[("f", "a&b")])).unwrap(), "a&b");
    }
}
