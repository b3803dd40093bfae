//! Shorthand Type Parser
//!
//! Parses `tag.class#id attr=value` type strings. The first token names the
//! element; `.`-prefixed tokens accumulate classes, a `#`-prefixed token sets
//! the id, and bare or `name=value` tokens become attributes.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, TemplateError};

lazy_static! {
    static ref TOKEN: Regex =
        Regex::new(r#"\s*([.#]?)([^\s.#="']+)(?:=("[^"]*"|'[^']*'|[^\s"']*))?"#).unwrap();
    static ref NEEDS_PARSE: Regex = Regex::new(r"[.#=\s]").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shorthand {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Attributes in authored order. `None` marks a bare (boolean) attribute.
    pub attributes: Vec<(String, Option<String>)>,
}

impl Shorthand {
    /// Space-joined class list, if any class was given.
    pub fn class(&self) -> Option<String> {
        if self.classes.is_empty() {
            None
        } else {
            Some(self.classes.join(" "))
        }
    }

    pub fn is_plain(&self) -> bool {
        self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }
}

/// Whether `spec` carries anything beyond a bare tag name.
pub fn is_shorthand(spec: &str) -> bool {
    NEEDS_PARSE.is_match(spec.trim())
}

pub fn parse_shorthand(spec: &str) -> Result<Shorthand> {
    let input = spec.trim_end();
    let invalid = || TemplateError::InvalidShorthand(spec.to_string());

    let mut result = Shorthand::default();
    let mut end = 0;
    for caps in TOKEN.captures_iter(input) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != end {
            return Err(invalid());
        }
        end = whole.end();

        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let name = caps.get(2).map_or("", |m| m.as_str());
        let value = caps.get(3).map(|m| unquote(m.as_str()).to_string());

        if result.tag.is_empty() {
            if !prefix.is_empty() || value.is_some() {
                return Err(invalid());
            }
            result.tag = name.to_string();
            continue;
        }

        match prefix {
            "." if value.is_none() => result.classes.push(name.to_string()),
            "#" if value.is_none() => {
                if result.id.is_some() {
                    return Err(invalid());
                }
                result.id = Some(name.to_string());
            }
            "" => result.attributes.push((name.to_string(), value)),
            _ => return Err(invalid()),
        }
    }

    if end != input.len() || result.tag.is_empty() {
        return Err(invalid());
    }
    Ok(result)
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
