//! Path template parsing.
//!
//! Templates are split on `/` into segments:
//!
//! | Syntax            | Meaning                                         |
//! |-------------------|-------------------------------------------------|
//! | `users`           | static segment                                  |
//! | `:id`             | named parameter, matches one segment            |
//! | `:id?`            | optional parameter, the segment may be omitted  |
//! | `:id{\d+}`        | parameter constrained by an anchored regex      |
//! | `*rest`           | catch-all, must be the last segment             |
//!
//! Optional parameters are expanded at parse time into every concrete
//! variant, so the matcher itself only ever deals with required segments.

use regex::Regex;

use crate::error::RouteError;

/// A compiled `:name{pattern}` constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn compile(template: &str, param: &str, source: &str) -> Result<Self, RouteError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            RouteError::InvalidConstraint {
                template: template.to_string(),
                param: param.to_string(),
                source: e,
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the template.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole segment satisfies the constraint.
    pub fn is_match(&self, segment: &str) -> bool {
        self.regex.is_match(segment)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

/// One parsed segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text.
    Static(String),
    /// Named parameter with an optional constraint.
    Param {
        /// Parameter name.
        name: String,
        /// Regex the segment must satisfy.
        constraint: Option<Constraint>,
    },
    /// Catch-all capturing the remainder of the path.
    Wildcard(String),
}

#[derive(Debug)]
struct Parsed {
    segment: Segment,
    optional: bool,
}

/// Parses a template and expands its optional parameters.
///
/// Returns one segment list per concrete variant. A template without
/// optional parameters yields exactly one variant.
pub(crate) fn expand(template: &str) -> Result<Vec<Vec<Segment>>, RouteError> {
    if !template.starts_with('/') {
        return Err(RouteError::invalid(template, "must start with '/'"));
    }

    let raw: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let mut parsed = Vec::with_capacity(raw.len());
    let mut names: Vec<&str> = Vec::new();

    for (index, part) in raw.iter().enumerate() {
        let segment = parse_segment(template, part)?;
        match &segment.segment {
            Segment::Param { name, .. } | Segment::Wildcard(name) => {
                if names.contains(&name.as_str()) {
                    return Err(RouteError::invalid(
                        template,
                        format!("duplicate parameter '{name}'"),
                    ));
                }
                names.push(param_name(part));
            }
            Segment::Static(_) => {}
        }
        if matches!(segment.segment, Segment::Wildcard(_)) && index + 1 != raw.len() {
            return Err(RouteError::invalid(
                template,
                "wildcard must be the last segment",
            ));
        }
        parsed.push(segment);
    }

    let mut variants: Vec<Vec<Segment>> = vec![Vec::new()];
    for item in parsed {
        if item.optional {
            let mut with = variants.clone();
            for variant in &mut with {
                variant.push(item.segment.clone());
            }
            variants.extend(with);
        } else {
            for variant in &mut variants {
                variant.push(item.segment.clone());
            }
        }
    }
    Ok(variants)
}

fn param_name(part: &str) -> &str {
    let body = part.trim_start_matches([':', '*']);
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    &body[..end]
}

fn parse_segment(template: &str, part: &str) -> Result<Parsed, RouteError> {
    if let Some(name) = part.strip_prefix('*') {
        if name.is_empty() || param_name(part) != name {
            return Err(RouteError::invalid(
                template,
                format!("invalid wildcard segment '{part}'"),
            ));
        }
        return Ok(Parsed {
            segment: Segment::Wildcard(name.to_string()),
            optional: false,
        });
    }

    let Some(body) = part.strip_prefix(':') else {
        return Ok(Parsed {
            segment: Segment::Static(part.to_string()),
            optional: false,
        });
    };

    let name = param_name(part);
    if name.is_empty() {
        return Err(RouteError::invalid(
            template,
            format!("parameter segment '{part}' has no name"),
        ));
    }

    let mut rest = &body[name.len()..];
    let optional = rest.ends_with('?');
    if optional {
        rest = &rest[..rest.len() - 1];
    }

    let constraint = if rest.is_empty() {
        None
    } else if let Some(pattern) = rest.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        if pattern.is_empty() {
            return Err(RouteError::invalid(
                template,
                format!("empty constraint on parameter '{name}'"),
            ));
        }
        Some(Constraint::compile(template, name, pattern)?)
    } else {
        return Err(RouteError::invalid(
            template,
            format!("unexpected characters after parameter '{name}': '{rest}'"),
        ));
    };

    Ok(Parsed {
        segment: Segment::Param {
            name: name.to_string(),
            constraint,
        },
        optional,
    })
}
