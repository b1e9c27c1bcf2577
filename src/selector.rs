use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the previous (left) part; meaningless for the first part.
    pub(crate) combinator: SelectorCombinator,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let mut groups = Vec::new();
    for group in split_top_level_commas(selector) {
        groups.push(parse_selector_chain(&group)?);
    }
    if groups.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(groups)
}

fn split_top_level_commas(selector: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    for ch in selector.chars() {
        match ch {
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            ',' if !in_brackets => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    out.push(current);
    out
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending_child = false;

    for token in tokens {
        if token == ">" {
            if pending_child || parts.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_child = true;
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if pending_child {
            SelectorCombinator::Child
        } else {
            SelectorCombinator::Descendant
        };
        pending_child = false;
        parts.push(SelectorPart { step, combinator });
    }

    if pending_child || parts.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(parts)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in selector.chars() {
        match ch {
            '[' => {
                if in_brackets {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                if !in_brackets {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                in_brackets = false;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '>' if !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            _ => current.push(ch),
        }
    }

    if in_brackets {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_selector_step(token: &str) -> Result<SelectorStep> {
    let mut step = SelectorStep::default();
    let mut chars = token.chars().peekable();

    match chars.peek() {
        Some('*') => {
            step.universal = true;
            chars.next();
        }
        Some(c) if c.is_ascii_alphanumeric() => {
            let mut tag = String::new();
            while let Some(c) = chars.peek() {
                if c.is_ascii_alphanumeric() || *c == '-' {
                    tag.push(*c);
                    chars.next();
                } else {
                    break;
                }
            }
            step.tag = Some(tag.to_ascii_lowercase());
        }
        _ => {}
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let name = take_identifier(&mut chars);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(token.into()));
                }
                step.id = Some(name);
            }
            '.' => {
                let name = take_identifier(&mut chars);
                if name.is_empty() {
                    return Err(Error::UnsupportedSelector(token.into()));
                }
                step.classes.push(name);
            }
            '[' => {
                let mut body = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    body.push(c);
                }
                if !closed {
                    return Err(Error::UnsupportedSelector(token.into()));
                }
                step.attrs.push(parse_attr_condition(&body, token)?);
            }
            _ => return Err(Error::UnsupportedSelector(token.into())),
        }
    }

    if step.is_empty() {
        return Err(Error::UnsupportedSelector(token.into()));
    }
    Ok(step)
}

fn take_identifier(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(c) = chars.peek() {
        if c.is_ascii_alphanumeric() || *c == '-' || *c == '_' {
            name.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn parse_attr_condition(body: &str, token: &str) -> Result<SelectorAttrCondition> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Error::UnsupportedSelector(token.into()));
    }

    let Some((key, value)) = body.split_once('=') else {
        return Ok(SelectorAttrCondition::Exists {
            key: body.to_ascii_lowercase(),
        });
    };

    let key = key.trim().to_ascii_lowercase();
    if key.is_empty() {
        return Err(Error::UnsupportedSelector(token.into()));
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Ok(SelectorAttrCondition::Eq {
        key,
        value: value.to_string(),
    })
}
