//! Requirement line parser
//!
//! Handles the dependency specifier forms:
//! - Bare name: `requests`
//! - Extras: `requests[security,socks]`
//! - Specifiers: `requests>=2.8.1,==2.8.*` or `requests (>=2.8.1)`
//! - Direct reference: `pip @ https://example.com/pip.whl`
//! - Marker: `requests; python_version < "3.10"`

use super::marker::parse_or;
use super::Cursor;
use crate::domain::{
    is_valid_name, is_version_char, Operator, PackageName, Requirement, VersionSpecifier,
};
use crate::error::RequirementError;

/// Parses one requirement line
pub fn parse_requirement(input: &str) -> Result<Requirement, RequirementError> {
    let malformed = |message: String| RequirementError::malformed(input.trim(), message);

    let mut cursor = Cursor::new(input);
    cursor.eat_whitespace();

    let name = cursor.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if name.is_empty() {
        return Err(malformed("missing package name".to_string()));
    }
    let mut requirement = Requirement::new(
        PackageName::new(name).map_err(|_| malformed(format!("invalid package name '{}'", name)))?,
    );

    cursor.eat_whitespace();
    if cursor.eat_char('[') {
        parse_extras(&mut cursor, &mut requirement).map_err(&malformed)?;
    }

    cursor.eat_whitespace();
    if cursor.eat_char('@') {
        cursor.eat_whitespace();
        let url = cursor.take_while(|c| !c.is_whitespace());
        if url.is_empty() {
            return Err(malformed("missing URL after '@'".to_string()));
        }
        requirement.url = Some(url.to_string());
    } else if cursor.eat_char('(') {
        parse_specifiers(&mut cursor, &mut requirement).map_err(&malformed)?;
        cursor.eat_whitespace();
        if !cursor.eat_char(')') {
            return Err(malformed("expected ')' after version specifiers".to_string()));
        }
    } else if cursor.peek().is_some_and(|c| "<>=!~".contains(c)) {
        parse_specifiers(&mut cursor, &mut requirement).map_err(&malformed)?;
    }

    cursor.eat_whitespace();
    if cursor.eat_char(';') {
        requirement.marker = Some(parse_or(&mut cursor).map_err(&malformed)?);
    }

    cursor.eat_whitespace();
    if !cursor.at_end() {
        return Err(malformed(format!("unexpected text '{}'", cursor.rest())));
    }

    Ok(requirement)
}

fn parse_extras(cursor: &mut Cursor<'_>, requirement: &mut Requirement) -> Result<(), String> {
    loop {
        cursor.eat_whitespace();
        if cursor.eat_char(']') {
            return Ok(());
        }
        let extra = cursor.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !is_valid_name(extra) {
            return match cursor.peek() {
                None => Err("unclosed '[' in extras".to_string()),
                Some(c) => Err(format!("invalid extra name near '{}'", c)),
            };
        }
        requirement.extras.insert(extra.to_string());

        cursor.eat_whitespace();
        if cursor.eat_char(',') {
            continue;
        }
        if cursor.eat_char(']') {
            return Ok(());
        }
        return Err("expected ',' or ']' in extras".to_string());
    }
}

fn parse_specifiers(cursor: &mut Cursor<'_>, requirement: &mut Requirement) -> Result<(), String> {
    loop {
        cursor.eat_whitespace();
        let operator = Operator::parse_prefix(cursor.rest())
            .ok_or_else(|| format!("expected version operator at '{}'", cursor.rest()))?;
        cursor.eat_str(operator.as_str());

        cursor.eat_whitespace();
        let version = cursor.take_while(is_version_char);
        if version.is_empty() {
            return Err(format!("missing version after '{}'", operator));
        }

        let specifier = VersionSpecifier::new(operator, version);
        if !requirement.specifiers.contains(&specifier) {
            requirement.specifiers.push(specifier);
        }

        cursor.eat_whitespace();
        if !cursor.eat_char(',') {
            return Ok(());
        }
    }
}
