//! Environment marker parser
//!
//! Grammar:
//! - `or_expr  := and_expr ('or' and_expr)*`
//! - `and_expr := atom ('and' atom)*`
//! - `atom     := '(' or_expr ')' | value op value`
//! - `value    := marker_variable | quoted_string`

use super::Cursor;
use crate::domain::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable};

pub(crate) fn parse_or(cursor: &mut Cursor<'_>) -> Result<MarkerTree, String> {
    let mut items = vec![parse_and(cursor)?];
    loop {
        cursor.eat_whitespace();
        if cursor.eat_keyword("or") {
            items.push(parse_and(cursor)?);
        } else {
            break;
        }
    }
    Ok(MarkerTree::or(items))
}

fn parse_and(cursor: &mut Cursor<'_>) -> Result<MarkerTree, String> {
    let mut items = vec![parse_atom(cursor)?];
    loop {
        cursor.eat_whitespace();
        if cursor.eat_keyword("and") {
            items.push(parse_atom(cursor)?);
        } else {
            break;
        }
    }
    Ok(MarkerTree::and(items))
}

fn parse_atom(cursor: &mut Cursor<'_>) -> Result<MarkerTree, String> {
    cursor.eat_whitespace();
    if cursor.eat_char('(') {
        let inner = parse_or(cursor)?;
        cursor.eat_whitespace();
        if !cursor.eat_char(')') {
            return Err("expected ')' in marker".to_string());
        }
        return Ok(inner);
    }

    let lhs = parse_value(cursor)?;
    cursor.eat_whitespace();
    let operator = parse_operator(cursor)?;
    cursor.eat_whitespace();
    let rhs = parse_value(cursor)?;

    if matches!(lhs, MarkerValue::Literal(_)) && matches!(rhs, MarkerValue::Literal(_)) {
        return Err("marker compares two literals".to_string());
    }
    Ok(MarkerTree::Expression(MarkerExpression::new(
        lhs, operator, rhs,
    )))
}

fn parse_value(cursor: &mut Cursor<'_>) -> Result<MarkerValue, String> {
    match cursor.peek() {
        Some(quote @ ('"' | '\'')) => {
            cursor.bump();
            let literal = cursor.take_while(|c| c != quote);
            if !cursor.eat_char(quote) {
                return Err("unterminated string in marker".to_string());
            }
            Ok(MarkerValue::Literal(literal.to_string()))
        }
        Some(_) => {
            let ident = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if ident.is_empty() {
                return Err(format!("expected marker value at '{}'", cursor.rest()));
            }
            MarkerVariable::from_name(ident)
                .map(MarkerValue::Variable)
                .ok_or_else(|| format!("unknown marker variable '{}'", ident))
        }
        None => Err("unexpected end of marker".to_string()),
    }
}

fn parse_operator(cursor: &mut Cursor<'_>) -> Result<MarkerOperator, String> {
    if cursor.eat_keyword("in") {
        return Ok(MarkerOperator::In);
    }
    if cursor.eat_keyword("not") {
        cursor.eat_whitespace();
        if cursor.eat_keyword("in") {
            return Ok(MarkerOperator::NotIn);
        }
        return Err("expected 'in' after 'not' in marker".to_string());
    }
    for op in MarkerOperator::SYMBOLIC {
        if cursor.eat_str(op.as_str()) {
            return Ok(op);
        }
    }
    Err(format!("expected marker operator at '{}'", cursor.rest()))
}
