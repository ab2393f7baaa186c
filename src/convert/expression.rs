//! Cell geometry expressions.
//!
//! Grammar, from tightest to loosest binding:
//!
//! 1. parenthesised sub-expression, `#(...)` and `#n` complements
//! 2. implicit intersection of adjacent operands, left-associative
//! 3. union `:`, left-associative
//!
//! Signed surface numbers become half-spaces. A `#n` refers to the region of
//! cell `n`, which must appear earlier in the deck. The translated tree is
//! normalised before it is returned, so it carries no complement nodes.

use std::collections::{BTreeMap, BTreeSet};

use super::error::Error;
use crate::deck::{CellRecord, Section};
use crate::model::region::{Region, Sense};

const UNION_PREC: u8 = 1;
const INTERSECTION_PREC: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Surface(i64),
    CellComplement(u32),
    ComplementGroup,
    LParen,
    RParen,
    Union,
}

/// Translates the geometry of `cell` into a normalised region.
///
/// `previous` holds the regions of the cells defined before `cell`;
/// `surfaces` holds every surface id the deck defines.
pub fn translate(
    cell: &CellRecord,
    previous: &BTreeMap<u32, Region>,
    surfaces: &BTreeSet<u32>,
) -> Result<Region, Error> {
    let text = cell.geometry.join(" ");
    let tokens = lex(&text).map_err(|detail| Error::invalid_expression(cell.id, detail))?;
    if tokens.is_empty() {
        return Err(Error::invalid_expression(cell.id, "geometry is empty"));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        cell: cell.id,
        previous,
        surfaces,
    };
    let region = parser.parse_expr(UNION_PREC)?;
    if let Some(tok) = parser.peek() {
        let detail = match tok {
            Token::RParen => "unbalanced ')'".to_string(),
            other => format!("unexpected {:?}", other),
        };
        return Err(Error::invalid_expression(cell.id, detail));
    }

    Ok(region.normalized())
}

fn lex(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Union);
                i += 1;
            }
            '#' => {
                i += 1;
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                match chars.get(i) {
                    Some('(') => {
                        tokens.push(Token::ComplementGroup);
                        i += 1;
                    }
                    Some(d) if d.is_ascii_digit() => {
                        let (value, next) = read_digits(&chars, i);
                        let id = u32::try_from(value)
                            .ok()
                            .filter(|&v| v > 0)
                            .ok_or_else(|| format!("invalid cell number in '#{}'", value))?;
                        tokens.push(Token::CellComplement(id));
                        i = next;
                    }
                    _ => return Err("'#' must be followed by a cell number or '('".to_string()),
                }
            }
            '+' | '-' | '0'..='9' => {
                let negative = c == '-';
                let start = if matches!(c, '+' | '-') { i + 1 } else { i };
                if !chars.get(start).is_some_and(|d| d.is_ascii_digit()) {
                    return Err(format!("sign '{}' is not followed by a surface number", c));
                }
                let (value, next) = read_digits(&chars, start);
                if chars.get(next) == Some(&'.') {
                    return Err(format!(
                        "macrobody facet reference '{}' is not supported",
                        chars[i..]
                            .iter()
                            .take_while(|ch| !ch.is_whitespace())
                            .collect::<String>()
                    ));
                }
                if value == 0 {
                    return Err("surface number 0 is not valid".to_string());
                }
                tokens.push(Token::Surface(if negative { -value } else { value }));
                i = next;
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

fn read_digits(chars: &[char], start: usize) -> (i64, usize) {
    let mut end = start;
    let mut value: i64 = 0;
    while let Some(d) = chars.get(end).and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(d as i64);
        end += 1;
    }
    (value, end)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    cell: u32,
    previous: &'a BTreeMap<u32, Region>,
    surfaces: &'a BTreeSet<u32>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self, min_prec: u8) -> Result<Region, Error> {
        let mut lhs = self.parse_operand()?;

        loop {
            let (prec, explicit) = match self.peek() {
                Some(Token::Union) => (UNION_PREC, true),
                Some(
                    Token::Surface(_)
                    | Token::CellComplement(_)
                    | Token::ComplementGroup
                    | Token::LParen,
                ) => (INTERSECTION_PREC, false),
                _ => break,
            };
            if prec < min_prec {
                break;
            }
            if explicit {
                self.pos += 1;
            }
            let rhs = self.parse_expr(prec + 1)?;
            lhs = if prec == UNION_PREC {
                lhs.union(rhs)
            } else {
                lhs.intersection(rhs)
            };
        }

        Ok(lhs)
    }

    fn parse_operand(&mut self) -> Result<Region, Error> {
        match self.next() {
            Some(Token::Surface(value)) => {
                let id = u32::try_from(value.unsigned_abs()).unwrap_or(u32::MAX);
                if !self.surfaces.contains(&id) {
                    return Err(Error::unresolved(
                        Section::Cells,
                        self.cell,
                        format!("surface {} is not defined", id),
                    ));
                }
                let sense = if value < 0 {
                    Sense::Negative
                } else {
                    Sense::Positive
                };
                Ok(Region::halfspace(id, sense))
            }
            Some(Token::CellComplement(id)) => {
                let region = self.previous.get(&id).ok_or_else(|| {
                    Error::unresolved(
                        Section::Cells,
                        self.cell,
                        format!("cell {} is not defined before cell {}", id, self.cell),
                    )
                })?;
                Ok(Region::Complement(Box::new(region.clone())))
            }
            Some(Token::ComplementGroup) => {
                let inner = self.parse_expr(UNION_PREC)?;
                self.expect_close()?;
                Ok(Region::Complement(Box::new(inner)))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr(UNION_PREC)?;
                self.expect_close()?;
                Ok(inner)
            }
            Some(Token::RParen) => Err(Error::invalid_expression(self.cell, "unexpected ')'")),
            Some(Token::Union) => Err(Error::invalid_expression(
                self.cell,
                "':' has no left operand",
            )),
            None => Err(Error::invalid_expression(
                self.cell,
                "expression ends where an operand is expected",
            )),
        }
    }

    fn expect_close(&mut self) -> Result<(), Error> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(Error::invalid_expression(self.cell, "missing ')'")),
        }
    }
}
