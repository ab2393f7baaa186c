use super::Section;
use super::error::Error;

/// Columns of leading blanks that turn a line into a continuation.
const CONTINUATION_COLUMNS: usize = 5;
const TAB_WIDTH: usize = 8;

/// One logical card: a possibly continued line split into lower-cased
/// whitespace tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCard {
    pub section: Section,
    pub tokens: Vec<String>,
    /// First and last physical line (1-based) the card was read from.
    pub lines: (usize, usize),
}

impl RawCard {
    pub fn label(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or("")
    }
}

/// Output of [`tokenize`]: header text plus the cards of every block.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokenized {
    pub message: Option<String>,
    pub title: String,
    pub cards: Vec<RawCard>,
}

struct PendingCard {
    section: Section,
    tokens: Vec<String>,
    first: usize,
    last: usize,
}

impl PendingCard {
    fn finish(self) -> RawCard {
        RawCard {
            section: self.section,
            tokens: self.tokens,
            lines: (self.first, self.last),
        }
    }
}

/// Splits deck text into cards.
pub fn tokenize(text: &str) -> Result<Tokenized, Error> {
    let lines: Vec<&str> = text.lines().collect();
    let mut cursor = 0;

    let message = read_message_block(&lines, &mut cursor);

    let title = lines
        .get(cursor)
        .map(|l| l.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::malformed(cursor + 1, "input deck is empty or has no title card"))?;
    cursor += 1;

    let mut cards = Vec::new();
    let mut section = Some(Section::Cells);
    let mut current: Option<PendingCard> = None;
    let mut ampersand = false;

    while cursor < lines.len() {
        let line_no = cursor + 1;
        let line = lines[cursor];
        cursor += 1;

        let Some(active) = section else {
            break;
        };

        if line.trim().is_empty() {
            if ampersand {
                return Err(Error::malformed(
                    line_no,
                    "blank line follows a card continued with '&'",
                ));
            }
            if let Some(card) = current.take() {
                cards.push(card.finish());
            }
            section = active.next();
            continue;
        }

        if is_comment_card(line) {
            continue;
        }

        let continued = ampersand || leading_columns(line) >= CONTINUATION_COLUMNS;
        let mut content = strip_inline_comment(line).trim_end();
        ampersand = false;
        if let Some(stripped) = content.strip_suffix('&') {
            content = stripped;
            ampersand = true;
        }

        let tokens: Vec<String> = content
            .split_whitespace()
            .map(|t| t.to_ascii_lowercase())
            .collect();

        if continued {
            let card = current.as_mut().ok_or_else(|| {
                Error::malformed(line_no, "continuation line has no preceding card")
            })?;
            card.tokens.extend(tokens);
            card.last = line_no;
            continue;
        }

        if tokens.is_empty() {
            continue;
        }

        if let Some(card) = current.take() {
            cards.push(card.finish());
        }

        check_label(active, &tokens[0], line_no)?;
        current = Some(PendingCard {
            section: active,
            tokens,
            first: line_no,
            last: line_no,
        });
    }

    if let Some(card) = current.take() {
        cards.push(card.finish());
    }

    if section == Some(Section::Cells) {
        return Err(Error::malformed(
            lines.len(),
            "input ended before the cell block was closed by a blank line",
        ));
    }

    Ok(Tokenized {
        message,
        title,
        cards,
    })
}

fn read_message_block(lines: &[&str], cursor: &mut usize) -> Option<String> {
    let first = lines.first()?;
    let trimmed = first.trim_start();
    if !trimmed
        .get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("message:"))
    {
        return None;
    }

    let mut parts = vec![trimmed[8..].trim().to_string()];
    *cursor = 1;
    while *cursor < lines.len() {
        let line = lines[*cursor];
        *cursor += 1;
        if line.trim().is_empty() {
            break;
        }
        parts.push(line.trim().to_string());
    }
    Some(
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// A `c` in the first five columns followed by a blank or the end of line.
fn is_comment_card(line: &str) -> bool {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() >= CONTINUATION_COLUMNS {
        return false;
    }
    let mut chars = body.chars();
    matches!(chars.next(), Some('c' | 'C')) && chars.next().is_none_or(|c| c.is_whitespace())
}

fn leading_columns(line: &str) -> usize {
    let mut col = 0;
    for c in line.chars() {
        match c {
            ' ' => col += 1,
            '\t' => col = (col / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => break,
        }
    }
    col
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find('$') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn check_label(section: Section, label: &str, line_no: usize) -> Result<(), Error> {
    let numeric = match section {
        Section::Cells => label.parse::<u32>().is_ok(),
        Section::Surfaces => label
            .trim_start_matches(['*', '+'])
            .parse::<u32>()
            .is_ok(),
        Section::Data => true,
    };
    if numeric {
        Ok(())
    } else {
        Err(Error::malformed(
            line_no,
            format!(
                "card '{}' appears in the {} block; a blank line is missing before the data block",
                label, section
            ),
        ))
    }
}
