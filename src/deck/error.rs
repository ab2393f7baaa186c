use super::Section;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("malformed input deck: {details} (at line {line})")]
    MalformedInput { line: usize, details: String },

    #[error("failed to parse {section} card '{card}', field {field}: {details}")]
    Parse {
        section: Section,
        card: String,
        field: usize,
        details: String,
    },
}

impl Error {
    pub fn malformed(line: usize, details: impl Into<String>) -> Self {
        Self::MalformedInput {
            line,
            details: details.into(),
        }
    }

    pub fn parse(
        section: Section,
        card: impl Into<String>,
        field: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            section,
            card: card.into(),
            field,
            details: details.into(),
        }
    }
}
