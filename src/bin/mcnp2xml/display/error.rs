use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    let hints = HintCollector::collect(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn collect(err: &Error) -> Vec<String> {
        let mut collector = Self {
            hints: Vec::new(),
            has_typed_hints: false,
        };

        collector.collect_deck_hints(err);
        collector.collect_convert_hints(err);

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        collector.hints
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn find<E: std::error::Error + 'static>(err: &Error) -> Option<&E> {
        err.chain().find_map(|cause| cause.downcast_ref::<E>())
    }

    fn collect_deck_hints(&mut self, err: &Error) {
        use mcnp_adapter::deck::Error as DeckError;

        let Some(deck_err) = Self::find::<DeckError>(err) else {
            return;
        };

        self.has_typed_hints = true;

        match deck_err {
            DeckError::Io { source } => self.collect_std_io_hints(source),

            DeckError::MalformedInput { line, .. } => {
                self.add(format!("The deck layout is broken near line {}", line));
                self.add("A deck needs a title card, then cell cards, a blank line, surface cards, a blank line and data cards");
                self.add("Check for a missing blank-line delimiter or a stray continuation");
            }

            DeckError::Parse { section, card, .. } => {
                self.add(format!("Inspect {} card '{}' for a malformed field", section, card));
                self.add("Numeric shortcuts (nR, nI, xM) must follow a value they can repeat");
            }
        }
    }

    fn collect_convert_hints(&mut self, err: &Error) {
        use mcnp_adapter::ConvertError;

        let Some(convert_err) = Self::find::<ConvertError>(err) else {
            return;
        };

        self.has_typed_hints = true;

        match convert_err {
            ConvertError::UnresolvedReference { .. } => {
                self.add("Every surface in a cell must be defined in the surface block");
                self.add("A #n complement may only name a cell that appears earlier");
            }

            ConvertError::UnsupportedSurfaceType { mnemonic, .. } => {
                self.add(format!("Surface type '{}' has no OpenMC counterpart", mnemonic));
                self.add("Macrobodies (RPP, RCC, BOX, ...) must be decomposed into planes and quadrics first");
            }

            ConvertError::UnknownNuclide { .. } => {
                self.add("ZAIDs are written ZZZAAA with an optional library suffix, e.g. 92235.80c");
                self.add("Use AAA = 000 for a natural element");
            }

            ConvertError::MixedFractions { .. } => {
                self.add("Use positive fractions for atom fractions or negative for weight fractions, not both");
            }

            ConvertError::DanglingReference { .. } => {
                self.add("Define the referenced material, transformation or universe in the deck");
            }

            ConvertError::InvalidExpression { .. } => {
                self.add("Check that parentheses balance and no operator is left without an operand");
                self.add("Facet references such as 1.2 cannot be translated");
            }

            ConvertError::InvalidSurface { .. } => {
                self.add("The surface coefficients describe a degenerate surface");
                self.add("Check the coefficient count and that defining points are distinct");
            }

            ConvertError::UnknownThermalTable { .. } => {
                self.add("Only common S(a,b) tables are mapped; check the MTn card spelling");
            }

            ConvertError::UnsupportedFeature { .. } => {
                self.add("Lattices and cell transformations are not converted");
                self.add("Remove the feature from the deck or convert that part manually");
            }

            ConvertError::Settings(_) => {
                self.add("The --settings file has invalid TOML or a value of the wrong type");
                self.add("Known keys: batches, inactive, particles, summary, source");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("The deck is not valid UTF-8 text");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path, permissions, and disk space");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            self.add("Verify the file exists and is readable");
            return;
        }

        if msg.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
            self.add("Ensure you have the required access rights");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
