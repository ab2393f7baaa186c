use std::collections::BTreeMap;
use std::io::{self, Write};

use mcnp_adapter::TargetModel;
use mcnp_adapter::deck::Deck;

use crate::util::text::truncate;

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

const MAX_ROWS: usize = 12;

pub fn print_deck_info(deck: &Deck) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let rows = vec![
        ("Title", deck.title.trim().to_string()),
        ("Cell Cards", deck.cells.len().to_string()),
        ("Surface Cards", deck.surfaces.len().to_string()),
        ("Materials", deck.materials.len().to_string()),
        ("Thermal Tables", deck.thermals.len().to_string()),
        ("Transformations", deck.transformations.len().to_string()),
        ("Other Data Cards", deck.passthrough.len().to_string()),
    ];

    print_kv_table(&mut out, "Deck Summary", &rows);
}

pub fn print_model_summary(model: &TargetModel) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![
        ("Cells", model.cells.len().to_string()),
        ("Surfaces", model.surfaces.len().to_string()),
        ("Materials", model.materials.len().to_string()),
        ("Universes", model.universes.len().to_string()),
    ];

    let bounds = model.bounding_box();
    if bounds.is_finite() && !bounds.is_empty() {
        rows.push(("Lower Corner", format_point(bounds.lower)));
        rows.push(("Upper Corner", format_point(bounds.upper)));
    }
    rows.push(("Source", format_point(model.settings.source)));

    print_kv_table(&mut out, "Model Summary", &rows);
}

pub fn print_surface_types(model: &TargetModel) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for surface in model.surfaces.values() {
        *counts.entry(surface.kind.type_name()).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let stderr = io::stderr();
    let mut out = stderr.lock();
    print_distribution_table(&mut out, "Surface Types", &sorted, model.surfaces.len());
}

fn format_point(p: [f64; 3]) -> String {
    format!("({:.3}, {:.3}, {:.3})", p[0], p[1], p[2])
}

fn print_distribution_table(
    out: &mut impl Write,
    title: &str,
    data: &[(String, usize)],
    total: usize,
) {
    let name_w = 12usize;
    let count_w = 6usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{}┬{}┬{}┐",
        INDENT,
        "─".repeat(name_w + 2),
        "─".repeat(count_w + 2),
        "─".repeat(dist_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        INDENT, "Type", "Count", "Distribution"
    );
    let _ = writeln!(
        out,
        "{}├{}┼{}┼{}┤",
        INDENT,
        "─".repeat(name_w + 2),
        "─".repeat(count_w + 2),
        "─".repeat(dist_w + 2)
    );

    for (name, count) in data.iter().take(MAX_ROWS) {
        let pct = (*count as f64 / total as f64) * 100.0;
        let dist_cell = format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct);
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            truncate(name, name_w),
            count,
            dist_cell
        );
    }

    if data.len() > MAX_ROWS {
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            "...",
            "...",
            format!("({} more types)", data.len() - MAX_ROWS)
        );
    }

    let _ = writeln!(
        out,
        "{}└{}┴{}┴{}┘",
        INDENT,
        "─".repeat(name_w + 2),
        "─".repeat(count_w + 2),
        "─".repeat(dist_w + 2)
    );
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{}┬{}┐",
        INDENT,
        "─".repeat(key_w + 2),
        "─".repeat(val_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<key_w$} │ {:>val_w$} │",
        INDENT, "Metric", "Value"
    );
    let _ = writeln!(
        out,
        "{}├{}┼{}┤",
        INDENT,
        "─".repeat(key_w + 2),
        "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w)
        );
    }

    let _ = writeln!(
        out,
        "{}└{}┴{}┘",
        INDENT,
        "─".repeat(key_w + 2),
        "─".repeat(val_w + 2)
    );
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = ((pct / 100.0) * max_width as f64).round() as usize;
    let empty = max_width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
