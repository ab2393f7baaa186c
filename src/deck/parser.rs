use std::collections::{BTreeMap, BTreeSet};

use super::error::Error;
use super::numeric::{self, FieldError};
use super::records::{
    CellRecord, DataCard, MaterialRecord, Mnemonic, SurfaceRecord, ThermalRecord, Transformation,
};
use super::tokenizer::{RawCard, Tokenized};
use super::{Deck, Section};
use crate::model::surface::BoundaryType;

enum CellDraft {
    Complete(CellRecord),
    Like {
        id: u32,
        base: u32,
        overrides: BTreeMap<String, String>,
        line: usize,
    },
}

/// Turns tokenized cards into the record set of a deck.
pub fn parse(tokenized: Tokenized) -> Result<Deck, Error> {
    let mut deck = Deck {
        message: tokenized.message,
        title: tokenized.title,
        cells: Vec::new(),
        surfaces: Vec::new(),
        materials: BTreeMap::new(),
        thermals: BTreeMap::new(),
        transformations: BTreeMap::new(),
        passthrough: Vec::new(),
    };

    let mut drafts = Vec::new();
    let mut cell_ids = BTreeSet::new();
    let mut surface_ids = BTreeSet::new();

    for card in &tokenized.cards {
        match card.section {
            Section::Cells => {
                let draft = parse_cell(card)?;
                let id = match &draft {
                    CellDraft::Complete(c) => c.id,
                    CellDraft::Like { id, .. } => *id,
                };
                if !cell_ids.insert(id) {
                    return Err(Error::parse(
                        Section::Cells,
                        card.label(),
                        0,
                        format!("cell {} is defined more than once", id),
                    ));
                }
                drafts.push(draft);
            }
            Section::Surfaces => {
                let surface = parse_surface(card)?;
                if !surface_ids.insert(surface.id) {
                    return Err(Error::parse(
                        Section::Surfaces,
                        card.label(),
                        0,
                        format!("surface {} is defined more than once", surface.id),
                    ));
                }
                deck.surfaces.push(surface);
            }
            Section::Data => parse_data_card(card, &mut deck)?,
        }
    }

    deck.cells = resolve_like_cells(drafts)?;
    Ok(deck)
}

fn parse_cell(card: &RawCard) -> Result<CellDraft, Error> {
    let t = &card.tokens;
    let label = card.label();
    let err = |field: usize, details: String| Error::parse(Section::Cells, label, field, details);

    let id = numeric::parse_id(label)
        .ok_or_else(|| err(0, format!("'{}' is not a valid cell number", label)))?;

    let second = t
        .get(1)
        .ok_or_else(|| err(1, "missing material number".to_string()))?;

    if second == "like" {
        let base = t
            .get(2)
            .and_then(|v| numeric::parse_id(v))
            .ok_or_else(|| err(2, "LIKE must name an existing cell number".to_string()))?;
        if t.get(3).map(String::as_str) != Some("but") {
            return Err(err(3, "expected 'but' after 'like n'".to_string()));
        }
        let overrides = parse_params(&t[4..], 4, Section::Cells, label)?;
        return Ok(CellDraft::Like {
            id,
            base,
            overrides,
            line: card.lines.0,
        });
    }

    let material = numeric::parse_int(second)
        .filter(|&m| m >= 0)
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| err(1, format!("'{}' is not a valid material number", second)))?;

    let mut cursor = 2;
    let density = if material > 0 {
        let raw = t
            .get(2)
            .ok_or_else(|| err(2, "non-void cell is missing its density".to_string()))?;
        let d = numeric::parse_float(raw)
            .ok_or_else(|| err(2, format!("'{}' is not a valid density", raw)))?;
        if d == 0.0 {
            return Err(err(2, "density of a non-void cell must be nonzero".to_string()));
        }
        cursor = 3;
        Some(d)
    } else {
        None
    };

    let geometry_end = t[cursor..]
        .iter()
        .position(|tok| is_keyword(tok))
        .map_or(t.len(), |p| cursor + p);
    if geometry_end == cursor {
        return Err(err(cursor, "cell has no geometry".to_string()));
    }
    let geometry = t[cursor..geometry_end].to_vec();
    let options = parse_params(&t[geometry_end..], geometry_end, Section::Cells, label)?;

    Ok(CellDraft::Complete(CellRecord {
        id,
        material,
        density,
        geometry,
        options,
        line: card.lines.0,
    }))
}

fn resolve_like_cells(drafts: Vec<CellDraft>) -> Result<Vec<CellRecord>, Error> {
    let mut resolved: BTreeMap<u32, CellRecord> = BTreeMap::new();
    let order: Vec<u32> = drafts
        .iter()
        .map(|d| match d {
            CellDraft::Complete(c) => c.id,
            CellDraft::Like { id, .. } => *id,
        })
        .collect();

    let mut pending = Vec::new();
    for draft in drafts {
        match draft {
            CellDraft::Complete(cell) => {
                resolved.insert(cell.id, cell);
            }
            like => pending.push(like),
        }
    }

    while !pending.is_empty() {
        let before = pending.len();
        let mut still_pending = Vec::new();

        for draft in pending {
            let CellDraft::Like {
                id,
                base,
                overrides,
                line,
            } = draft
            else {
                continue;
            };
            let Some(template) = resolved.get(&base) else {
                still_pending.push(CellDraft::Like {
                    id,
                    base,
                    overrides,
                    line,
                });
                continue;
            };
            let cell = apply_like(id, template, overrides, line)?;
            resolved.insert(id, cell);
        }

        if still_pending.len() == before {
            let (id, base) = match &still_pending[0] {
                CellDraft::Like { id, base, .. } => (*id, *base),
                CellDraft::Complete(c) => (c.id, c.id),
            };
            return Err(Error::parse(
                Section::Cells,
                id.to_string(),
                2,
                format!("LIKE references undefined or circular cell {}", base),
            ));
        }
        pending = still_pending;
    }

    Ok(order
        .into_iter()
        .filter_map(|id| resolved.remove(&id))
        .collect())
}

fn apply_like(
    id: u32,
    template: &CellRecord,
    overrides: BTreeMap<String, String>,
    line: usize,
) -> Result<CellRecord, Error> {
    let mut cell = template.clone();
    cell.id = id;
    cell.line = line;
    let err = |details: String| Error::parse(Section::Cells, id.to_string(), 4, details);

    for (key, value) in overrides {
        match key.as_str() {
            "mat" => {
                cell.material = numeric::parse_int(&value)
                    .filter(|&m| m >= 0)
                    .and_then(|m| u32::try_from(m).ok())
                    .ok_or_else(|| err(format!("'{}' is not a valid material number", value)))?;
                if cell.material == 0 {
                    cell.density = None;
                }
            }
            "rho" => {
                let d = numeric::parse_float(&value)
                    .ok_or_else(|| err(format!("'{}' is not a valid density", value)))?;
                cell.density = Some(d);
            }
            _ => {
                cell.options.insert(key, value);
            }
        }
    }

    if cell.material > 0 && cell.density.is_none_or(|d| d == 0.0) {
        return Err(err("non-void cell is missing its density".to_string()));
    }
    Ok(cell)
}

fn parse_surface(card: &RawCard) -> Result<SurfaceRecord, Error> {
    let t = &card.tokens;
    let label = card.label();
    let err =
        |field: usize, details: String| Error::parse(Section::Surfaces, label, field, details);

    let (boundary, number) = if let Some(rest) = label.strip_prefix('*') {
        (BoundaryType::Reflective, rest)
    } else if let Some(rest) = label.strip_prefix('+') {
        (BoundaryType::White, rest)
    } else {
        (BoundaryType::Transmission, label)
    };
    let id = numeric::parse_id(number)
        .ok_or_else(|| err(0, format!("'{}' is not a valid surface number", label)))?;

    let mut cursor = 1;
    let mut transform = None;
    if let Some(n) = t.get(1).and_then(|v| numeric::parse_int(v)) {
        if n < 0 {
            return Err(err(1, "periodic boundary surfaces are not supported".to_string()));
        }
        transform = Some(
            u32::try_from(n)
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| err(1, format!("'{}' is not a valid transformation", n)))?,
        );
        cursor = 2;
    }

    let mnemonic: Mnemonic = t
        .get(cursor)
        .ok_or_else(|| err(cursor, "missing surface mnemonic".to_string()))?
        .parse()
        .unwrap_or_else(|never| match never {});

    let first = cursor + 1;
    let coefficients = numeric::expand(&t[first..]).map_err(|FieldError { field, details }| {
        err(first + field, details)
    })?;

    if let Some(arities) = mnemonic.arities() {
        let n = coefficients.len();
        if !arities.contains(&n) {
            let max = arities.iter().copied().max().unwrap_or(0);
            let expected = arities
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(err(
                first + n.min(max),
                format!(
                    "{} expects {} coefficients, found {}",
                    mnemonic, expected, n
                ),
            ));
        }
    }

    Ok(SurfaceRecord {
        id,
        boundary,
        transform,
        mnemonic,
        coefficients,
        line: card.lines.0,
    })
}

fn parse_data_card(card: &RawCard, deck: &mut Deck) -> Result<(), Error> {
    let label = card.label();
    let (starred, body) = match label.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, label),
    };
    let prefix = body.trim_end_matches(|c: char| c.is_ascii_digit());
    let id = numeric::parse_id(&body[prefix.len()..]);

    match (prefix, id) {
        ("m", Some(id)) if !starred => {
            let material = parse_material(card, id)?;
            if deck.materials.insert(id, material).is_some() {
                return Err(duplicate(label, "material", id));
            }
        }
        ("mt", Some(id)) if !starred => {
            let thermal = ThermalRecord {
                id,
                tables: card.tokens[1..].to_vec(),
                line: card.lines.0,
            };
            if thermal.tables.is_empty() {
                return Err(Error::parse(
                    Section::Data,
                    label,
                    1,
                    "MT card lists no thermal tables",
                ));
            }
            if deck.thermals.insert(id, thermal).is_some() {
                return Err(duplicate(label, "thermal table card", id));
            }
        }
        ("tr", Some(id)) => {
            let tr = parse_transformation(card, id, starred)?;
            if deck.transformations.insert(id, tr).is_some() {
                return Err(duplicate(label, "transformation", id));
            }
        }
        _ => deck.passthrough.push(DataCard {
            name: label.to_string(),
            text: card.tokens[1..].join(" "),
            line: card.lines.0,
        }),
    }
    Ok(())
}

fn duplicate(label: &str, kind: &str, id: u32) -> Error {
    Error::parse(
        Section::Data,
        label,
        0,
        format!("{} {} is defined more than once", kind, id),
    )
}

fn parse_material(card: &RawCard, id: u32) -> Result<MaterialRecord, Error> {
    let label = card.label();
    let err = |field: usize, details: String| Error::parse(Section::Data, label, field, details);
    let items = split_assignments(&card.tokens[1..]);

    let mut components = Vec::new();
    let mut options = BTreeMap::new();
    let mut i = 0;
    while i < items.len() {
        let field = i + 1;
        let item = &items[i];
        if items.get(i + 1).is_some_and(|n| n == "=") {
            let value = items
                .get(i + 2)
                .ok_or_else(|| err(field, format!("keyword '{}' has no value", item)))?;
            options.insert(item.clone(), value.clone());
            i += 3;
            continue;
        }
        if !item.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(err(field, format!("'{}' is not a nuclide identifier", item)));
        }
        let raw = items
            .get(i + 1)
            .ok_or_else(|| err(field + 1, format!("nuclide '{}' has no fraction", item)))?;
        let fraction = numeric::parse_float(raw)
            .ok_or_else(|| err(field + 1, format!("'{}' is not a valid fraction", raw)))?;
        components.push((item.clone(), fraction));
        i += 2;
    }

    if components.is_empty() {
        return Err(err(1, "material lists no nuclides".to_string()));
    }

    Ok(MaterialRecord {
        id,
        components,
        options,
        line: card.lines.0,
    })
}

fn parse_transformation(card: &RawCard, id: u32, degrees: bool) -> Result<Transformation, Error> {
    let label = card.label();
    let err = |field: usize, details: String| Error::parse(Section::Data, label, field, details);
    let v = numeric::expand(&card.tokens[1..])
        .map_err(|FieldError { field, details }| err(field + 1, details))?;

    if !matches!(v.len(), 3 | 9 | 12 | 13) {
        return Err(err(
            v.len().min(13) + 1,
            format!("expected 3, 9, 12 or 13 entries, found {}", v.len()),
        ));
    }

    let mut displacement = [v[0], v[1], v[2]];
    if v.len() == 3 {
        return Ok(Transformation {
            id,
            displacement,
            rotation: None,
        });
    }

    let entry = |k: usize| {
        if degrees {
            v[k].to_radians().cos()
        } else {
            v[k]
        }
    };
    let mut columns = [[0.0; 3]; 3];
    for (j, column) in columns.iter_mut().enumerate().take(if v.len() == 9 { 2 } else { 3 }) {
        for (i, value) in column.iter_mut().enumerate() {
            *value = entry(3 + 3 * j + i);
        }
    }
    if v.len() == 9 {
        let [a, b, _] = columns;
        columns[2] = [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ];
    }

    let mut rotation = [[0.0; 3]; 3];
    for (j, column) in columns.iter().enumerate() {
        for (i, value) in column.iter().enumerate() {
            rotation[i][j] = *value;
        }
    }

    if v.len() == 13 {
        match v[12] {
            m if m == 1.0 => {}
            m if m == -1.0 => {
                let d = displacement;
                for (i, row) in rotation.iter().enumerate() {
                    displacement[i] = -(row[0] * d[0] + row[1] * d[1] + row[2] * d[2]);
                }
            }
            m => return Err(err(13, format!("origin flag must be 1 or -1, found {}", m))),
        }
    }

    Ok(Transformation {
        id,
        displacement,
        rotation: Some(rotation),
    })
}

/// Whether a token starts a cell parameter rather than geometry.
fn is_keyword(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => true,
        Some('*') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Re-splits tokens so that `=`, `(` and `)` stand alone.
fn split_assignments(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for tok in tokens {
        let mut current = String::new();
        for c in tok.chars() {
            if matches!(c, '=' | '(' | ')') {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                out.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

fn parse_params(
    tokens: &[String],
    first_field: usize,
    section: Section,
    label: &str,
) -> Result<BTreeMap<String, String>, Error> {
    let err = |details: String| Error::parse(section, label, first_field, details);
    let items = split_assignments(tokens);
    let mut params = BTreeMap::new();
    let mut i = 0;

    while i < items.len() {
        let key = &items[i];
        if !is_keyword(key) {
            return Err(err(format!("expected a parameter name, found '{}'", key)));
        }
        i += 1;
        if items.get(i).is_some_and(|t| t == "=") {
            i += 1;
        }

        let mut parts: Vec<String> = Vec::new();
        while i < items.len() {
            let item = &items[i];
            if item == "(" {
                let close = items[i..]
                    .iter()
                    .position(|t| t == ")")
                    .map(|p| i + p)
                    .ok_or_else(|| err(format!("unbalanced parenthesis in '{}'", key)))?;
                parts.push(format!("({})", items[i + 1..close].join(" ")));
                i = close + 1;
                continue;
            }
            if is_keyword(item) || item == "=" || item == ")" {
                break;
            }
            parts.push(item.clone());
            i += 1;
        }

        if parts.is_empty() {
            return Err(err(format!("parameter '{}' has no value", key)));
        }
        if params.insert(key.clone(), parts.join(" ")).is_some() {
            return Err(err(format!("parameter '{}' is given more than once", key)));
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::tokenizer::tokenize;

    fn parse_text(text: &str) -> Result<Deck, Error> {
        parse(tokenize(text)?)
    }

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn parses_void_cell_with_options() {
        let deck = parse_text("t\n1 0 -1 2 imp:n=1\n\n1 pz 0\n2 pz 10\n").unwrap();
        let cell = &deck.cells[0];
        assert_eq!(cell.id, 1);
        assert_eq!(cell.material, 0);
        assert_eq!(cell.density, None);
        assert_eq!(cell.geometry, vec!["-1", "2"]);
        assert_eq!(cell.options.get("imp:n").map(String::as_str), Some("1"));
    }

    #[test]
    fn parses_material_cell_and_fill_transform() {
        let deck =
            parse_text("t\n5 3 -7.8 -1 u = 2 fill=4 (1 0 0) vol 10\n\n1 so 5\n").unwrap();
        let cell = &deck.cells[0];
        assert_eq!(cell.material, 3);
        assert_eq!(cell.density, Some(-7.8));
        assert_eq!(cell.options.get("u").map(String::as_str), Some("2"));
        assert_eq!(
            cell.options.get("fill").map(String::as_str),
            Some("4 (1 0 0)")
        );
        assert_eq!(cell.options.get("vol").map(String::as_str), Some("10"));
    }

    #[test]
    fn resolves_like_but() {
        let text = "t\n1 1 0.1 -1 imp:n=1\n2 like 1 but mat=2 rho=-2.5 u=3\n\n1 so 5\n";
        let deck = parse_text(text).unwrap();
        let like = &deck.cells[1];
        assert_eq!(like.id, 2);
        assert_eq!(like.material, 2);
        assert_eq!(like.density, Some(-2.5));
        assert_eq!(like.geometry, vec!["-1"]);
        assert_eq!(like.options.get("u").map(String::as_str), Some("3"));
        assert_eq!(like.options.get("imp:n").map(String::as_str), Some("1"));
    }

    #[test]
    fn like_with_unknown_base_fails() {
        let err = parse_text("t\n2 like 9 but u=1\n\n1 so 5\n").unwrap_err();
        assert!(matches!(err, Error::Parse { section: Section::Cells, .. }));
    }

    #[test]
    fn parses_surfaces_with_prefix_and_transform() {
        let deck = parse_text("t\n1 0 -1\n\n*1 so 5\n+2 3 cz 1.5-1\n").unwrap();
        assert_eq!(deck.surfaces[0].boundary, BoundaryType::Reflective);
        assert_eq!(deck.surfaces[1].boundary, BoundaryType::White);
        assert_eq!(deck.surfaces[1].transform, Some(3));
        assert_eq!(deck.surfaces[1].mnemonic, Mnemonic::Cz);
        assert!(approx_eq(deck.surfaces[1].coefficients[0], 0.15, 1e-15));
    }

    #[test]
    fn surface_arity_mismatch_names_field() {
        let err = parse_text("t\n1 0 -1\n\n7 s 0 0 0\n").unwrap_err();
        match err {
            Error::Parse {
                section,
                card,
                field,
                ..
            } => {
                assert_eq!(section, Section::Surfaces);
                assert_eq!(card, "7");
                assert_eq!(field, 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn periodic_surfaces_are_rejected() {
        assert!(parse_text("t\n1 0 -1\n\n1 -2 px 0\n").is_err());
    }

    #[test]
    fn gq_keeps_ten_coefficients() {
        let deck = parse_text("t\n1 0 -1\n\n1 gq 1 1 1 0 0 0 0 0 0 -25\n").unwrap();
        assert_eq!(
            deck.surfaces[0].coefficients,
            vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -25.0]
        );
    }

    #[test]
    fn parses_material_with_keywords() {
        let deck =
            parse_text("t\n1 0 -1\n\n1 so 1\n\nm1 1001.70c 2 8016.70c 1 nlib=.80c\nmt1 lwtr.10t\n")
                .unwrap();
        let m = &deck.materials[&1];
        assert_eq!(
            m.components,
            vec![("1001.70c".to_string(), 2.0), ("8016.70c".to_string(), 1.0)]
        );
        assert_eq!(m.options.get("nlib").map(String::as_str), Some(".80c"));
        assert_eq!(deck.thermals[&1].tables, vec!["lwtr.10t"]);
    }

    #[test]
    fn material_with_dangling_nuclide_fails() {
        let err = parse_text("t\n1 0 -1\n\n1 so 1\n\nm1 1001 2 8016\n").unwrap_err();
        assert!(matches!(err, Error::Parse { field: 4, .. }));
    }

    #[test]
    fn parses_transformations() {
        let deck = parse_text(
            "t\n1 0 -1\n\n1 so 1\n\ntr1 1 2 3\n*tr2 0 0 0 90 0 90 180 90 90 90 90 0\n",
        )
        .unwrap();
        let tr1 = &deck.transformations[&1];
        assert_eq!(tr1.displacement, [1.0, 2.0, 3.0]);
        assert!(tr1.rotation.is_none());

        let r = deck.transformations[&2].rotation.unwrap();
        assert!(approx_eq(r[1][0], 1.0, 1e-12));
        assert!(approx_eq(r[0][1], -1.0, 1e-12));
        assert!(approx_eq(r[2][2], 1.0, 1e-12));
        assert!(approx_eq(r[0][0], 0.0, 1e-12));
    }

    #[test]
    fn transformation_with_inverted_origin() {
        let deck = parse_text(
            "t\n1 0 -1\n\n1 so 1\n\ntr1 1 0 0 0 1 0 -1 0 0 0 0 1 -1\n",
        )
        .unwrap();
        let tr = &deck.transformations[&1];
        assert!(approx_eq(tr.displacement[0], 0.0, 1e-12));
        assert!(approx_eq(tr.displacement[1], -1.0, 1e-12));
    }

    #[test]
    fn transformation_with_two_axes_completes_third() {
        let deck =
            parse_text("t\n1 0 -1\n\n1 so 1\n\ntr1 0 0 0 1 0 0 0 1 0\n").unwrap();
        let r = deck.transformations[&1].rotation.unwrap();
        assert_eq!(r, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn other_data_cards_pass_through() {
        let deck = parse_text("t\n1 0 -1\n\n1 so 1\n\nmode n\nnps 1000\nf4:n 1\n").unwrap();
        let names: Vec<_> = deck.passthrough.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["mode", "nps", "f4:n"]);
        assert_eq!(deck.passthrough[1].text, "1000");
    }

    #[test]
    fn duplicate_cells_fail() {
        assert!(parse_text("t\n1 0 -1\n1 0 1\n\n1 so 1\n").is_err());
    }
}
