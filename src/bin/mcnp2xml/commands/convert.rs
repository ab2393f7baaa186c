use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use mcnp_adapter::deck::{self, Deck};
use mcnp_adapter::{
    BoundaryType, ConvertConfig, SurfaceKind, TargetModel, convert, load_settings, xml,
};

use crate::cli::Cli;
use crate::display::{
    Context as DisplayContext, Progress, print_deck_info, print_model_summary,
    print_surface_types,
};
use crate::io::{create_output, ensure_dir, open_input, read_to_string};
use crate::util::text::count;

const TOTAL_STEPS: u8 = 3;

pub fn run(cli: Cli, ctx: DisplayContext) -> Result<()> {
    let config = build_config(&cli)?;

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading input deck");
    let deck = read_deck(&cli.input)?;
    progress.complete_step("Reading input deck", &read_substeps(&deck));

    if ctx.interactive {
        print_deck_info(&deck);
    }

    progress.step("Converting geometry and materials");
    let model = convert(&deck, &config).context("Conversion failed")?;
    progress.complete_step(
        "Converting geometry and materials",
        &convert_substeps(&model),
    );

    if ctx.interactive {
        print_model_summary(&model);
        print_surface_types(&model);
    }

    progress.step("Writing XML files");
    let written = write_outputs(&model, &cli.output)?;
    progress.complete_step("Writing XML files", &written);

    progress.finish();

    Ok(())
}

fn build_config(cli: &Cli) -> Result<ConvertConfig> {
    let settings = match &cli.settings {
        Some(path) => {
            let text = read_to_string(path)?;
            load_settings(Some(&text))
                .with_context(|| format!("Invalid settings file: {}", path.display()))?
        }
        None => load_settings(None)?,
    };

    Ok(ConvertConfig {
        vacuum_from_importance: !cli.keep_imp_zero,
        reduce_axis_planes: !cli.no_plane_reduction,
        merge_duplicate_surfaces: cli.merge_surfaces,
        settings,
    })
}

fn read_deck(path: &Path) -> Result<Deck> {
    let reader = open_input(path)?;
    deck::read(reader).with_context(|| format!("Failed to read deck: {}", path.display()))
}

fn read_substeps(deck: &Deck) -> Vec<String> {
    let mut steps = vec![
        format!("Parse {}", count(deck.cells.len(), "cell card")),
        format!("Parse {}", count(deck.surfaces.len(), "surface card")),
        format!(
            "Parse {} and {}",
            count(deck.materials.len(), "material"),
            count(deck.transformations.len(), "transformation")
        ),
    ];
    if !deck.passthrough.is_empty() {
        steps.push(format!(
            "Skip {}",
            count(deck.passthrough.len(), "untranslated data card")
        ));
    }
    steps
}

fn convert_substeps(model: &TargetModel) -> Vec<String> {
    let quadrics = model
        .surfaces
        .values()
        .filter(|s| matches!(s.kind, SurfaceKind::Quadric { .. }))
        .count();
    let vacuum = model
        .surfaces
        .values()
        .filter(|s| s.boundary == BoundaryType::Vacuum)
        .count();

    vec![
        format!(
            "Map {} ({} general quadric)",
            count(model.surfaces.len(), "surface"),
            quadrics
        ),
        format!("Build {}", count(model.cells.len(), "cell region")),
        format!(
            "Instantiate {}",
            count(model.materials.len(), "material")
        ),
        format!("Mark {}", count(vacuum, "vacuum boundary surface")),
    ]
}

/// Renders every file in memory, then writes them. Nothing reaches the
/// output directory unless all three rendered.
fn write_outputs(model: &TargetModel, dir: &Path) -> Result<Vec<String>> {
    let rendered = render_outputs(model)?;

    ensure_dir(dir)?;

    let mut written = Vec::new();
    for (name, bytes) in &rendered {
        let mut out = create_output(dir, name)?;
        out.writer
            .write_all(bytes)
            .with_context(|| format!("Failed to write {}", out.path.display()))?;
        written.push(finish_output(out)?);
    }

    Ok(written)
}

fn render_outputs(model: &TargetModel) -> Result<[(&'static str, Vec<u8>); 3]> {
    let mut geometry = Vec::new();
    xml::write_geometry(&mut geometry, model)
        .with_context(|| format!("Failed to render {}", xml::GEOMETRY_FILE))?;

    let mut materials = Vec::new();
    xml::write_materials(&mut materials, model)
        .with_context(|| format!("Failed to render {}", xml::MATERIALS_FILE))?;

    let mut settings = Vec::new();
    xml::write_settings(&mut settings, model)
        .with_context(|| format!("Failed to render {}", xml::SETTINGS_FILE))?;

    Ok([
        (xml::GEOMETRY_FILE, geometry),
        (xml::MATERIALS_FILE, materials),
        (xml::SETTINGS_FILE, settings),
    ])
}

fn finish_output(mut out: crate::io::OutputFile) -> Result<String> {
    out.writer
        .flush()
        .with_context(|| format!("Failed to write {}", out.path.display()))?;
    Ok(format!("Write {}", out.path.display()))
}
