use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const SPHERE: &str = "\
Bare sphere
1 1 -10.0 -1 imp:n=1
2 0 1 imp:n=0

1 so 8.5

m1 92235.70c 1
";

fn mcnp2xml() -> Command {
    Command::cargo_bin("mcnp2xml").unwrap()
}

fn write_deck(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn writes_three_xml_files() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(&dir, "sphere.i", SPHERE);
    let out = dir.path().join("model");

    mcnp2xml()
        .arg(&deck)
        .arg("-o")
        .arg(&out)
        .arg("-q")
        .assert()
        .success();

    let geometry = fs::read_to_string(out.join("geometry.xml")).unwrap();
    let materials = fs::read_to_string(out.join("materials.xml")).unwrap();
    let settings = fs::read_to_string(out.join("settings.xml")).unwrap();

    assert!(geometry.starts_with("<?xml version='1.0' encoding='utf-8'?>\n<geometry>"));
    assert!(geometry.contains("boundary=\"vacuum\""));
    assert!(materials.contains("<nuclide ao=\"1\" name=\"U235\" />"));
    assert!(settings.contains("<batches>40</batches>"));
}

#[test]
fn keep_imp_zero_retains_the_outside_cell() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(&dir, "sphere.i", SPHERE);

    mcnp2xml()
        .arg(&deck)
        .arg("--output")
        .arg(dir.path())
        .arg("--keep-imp-zero")
        .arg("--quiet")
        .assert()
        .success();

    let geometry = fs::read_to_string(dir.path().join("geometry.xml")).unwrap();
    assert!(geometry.contains("<cell id=\"2\""));
    assert!(!geometry.contains("vacuum"));
}

#[test]
fn settings_file_overrides_run_parameters() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(&dir, "sphere.i", SPHERE);
    let settings = write_deck(
        &dir,
        "run.toml",
        "batches = 100\nparticles = 5000\nsource = [1.0, 2.0, 3.0]\n",
    );

    mcnp2xml()
        .arg(&deck)
        .arg("-o")
        .arg(dir.path())
        .arg("--settings")
        .arg(&settings)
        .arg("-q")
        .assert()
        .success();

    let xml = fs::read_to_string(dir.path().join("settings.xml")).unwrap();
    assert!(xml.contains("<batches>100</batches>"));
    assert!(xml.contains("<particles>5000</particles>"));
    assert!(xml.contains("<parameters>1 2 3</parameters>"));
}

#[test]
fn conversion_errors_exit_with_failure() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(&dir, "bad.i", "Missing material\n1 7 -1.0 -1\n\n1 so 1\n");

    mcnp2xml()
        .arg(&deck)
        .arg("-o")
        .arg(dir.path())
        .arg("-q")
        .assert()
        .code(1)
        .stderr(contains("Conversion failed").and(contains("dangling reference in cell card")));

    assert!(!dir.path().join("geometry.xml").exists());
}

#[test]
fn unsupported_surfaces_are_reported() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(&dir, "rpp.i", "Box\n1 0 -1\n\n1 rpp 0 1 0 1 0 1\n");

    mcnp2xml()
        .arg(&deck)
        .arg("-o")
        .arg(dir.path())
        .arg("-q")
        .assert()
        .failure()
        .stderr(contains("unsupported surface type").and(contains("Macrobodies")));
}

#[test]
fn missing_input_file_is_reported() {
    let dir = TempDir::new().unwrap();

    mcnp2xml()
        .arg(dir.path().join("absent.i"))
        .arg("-q")
        .assert()
        .failure()
        .stderr(contains("Failed to open input file"));
}

#[test]
fn merge_surfaces_collapses_repeated_cards() {
    let dir = TempDir::new().unwrap();
    let deck = write_deck(
        &dir,
        "twins.i",
        "Two cards, one sphere\n1 0 -1\n2 0 -2 imp:n=1\n3 0 2 imp:n=0\n\n1 so 3\n2 so 3\n",
    );

    mcnp2xml()
        .arg(&deck)
        .arg("-o")
        .arg(dir.path())
        .arg("--merge-surfaces")
        .arg("-q")
        .assert()
        .success();

    let geometry = fs::read_to_string(dir.path().join("geometry.xml")).unwrap();
    assert!(geometry.contains("<surface id=\"1\""));
    assert!(!geometry.contains("<surface id=\"2\""));
}
