use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "mcnp2xml",
    about = "Convert an MCNP input deck into OpenMC XML input files",
    version,
    author,
    before_help = crate::display::banner_for_help()
)]
pub struct Cli {
    /// MCNP input deck
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory receiving geometry.xml, materials.xml and settings.xml
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Run settings (TOML) replacing the built-in defaults
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Keep imp:n=0 cells instead of turning them into vacuum boundaries
    #[arg(long)]
    pub keep_imp_zero: bool,

    /// Keep px/py/pz surfaces as general planes
    #[arg(long)]
    pub no_plane_reduction: bool,

    /// Let cells share one surface where several cards describe the same
    /// surface
    #[arg(long)]
    pub merge_surfaces: bool,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
