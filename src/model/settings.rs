/// Run settings of the assembled model.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub batches: u32,
    pub inactive: u32,
    pub particles: u64,
    pub summary: bool,
    /// Position of the point source.
    pub source: [f64; 3],
}
