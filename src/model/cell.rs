use super::region::Region;

/// Rotation matrix applied to a filling universe, rows in main-frame order.
pub type Rotation = [[f64; 3]; 3];

/// What occupies a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Void,
    Material(u32),
    Universe {
        id: u32,
        translation: Option<[f64; 3]>,
        rotation: Option<Rotation>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: u32,
    pub universe: u32,
    pub region: Region,
    pub fill: Fill,
    pub volume: Option<f64>,
}

/// A set of cells addressed together by id. Universe 0 is the root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Universe {
    pub id: u32,
    pub cells: Vec<u32>,
}
