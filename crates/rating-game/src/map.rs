//! The value map players explore

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A cell as seen by a player: where it is and what it was worth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub index: Option<usize>,
    pub value: i32,
}

impl Cell {
    /// Placeholder for a memory slot that holds no cell yet
    pub const UNKNOWN: Cell = Cell {
        index: None,
        value: -1,
    };

    pub fn new(index: usize, value: i32) -> Self {
        Self {
            index: Some(index),
            value,
        }
    }

    pub fn is_known(&self) -> bool {
        self.index.is_some()
    }
}

/// Immutable assignment of a value to every cell.
///
/// Values are produced elsewhere; the map only stores them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MapData", into = "MapData")]
pub struct Map {
    values: Vec<i32>,
    side: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MapData {
    values: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    side: Option<usize>,
}

impl Map {
    pub fn new(values: Vec<i32>) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptyMap);
        }
        Ok(Self { values, side: None })
    }

    /// A `side x side` map stored row by row
    pub fn square(side: usize, values: Vec<i32>) -> Result<Self, ConfigError> {
        if values.len() != side * side {
            return Err(ConfigError::NotSquare {
                side,
                cells: values.len(),
            });
        }
        let mut map = Self::new(values)?;
        map.side = Some(side);
        Ok(map)
    }

    pub fn cell_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn value(&self, cell: usize) -> Option<i32> {
        self.values.get(cell).copied()
    }

    pub fn side(&self) -> Option<usize> {
        self.side
    }

    /// Column and row of a cell on a square map
    pub fn coordinates(&self, cell: usize) -> Option<(usize, usize)> {
        let side = self.side?;
        (cell < self.values.len()).then(|| (cell % side, cell / side))
    }
}

impl TryFrom<MapData> for Map {
    type Error = ConfigError;

    fn try_from(data: MapData) -> Result<Self, Self::Error> {
        match data.side {
            Some(side) => Map::square(side, data.values),
            None => Map::new(data.values),
        }
    }
}

impl From<Map> for MapData {
    fn from(map: Map) -> Self {
        MapData {
            values: map.values,
            side: map.side,
        }
    }
}
