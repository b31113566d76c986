use crate::config::DEFAULT_CELL_SIZE;
use crate::error::ConfigError;
use crate::model::{Point, SpatialObject};
use std::collections::HashMap;

/// Integer coordinates of a grid cell.
pub type CellKey = (i64, i64);

/// Uniform-grid spatial index over point objects.
///
/// Each object lives in exactly one square cell of side `cell_size`. Queries
/// only look at the cells a query circle can reach, so local lookups stay
/// cheap regardless of how many objects are indexed. The cell size is a tuning
/// knob: results are always identical to a brute-force scan.
///
/// Generic over `T` to allow indexing any type that implements [`SpatialObject`].
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    cell_size: f32,
    cells: HashMap<CellKey, HashMap<String, T>>,
    locations: HashMap<String, CellKey>,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            cells: HashMap::new(),
            locations: HashMap::new(),
        }
    }
}

impl<T> SpatialIndex<T> {
    pub fn new(cell_size: f32) -> Result<Self, ConfigError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            ..Self::default()
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locations.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        let key = self.locations.get(id)?;
        self.cells.get(key)?.get(id)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.locations.clear();
    }

    /// Remove an object by id. No-op if it is not indexed.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let key = self.locations.remove(id)?;
        let cell = self.cells.get_mut(&key)?;
        let removed = cell.remove(id);
        if cell.is_empty() {
            self.cells.remove(&key);
        }
        removed
    }

    /// Iterator over all indexed objects, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.cells.values().flat_map(|cell| cell.values())
    }

    pub fn cell_of(&self, point: Point) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
        )
    }
}

impl<T> SpatialIndex<T>
where
    T: SpatialObject,
{
    /// Index an object. Re-inserting an indexed id replaces the old entry.
    pub fn insert(&mut self, object: T) {
        let id = object.id().to_string();
        self.remove(&id);
        let key = self.cell_of(object.position());
        self.cells.entry(key).or_default().insert(id.clone(), object);
        self.locations.insert(id, key);
    }

    /// Move an object to its new position.
    ///
    /// An object that stays within its cell is refreshed in place without
    /// touching the cell maps. Unknown ids are inserted.
    pub fn update(&mut self, object: T) {
        let key = self.cell_of(object.position());
        if self.locations.get(object.id()) == Some(&key) {
            if let Some(slot) = self
                .cells
                .get_mut(&key)
                .and_then(|cell| cell.get_mut(object.id()))
            {
                *slot = object;
            }
            return;
        }
        self.insert(object);
    }

    /// All objects within `radius` of `(x, y)`, boundary inclusive.
    pub fn query(&self, x: f32, y: f32, radius: f32) -> Vec<&T> {
        let center = Point::new(x, y);
        if !(radius >= 0.0) || !center.is_finite() || self.cells.is_empty() {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let within = |object: &&T| object.position().distance_squared(center) <= radius_sq;

        let (cx, cy) = self.cell_of(center);
        let span = (radius / self.cell_size).ceil() as i64;
        let (min_x, max_x) = (cx.saturating_sub(span), cx.saturating_add(span));
        let (min_y, max_y) = (cy.saturating_sub(span), cy.saturating_add(span));

        // A huge radius covers more cells than are occupied: walk the occupied ones.
        let side = (span as i128) * 2 + 1;
        if side.saturating_mul(side) > self.cells.len() as i128 {
            return self
                .cells
                .iter()
                .filter(|((kx, ky), _)| {
                    (min_x..=max_x).contains(kx) && (min_y..=max_y).contains(ky)
                })
                .flat_map(|(_, cell)| cell.values())
                .filter(within)
                .collect();
        }

        let mut found = Vec::new();
        for gx in min_x..=max_x {
            for gy in min_y..=max_y {
                if let Some(cell) = self.cells.get(&(gx, gy)) {
                    found.extend(cell.values().filter(within));
                }
            }
        }
        found
    }

    /// The closest object within `radius`. Equal distances resolve to the
    /// smallest id so the answer does not depend on hash order.
    pub fn find_nearest(&self, x: f32, y: f32, radius: f32) -> Option<&T> {
        let center = Point::new(x, y);
        self.query(x, y, radius)
            .into_iter()
            .map(|object| (object.position().distance_squared(center), object))
            .min_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id().cmp(b.id())))
            .map(|(_, object)| object)
    }
}
