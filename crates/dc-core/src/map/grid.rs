//! A plain grid implementation of [`DungeonMap`]

use serde::{Deserialize, Serialize};

use super::{DungeonFeature, DungeonMap, TerrainFlags};
use crate::geom::Pos;

/// A spawned feature, kept for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub pos: Pos,
    pub feature: DungeonFeature,
    pub probability_decrement: Option<i32>,
}

/// Rectangular map of terrain flags with a per-cell visibility bit.
///
/// Spawned features, fire exposure and tunneling are recorded instead of
/// simulated, except that forcefields and webs mark their cell and
/// tunneling clears obstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    width: i32,
    height: i32,
    cells: Vec<TerrainFlags>,
    visible: Vec<bool>,
    pub spawned: Vec<SpawnRecord>,
    pub burned: Vec<Pos>,
    pub tunneled: Vec<Pos>,
}

impl GridMap {
    /// Open floor, fully visible
    pub fn new(width: i32, height: i32) -> Self {
        let n = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![TerrainFlags::empty(); n],
            visible: vec![true; n],
            spawned: Vec::new(),
            burned: Vec::new(),
            tunneled: Vec::new(),
        }
    }

    /// Open floor enclosed by impregnable walls on the outer ring
    pub fn walled(width: i32, height: i32) -> Self {
        let mut map = Self::new(width, height);
        for x in 0..width {
            for y in 0..height {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    map.set_flags(
                        Pos::new(x, y),
                        TerrainFlags::WALL | TerrainFlags::IMPREGNABLE,
                    );
                }
            }
        }
        map
    }

    fn index(&self, p: Pos) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y * self.width + p.x) as usize)
    }

    pub fn set_flags(&mut self, p: Pos, flags: TerrainFlags) {
        if let Some(i) = self.index(p) {
            self.cells[i] = flags;
        }
    }

    pub fn add_flags(&mut self, p: Pos, flags: TerrainFlags) {
        if let Some(i) = self.index(p) {
            self.cells[i] |= flags;
        }
    }

    /// Place an ordinary (tunnelable) wall
    pub fn add_wall(&mut self, p: Pos) {
        self.set_flags(p, TerrainFlags::WALL);
    }

    pub fn set_visible(&mut self, p: Pos, visible: bool) {
        if let Some(i) = self.index(p) {
            self.visible[i] = visible;
        }
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        self.visible.iter_mut().for_each(|v| *v = visible);
    }

    /// Features spawned at `p`, oldest first
    pub fn features_at(&self, p: Pos) -> impl Iterator<Item = DungeonFeature> + '_ {
        self.spawned
            .iter()
            .filter(move |r| r.pos == p)
            .map(|r| r.feature)
    }
}

impl DungeonMap for GridMap {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn terrain_flags(&self, p: Pos) -> TerrainFlags {
        self.index(p)
            .map(|i| self.cells[i])
            .unwrap_or_else(TerrainFlags::empty)
    }

    fn player_can_see(&self, p: Pos) -> bool {
        self.index(p).map(|i| self.visible[i]).unwrap_or(false)
    }

    fn spawn_feature(&mut self, p: Pos, feature: DungeonFeature, probability_decrement: Option<i32>) {
        if !self.in_bounds(p) {
            return;
        }
        match feature {
            DungeonFeature::Forcefield => self.add_flags(p, TerrainFlags::OBSTRUCTS_PASSABILITY),
            DungeonFeature::SpiderwebSmall | DungeonFeature::SpiderwebLarge => {
                self.add_flags(p, TerrainFlags::ENTANGLES)
            }
            _ => {}
        }
        self.spawned.push(SpawnRecord {
            pos: p,
            feature,
            probability_decrement,
        });
    }

    fn expose_to_fire(&mut self, p: Pos, always_ignite: bool) -> bool {
        if !self.in_bounds(p) {
            return false;
        }
        self.burned.push(p);
        always_ignite && self.cell_has_terrain_flag(p, TerrainFlags::IS_FLAMMABLE)
    }

    fn tunnelize(&mut self, p: Pos) -> bool {
        let Some(i) = self.index(p) else {
            return false;
        };
        if self.cells[i].contains(TerrainFlags::IMPREGNABLE)
            || !self.cells[i].intersects(TerrainFlags::OBSTRUCTS_BOLTS)
        {
            return false;
        }
        self.cells[i].remove(TerrainFlags::OBSTRUCTS_BOLTS);
        self.tunneled.push(p);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walled_map_edges() {
        let map = GridMap::walled(10, 6);
        assert!(map.cell_has_terrain_flag(Pos::new(0, 3), TerrainFlags::OBSTRUCTS_PASSABILITY));
        assert!(map.cell_has_terrain_flag(Pos::new(9, 5), TerrainFlags::IMPREGNABLE));
        assert!(map.terrain_flags(Pos::new(4, 3)).is_empty());
        assert!(map.terrain_flags(Pos::new(40, 3)).is_empty());
        assert!(!map.player_can_see(Pos::new(-1, 0)));
    }

    #[test]
    fn test_walls_block_diagonal_corners() {
        let mut map = GridMap::new(6, 6);
        map.add_wall(Pos::new(2, 1));
        assert!(map.diagonal_blocked(Pos::new(1, 1), Pos::new(2, 2)));
        assert!(map.diagonal_blocked(Pos::new(2, 2), Pos::new(1, 1)));
        assert!(!map.diagonal_blocked(Pos::new(2, 2), Pos::new(3, 3)));
        // orthogonal steps never cut a corner
        assert!(!map.diagonal_blocked(Pos::new(1, 1), Pos::new(1, 2)));
    }

    #[test]
    fn test_tunnelize_respects_impregnable() {
        let mut map = GridMap::walled(10, 6);
        map.add_wall(Pos::new(4, 3));
        assert!(!map.tunnelize(Pos::new(0, 0)));
        assert!(map.tunnelize(Pos::new(4, 3)));
        assert!(map.terrain_flags(Pos::new(4, 3)).is_empty());
        assert!(!map.tunnelize(Pos::new(4, 3)));
        assert_eq!(map.tunneled, vec![Pos::new(4, 3)]);
    }

    #[test]
    fn test_spawn_records_feature() {
        let mut map = GridMap::new(5, 5);
        map.spawn_feature(Pos::new(2, 2), DungeonFeature::Forcefield, Some(60));
        map.spawn_feature(Pos::new(9, 9), DungeonFeature::RedBlood, None);
        assert_eq!(map.spawned.len(), 1);
        assert_eq!(map.spawned[0].probability_decrement, Some(60));
        assert!(map.cell_has_terrain_flag(Pos::new(2, 2), TerrainFlags::OBSTRUCTS_PASSABILITY));
        assert_eq!(
            map.features_at(Pos::new(2, 2)).collect::<Vec<_>>(),
            vec![DungeonFeature::Forcefield]
        );
    }
}
