//! Soil fertility stand-in.
//!
//! Prey graze soil when no bush is close. Grazing depletes a cell; cells
//! slowly regenerate.

use bevy_ecs::prelude::*;

use crate::components::{Vec2, WorldBounds};

/// Resource: fertility per soil cell
#[derive(Resource, Debug, Clone)]
pub struct SoilMap {
    cell_size: f32,
    cols: i32,
    rows: i32,
    max_fertility: f32,
    fertility: Vec<f32>,
}

impl SoilMap {
    pub fn new(bounds: &WorldBounds, cell_size: f32, max_fertility: f32) -> Self {
        let cols = (bounds.width / cell_size).ceil().max(1.0) as i32;
        let rows = (bounds.height / cell_size).ceil().max(1.0) as i32;
        Self {
            cell_size,
            cols,
            rows,
            max_fertility,
            fertility: vec![max_fertility; (cols * rows) as usize],
        }
    }

    fn slot(&self, position: Vec2) -> usize {
        let x = ((position.x / self.cell_size).floor() as i32).rem_euclid(self.cols);
        let y = ((position.y / self.cell_size).floor() as i32).rem_euclid(self.rows);
        (y * self.cols + x) as usize
    }

    /// Center of the soil cell containing `position`.
    pub fn cell_center(&self, position: Vec2) -> Vec2 {
        let x = ((position.x / self.cell_size).floor() as i32).rem_euclid(self.cols);
        let y = ((position.y / self.cell_size).floor() as i32).rem_euclid(self.rows);
        Vec2::new(
            (x as f32 + 0.5) * self.cell_size,
            (y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn fertility_at(&self, position: Vec2) -> f32 {
        self.fertility.get(self.slot(position)).copied().unwrap_or(0.0)
    }

    /// Removes up to `amount` fertility and returns what was actually taken.
    pub fn deplete(&mut self, position: Vec2, amount: f32) -> f32 {
        let slot = self.slot(position);
        match self.fertility.get_mut(slot) {
            Some(value) => {
                let taken = amount.min(*value).max(0.0);
                *value -= taken;
                taken
            }
            None => 0.0,
        }
    }

    pub fn regenerate(&mut self, amount: f32) {
        let max = self.max_fertility;
        for value in &mut self.fertility {
            *value = (*value + amount).min(max);
        }
    }
}
