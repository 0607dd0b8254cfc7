use crate::domain::models::{DragOffset, GeometrySample, LayoutConfig};

/// Static dimensions the geometry is computed against, derived once from
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport_height: f32,
    pub half_height: f32,
    pub background_height: f32,
    pub background_centering_offset: f32,
    pub default_handle_width: f32,
    pub grabbed_handle_width: f32,
    pub handle_height: f32,
    pub anchor_offset: f32,
    pub parallax_divisor: f32,
}

impl Layout {
    pub fn from_config(config: &LayoutConfig) -> Self {
        let background_height = config.viewport_height + config.background_extra_height;
        let divisor = if config.parallax_divisor.abs() < f32::EPSILON {
            1.0
        } else {
            config.parallax_divisor
        };
        Self {
            viewport_height: config.viewport_height,
            half_height: (config.viewport_height / 2.0).ceil(),
            background_height,
            background_centering_offset: (config.viewport_height - background_height) / 2.0,
            default_handle_width: config.viewport_width + config.handle_width_padding,
            grabbed_handle_width: (config.viewport_width - config.grabbed_width_inset).max(0.0),
            handle_height: config.handle_height,
            anchor_offset: config.handle_anchor_offset,
            parallax_divisor: divisor,
        }
    }

    pub fn compute_positions(
        &self,
        drag_x: f32,
        drag_y: f32,
        offset_x: f32,
        offset_y: f32,
    ) -> GeometrySample {
        let handle_y = offset_y + drag_y - self.anchor_offset;
        GeometrySample {
            handle_x: offset_x + drag_x,
            handle_y,
            background_y: handle_y / self.parallax_divisor + self.background_centering_offset,
        }
    }

    /// Geometry of the handle resting at `offset` with no drag applied.
    pub fn resting_sample(&self, offset: DragOffset) -> GeometrySample {
        self.compute_positions(0.0, 0.0, offset.x, offset.y)
    }

    /// Resting offset for a committed state: above center when on, below
    /// when off.
    pub fn resting_offset(&self, on: bool, distance: f32) -> DragOffset {
        DragOffset {
            x: 0.0,
            y: if on { -distance } else { distance },
        }
    }
}
