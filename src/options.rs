//! [ModelOptions] and other helper types.

use crate::models::Model;

/// [ModelOptions] are passed to the [`init`](Model::init) method of [Model]
/// implementations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub struct ModelOptions {
    /// Subpixel order.
    pub color_order: ColorOrder,
    /// Initial display orientation.
    pub orientation: Orientation,
    /// Whether to invert colors for this display/model (INVON)
    pub invert_colors: ColorInversion,
    /// Display refresh order.
    pub refresh_order: RefreshOrder,
    /// Size of the visible area in the default orientation, `(width, height)`.
    pub display_size: (u16, u16),
    /// Offset of the visible area inside the controller framebuffer.
    pub display_offset: (u16, u16),
}

impl ModelOptions {
    /// Creates model options for the entire framebuffer.
    pub fn full_size<M: Model>() -> Self {
        Self {
            color_order: ColorOrder::default(),
            orientation: Orientation::default(),
            invert_colors: ColorInversion::default(),
            refresh_order: RefreshOrder::default(),
            display_size: M::FRAMEBUFFER_SIZE,
            display_offset: (0, 0),
        }
    }

    /// Returns the visible size in the current orientation.
    pub fn oriented_size(&self) -> (u16, u16) {
        if self.orientation.rotation.is_horizontal() {
            self.display_size
        } else {
            (self.display_size.1, self.display_size.0)
        }
    }
}

/// Color inversion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorInversion {
    /// Normal colors.
    #[default]
    Normal,
    /// Inverted colors.
    Inverted,
}

/// Display rotation, clockwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Returns `true` if the rotation keeps the native row direction.
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Deg0 | Self::Deg180)
    }

    /// Returns `true` for the two quarter turns.
    pub const fn is_vertical(self) -> bool {
        !self.is_horizontal()
    }
}

/// Display orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Orientation {
    /// Rotation.
    pub rotation: Rotation,
    /// Mirrored.
    pub mirrored: bool,
}

impl Orientation {
    /// Creates a default orientation.
    pub const fn new() -> Self {
        Self {
            rotation: Rotation::Deg0,
            mirrored: false,
        }
    }

    /// Rotates the orientation.
    #[must_use]
    pub const fn rotate(self, rotation: Rotation) -> Self {
        Self { rotation, ..self }
    }

    /// Flips the orientation horizontally.
    #[must_use]
    pub const fn flip_horizontal(self) -> Self {
        Self {
            mirrored: !self.mirrored,
            ..self
        }
    }
}

/// Memory mapping.
///
/// A memory mapping describes how a framebuffer is mapped to the physical
/// row and columns of a display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryMapping {
    /// Rows and columns are swapped.
    pub swap_rows_and_columns: bool,
    /// Rows are reversed.
    pub reverse_rows: bool,
    /// Columns are reversed.
    pub reverse_columns: bool,
}

impl From<Orientation> for MemoryMapping {
    fn from(orientation: Orientation) -> Self {
        let (reverse_rows, reverse_columns) = match orientation.rotation {
            Rotation::Deg0 => (false, false),
            Rotation::Deg90 => (true, false),
            Rotation::Deg180 => (true, true),
            Rotation::Deg270 => (false, true),
        };

        Self {
            swap_rows_and_columns: orientation.rotation.is_vertical(),
            reverse_rows,
            reverse_columns: reverse_columns ^ orientation.mirrored,
        }
    }
}

/// Subpixel order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorOrder {
    /// RGB subpixel order.
    #[default]
    Rgb,
    /// BGR subpixel order.
    Bgr,
}

/// Display refresh order, the direction the controller scans its RAM.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshOrder {
    pub vertical: VerticalRefreshOrder,
    pub horizontal: HorizontalRefreshOrder,
}

impl RefreshOrder {
    pub const fn new(vertical: VerticalRefreshOrder, horizontal: HorizontalRefreshOrder) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VerticalRefreshOrder {
    #[default]
    TopToBottom,
    BottomToTop,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HorizontalRefreshOrder {
    #[default]
    LeftToRight,
    RightToLeft,
}
