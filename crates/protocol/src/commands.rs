use serde::{Deserialize, Serialize};

use crate::types::{Color, Point, Rect};

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` per figure. Backends consume the
/// list sequentially and paint in order, so command order is the z-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Filled rectangle. `label` is the legend/tooltip text, if any.
    DrawRect {
        rect: Rect,
        fill: Color,
        stroke: Option<Color>,
        label: Option<String>,
    },

    /// Filled closed polygon (self-identity diamonds, label triangles).
    DrawPolygon {
        points: Vec<Point>,
        fill: Color,
        stroke: Option<Color>,
    },

    /// Horizontal or diagonal arrow from `from` to `to`; the head sits at `to`.
    DrawArrow {
        from: Point,
        to: Point,
        shaft_width: f64,
        head_width: f64,
        head_length: f64,
        color: Color,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },

    /// Open polyline through `points`.
    DrawPolyline {
        points: Vec<Point>,
        color: Color,
        width: f64,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: Color,
        font_size: f64,
        align: TextAlign,
        /// Rotation in degrees, counter-clockwise.
        rotation: f64,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Push an affine transform (applied to all subsequent commands until
    /// the matching `PopTransform`).
    PushTransform { translate: Point, scale: Point },

    /// Pop the most recent transform.
    PopTransform,

    /// Begin a logical group (a panel, a legend).
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
