/// Stroke widths at or below this many pixels use hairline primitives.
pub const THIN_LINE_THRESHOLD_PX: f32 = 1.5;

/// Initial wiring stroke width in pixels.
pub const DEFAULT_LINE_WIDTH_PX: f32 = 0.8;
pub const MIN_LINE_WIDTH_PX: f32 = 0.5;
pub const MAX_LINE_WIDTH_PX: f32 = 8.0;

pub const DEFAULT_SHELL_OPACITY: f32 = 0.25;
pub const DEFAULT_BUNDLE_OPACITY: f32 = 0.9;
pub const DEFAULT_FUNCTIONAL_OPACITY: f32 = 0.85;

/// Largest cutaway ratio; a full cut would leave nothing to orient against.
pub const MAX_CUTAWAY: f32 = 0.95;

/// Functional node radius in millimetres before per-network multipliers.
pub const NODE_BASE_SIZE_MM: f32 = 4.0;
pub const MIN_NODE_SIZE_MM: f32 = 1.0;
pub const MAX_NODE_SIZE_MM: f32 = 12.0;

/// Radius multiplier applied to default-mode network nodes.
pub const DEFAULT_MODE_BOOST: f32 = 1.5;
pub const MAX_NODE_BOOST: f32 = 3.0;

/// Id of the network that receives the boost.
pub const DEFAULT_MODE_NETWORK_ID: &str = "dmn";

/// Dash pattern for dashed functional edges, in millimetres.
pub const EDGE_DASH_MM: f32 = 3.0;
pub const EDGE_GAP_MM: f32 = 2.0;

/// Emissive multiplier applied to line and node colours while glow is on.
pub const GLOW_INTENSITY: f32 = 4.0;

/// Pointer tolerance for line picking, in pixels.
pub const PICK_TOLERANCE_PX: f32 = 6.0;

/// Tooltip offset from the pointer, in pixels.
pub const TOOLTIP_OFFSET_PX: f32 = 14.0;

/// Camera distance as a multiple of the framed box's largest dimension.
pub const FRAME_DISTANCE_FACTOR: f32 = 2.0;

/// Near/far clip planes as fractions/multiples of the framing distance.
pub const FRAME_NEAR_FACTOR: f32 = 0.01;
pub const FRAME_FAR_FACTOR: f32 = 100.0;
