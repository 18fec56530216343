//! # Engine Primitives
//!
//! Compiled-in constants for the PhilsAxioms core.
//!
//! Layout defaults are cosmetic and can be overridden through
//! [`LayoutConfig`](crate::layout::LayoutConfig); the input limits guard the
//! authoring endpoints against oversized payloads.

/// Vertical distance between two adjacent levels, in pixels.
pub const DEFAULT_LEVEL_HEIGHT: i64 = 500;

/// Rendered node width, in pixels.
pub const DEFAULT_NODE_WIDTH: i64 = 280;

/// Rendered node height, in pixels.
pub const DEFAULT_NODE_HEIGHT: i64 = 150;

/// Gap between neighbouring nodes on the same level, in pixels.
pub const DEFAULT_HORIZONTAL_SPACING: i64 = 150;

/// Distance from the top of the canvas to the highest level, in pixels.
pub const DEFAULT_VERTICAL_OFFSET: i64 = 200;

/// Level given to arguments whose dependencies never bottom out at an axiom.
pub const FALLBACK_LEVEL: u32 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a node id.
pub const MAX_NODE_ID_LENGTH: usize = 128;

/// Maximum length of a node title.
pub const MAX_TITLE_LENGTH: usize = 512;

/// Maximum length of descriptions and conclusions (64KB).
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Maximum number of dependency edges on a single node.
pub const MAX_EDGES_PER_NODE: usize = 256;

/// Maximum number of ids in a single accepted or rejected set.
pub const MAX_SELECTION_SIZE: usize = 10000;
