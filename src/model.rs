//! Data models for container load planning.
//!
//! This module defines the fundamental data structures of a packing run:
//! - `CaseKind` / `CaseSpec`: the two case types with their orientation lists
//! - `FreeRegion`: an available cuboid of container space
//! - `Placement`: a case fixed at a position with a chosen orientation
//! - `PackJob`: the validated input of one run
//!
//! All structures with spatial extent implement `Dimensional` from the
//! `types` module.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::geometry;
use crate::types::{Dimensional, Vec3};

/// Validation error for job data.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidCount(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::InvalidCount(msg) => write!(f, "Invalid count: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Helper function to validate a single dimension.
fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates all three components of an extent.
///
/// Degenerate extents fail fast here, before any placement attempt; they are
/// never clamped.
pub fn validate_extent(dims: (f64, f64, f64), label: &str) -> Result<(), ValidationError> {
    validate_dimension(dims.0, &format!("{} length", label))?;
    validate_dimension(dims.1, &format!("{} width", label))?;
    validate_dimension(dims.2, &format!("{} height", label))?;
    Ok(())
}

/// Validates a requested case count against the configured ceiling.
pub fn validate_requested(value: u32, name: &str, max: u32) -> Result<(), ValidationError> {
    if value > max {
        return Err(ValidationError::InvalidCount(format!(
            "{} must not exceed {}, got: {}",
            name, max, value
        )));
    }
    Ok(())
}

/// The two case types handled by the planner.
///
/// The planner is specialized to exactly these two, with a large-first
/// preference per region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    Large,
    Small,
}

impl CaseKind {
    /// Stable identifier used in responses and progress events.
    pub fn code(&self) -> &'static str {
        match self {
            CaseKind::Large => "large",
            CaseKind::Small => "small",
        }
    }
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One case type: its canonical extent and the precomputed orientation list.
///
/// The canonical extent keeps the edge lengths exactly as supplied
/// (unsorted); the orientation list is derived once per run and is immutable
/// for the run's duration.
#[derive(Clone, Debug)]
pub struct CaseSpec {
    pub kind: CaseKind,
    pub dims: (f64, f64, f64),
    orientations: Vec<Vec3>,
}

impl CaseSpec {
    /// Creates a case type with validation and precomputed orientations.
    ///
    /// # Parameters
    /// * `kind` - Large or small
    /// * `dims` - Edge lengths (length, width, height) as supplied
    ///
    /// # Returns
    /// `Ok(CaseSpec)` for valid extents, otherwise `Err(ValidationError)`
    pub fn new(kind: CaseKind, dims: (f64, f64, f64)) -> Result<Self, ValidationError> {
        validate_extent(dims, &format!("{} case", kind.code()))?;
        let orientations = geometry::orientations(dims);
        Ok(Self {
            kind,
            dims,
            orientations,
        })
    }

    /// The deduplicated orientation extents, in deterministic order.
    pub fn orientations(&self) -> &[Vec3] {
        &self.orientations
    }

    /// Volume of the canonical extent.
    ///
    /// Rotation preserves volume, so this is also the volume of every
    /// orientation.
    pub fn volume(&self) -> f64 {
        let (l, w, h) = self.dims;
        l * w * h
    }
}

impl Dimensional for CaseSpec {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

/// An axis-aligned cuboid of container space not yet known to be occupied.
///
/// Regions may geometrically overlap after splitting; the heuristic does not
/// guarantee disjointness and later placements depend on that property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeRegion {
    pub position: Vec3,
    pub dims: Vec3,
}

impl FreeRegion {
    /// Creates a new free region.
    #[inline]
    pub const fn new(position: Vec3, dims: Vec3) -> Self {
        Self { position, dims }
    }
}

impl Dimensional for FreeRegion {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// A case fixed at a position with a chosen orientation extent.
///
/// Immutable once recorded; the placement list's order is the discovery
/// order and has no other meaning.
///
/// # Fields
/// * `kind` - Which case type was placed
/// * `position` - Minimum corner (x, y, z) in the container
/// * `dims` - The chosen orientation extent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct Placement {
    pub kind: CaseKind,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([1265.0, 1105.0, 975.0]))]
    pub dims: (f64, f64, f64),
}

impl Dimensional for Placement {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

/// The validated input of one packing run.
///
/// Construction validates every extent and precomputes the orientation
/// lists, so the planner itself cannot fail.
///
/// # Fields
/// * `container` - Container extent (length, width, height)
/// * `large` - The large case type with its orientation list
/// * `small` - The small case type with its orientation list
/// * `requested_large` - Target count for large cases
/// * `requested_small` - Target count for small cases
#[derive(Clone, Debug)]
pub struct PackJob {
    pub container: (f64, f64, f64),
    pub large: CaseSpec,
    pub small: CaseSpec,
    pub requested_large: u32,
    pub requested_small: u32,
}

impl PackJob {
    /// Creates a job after validating all three extents.
    ///
    /// # Returns
    /// `Ok(PackJob)` for valid extents, otherwise `Err(ValidationError)`
    pub fn new(
        container: (f64, f64, f64),
        large_case: (f64, f64, f64),
        small_case: (f64, f64, f64),
        requested_large: u32,
        requested_small: u32,
    ) -> Result<Self, ValidationError> {
        validate_extent(container, "container")?;
        Ok(Self {
            container,
            large: CaseSpec::new(CaseKind::Large, large_case)?,
            small: CaseSpec::new(CaseKind::Small, small_case)?,
            requested_large,
            requested_small,
        })
    }

    /// Container extent as Vec3.
    #[inline]
    pub fn container_vec3(&self) -> Vec3 {
        Vec3::from_tuple(self.container)
    }

    /// Total container volume.
    pub fn container_volume(&self) -> f64 {
        let (l, w, h) = self.container;
        l * w * h
    }
}
