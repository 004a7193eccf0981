/// Number of discrete collision layers.
///
/// Layer membership and filtering are stored as `u32` bitmasks, so this is fixed at 32.
pub const LAYER_COUNT: usize = 32;

/// Depth (meters) given to a flattened 2D box along the plane normal (+Z).
///
/// The solver never sees motion along Z, so this only needs to be non-degenerate
/// for mass/inertia computation.
pub const BOX_DEPTH: f32 = 1.0;

/// Physics world index that baked planar bodies are simulated in by default.
///
/// Keeping planar bodies in their own world stops them from interacting with regular
/// 3D bodies that share the same process.
pub const PLANAR_WORLD_INDEX: u32 = 1;

/// Gravity along -Y in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Default fixed simulation timestep in seconds.
pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

/// Squared tolerance used when deciding whether a lossy scale differs from identity.
pub const SCALE_EPS_SQ: f32 = 1.0e-10;

/// Volumes below this (m^3) are treated as degenerate when deriving per-unit-mass inertia.
pub const MIN_VOLUME: f32 = 1.0e-12;
