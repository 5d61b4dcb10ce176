// ---------------------------------------------------------------------------
// Gravitational parameters and radii (km, s)
// ---------------------------------------------------------------------------

pub const MU_EARTH: f64 = 398_600.441_8; // km^3/s^2
pub const MU_SUN: f64 = 1.327_124_400_18e11; // km^3/s^2
pub const R_EARTH: f64 = 6_378.137; // equatorial radius, km
