//! Ray/surface intersection geometry in the meridional plane.
//!
//! All math in this module happens on raw f64 SI values (meters); unit-carrying
//! positions are converted at the [`raytrace`](crate::raytrace) boundary. A surface is
//! either a spherical cap or a flat face, both centered on the optical axis (y = 0) and
//! bounded by a clear aperture radius.
use nalgebra::{Point2, Vector2};

/// minimum forward travel to count as an intersection (avoids re-hitting the same surface)
const MIN_TRAVEL: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SurfaceGeometry {
    /// spherical cap: vertex on the axis, signed radius (center at `vertex_x + radius`)
    Spherical {
        vertex_x: f64,
        radius: f64,
        aperture_radius: f64,
    },
    /// flat face at `vertex_x`
    Flat { vertex_x: f64, aperture_radius: f64 },
}

impl SurfaceGeometry {
    pub(crate) fn new(vertex_x: f64, radius: f64, aperture_radius: f64) -> Self {
        if radius.is_infinite() {
            Self::Flat {
                vertex_x,
                aperture_radius,
            }
        } else {
            Self::Spherical {
                vertex_x,
                radius,
                aperture_radius,
            }
        }
    }
    /// Intersect a ray (position, normalized direction) with this surface.
    ///
    /// Returns the nearest forward intersection on the optically used cap together with
    /// the local surface normal, oriented against the incoming direction. `None` means
    /// the ray misses the surface or falls outside the clear aperture.
    pub(crate) fn intersect_and_normal(
        &self,
        pos: &Point2<f64>,
        dir: &Vector2<f64>,
    ) -> Option<(Point2<f64>, Vector2<f64>)> {
        match self {
            Self::Flat {
                vertex_x,
                aperture_radius,
            } => {
                if dir.x.abs() < f64::EPSILON {
                    return None;
                }
                let travel = (vertex_x - pos.x) / dir.x;
                if travel < MIN_TRAVEL {
                    return None;
                }
                let hit = pos + travel * dir;
                if hit.y.abs() > *aperture_radius {
                    return None;
                }
                let normal = if dir.x > 0.0 {
                    Vector2::new(-1.0, 0.0)
                } else {
                    Vector2::new(1.0, 0.0)
                };
                Some((hit, normal))
            }
            Self::Spherical {
                vertex_x,
                radius,
                aperture_radius,
            } => {
                let center = Point2::new(vertex_x + radius, 0.0);
                let oc = pos - center;
                let half_b = dir.dot(&oc);
                let c = oc.norm_squared() - radius * radius;
                let discriminant = half_b * half_b - c;
                if discriminant < 0.0 {
                    return None;
                }
                let sqrt_d = discriminant.sqrt();
                // nearest forward hit on the cap that contains the vertex
                [-half_b - sqrt_d, -half_b + sqrt_d]
                    .into_iter()
                    .filter(|travel| *travel >= MIN_TRAVEL)
                    .map(|travel| pos + travel * dir)
                    .find(|hit| (hit.x - center.x) * radius < 0.0)
                    .filter(|hit| hit.y.abs() <= *aperture_radius)
                    .map(|hit| {
                        let mut normal = (hit - center).normalize();
                        if normal.dot(dir) > 0.0 {
                            normal = -normal;
                        }
                        (hit, normal)
                    })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_hit_and_normal() {
        let surface = SurfaceGeometry::new(0.01, f64::INFINITY, 0.025);
        let (hit, normal) = surface
            .intersect_and_normal(&Point2::new(-0.01, 0.005), &Vector2::new(1.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit.x, 0.01);
        assert_relative_eq!(hit.y, 0.005);
        assert_eq!(normal, Vector2::new(-1.0, 0.0));
    }
    #[test]
    fn flat_aperture_block() {
        let surface = SurfaceGeometry::new(0.0, f64::INFINITY, 0.025);
        assert!(surface
            .intersect_and_normal(&Point2::new(-0.01, 0.03), &Vector2::new(1.0, 0.0))
            .is_none());
    }
    #[test]
    fn flat_behind_ray() {
        let surface = SurfaceGeometry::new(-0.01, f64::INFINITY, 0.025);
        assert!(surface
            .intersect_and_normal(&Point2::new(0.0, 0.0), &Vector2::new(1.0, 0.0))
            .is_none());
    }
    #[test]
    fn sphere_axial_hit() {
        // convex front surface, R = 100 mm, vertex at origin
        let surface = SurfaceGeometry::new(0.0, 0.1, 0.025);
        let (hit, normal) = surface
            .intersect_and_normal(&Point2::new(-0.01, 0.0), &Vector2::new(1.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(hit.y, 0.0);
        assert_relative_eq!(normal.x, -1.0);
        assert_relative_eq!(normal.y, 0.0);
    }
    #[test]
    fn sphere_sag_hit() {
        let surface = SurfaceGeometry::new(0.0, 0.1, 0.025);
        let (hit, normal) = surface
            .intersect_and_normal(&Point2::new(-0.01, 0.02), &Vector2::new(1.0, 0.0))
            .unwrap();
        // sag of a 100 mm sphere at h = 20 mm
        assert_relative_eq!(hit.x, 0.1 - (0.1f64 * 0.1 - 0.02 * 0.02).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(hit.y, 0.02);
        // outward normal of the upper cap tilts up and against the ray
        assert!(normal.x < 0.0);
        assert!(normal.y > 0.0);
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
    }
    #[test]
    fn sphere_concave_cap_selection() {
        // concave rear surface of a biconvex lens: vertex at 10 mm, R = -100 mm,
        // center at -90 mm; the optically used cap is the right one
        let surface = SurfaceGeometry::new(0.01, -0.1, 0.025);
        let (hit, _) = surface
            .intersect_and_normal(&Point2::new(0.0, 0.01), &Vector2::new(1.0, 0.0))
            .unwrap();
        assert!(hit.x < 0.01);
        assert!((hit.x - (-0.09)) > 0.0);
    }
    #[test]
    fn sphere_aperture_block() {
        let surface = SurfaceGeometry::new(0.0, 0.1, 0.01);
        assert!(surface
            .intersect_and_normal(&Point2::new(-0.01, 0.02), &Vector2::new(1.0, 0.0))
            .is_none());
    }
    #[test]
    fn sphere_complete_miss() {
        let surface = SurfaceGeometry::new(0.0, 0.1, 0.099);
        assert!(surface
            .intersect_and_normal(&Point2::new(-0.01, 0.15), &Vector2::new(1.0, 0.0))
            .is_none());
    }
}
