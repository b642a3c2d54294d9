//! Triangle geometry and ray intersection
//!
//! CPU-side copy of every mesh. The renderer uploads it once; the raycaster
//! intersects against it in world space.

use glam::{Mat4, Vec3};

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit-length direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point along the ray at distance `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray from a perspective eye through a normalized-device-coordinate point
    pub fn from_ndc(eye: Vec3, ndc_x: f32, ndc_y: f32, inv_view_proj: Mat4) -> Self {
        let far = inv_view_proj.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Self::new(eye, far - eye)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Slab test; returns the entry distance when the ray hits the box
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if direction == 0.0 {
                // Parallel to this slab: inside it or a miss
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = direction.recip();
            let (t0, t1) = ((lo - origin) * inv, (hi - origin) * inv);
            t_min = t_min.max(t0.min(t1));
            t_max = t_max.min(t0.max(t1));
        }
        if t_max < 0.0 || t_min > t_max {
            None
        } else {
            Some(t_min.max(0.0))
        }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Axis-aligned box centred on the origin
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        // (normal, tangent u, tangent v) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut geometry = Self::default();
        for (normal, u, v) in faces {
            let base = geometry.positions.len() as u32;
            let center = normal * h;
            let du = u * h;
            let dv = v * h;
            for (corner, uv) in [
                (center - du - dv, [0.0, 1.0]),
                (center + du - dv, [1.0, 1.0]),
                (center + du + dv, [1.0, 0.0]),
                (center - du + dv, [0.0, 0.0]),
            ] {
                geometry.positions.push(corner);
                geometry.normals.push(normal);
                geometry.uvs.push(uv);
            }
            geometry
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounds, `None` for empty geometry
    pub fn bounds(&self) -> Option<Aabb> {
        let first = *self.positions.first()?;
        let (min, max) = self
            .positions
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Aabb { min, max })
    }

    /// Fill missing normals with flat per-triangle normals
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        self.normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= self.positions.len() || b >= self.positions.len() || c >= self.positions.len() {
                continue;
            }
            let n = (self.positions[b] - self.positions[a]).cross(self.positions[c] - self.positions[a]);
            for i in [a, b, c] {
                self.normals[i] += n;
            }
        }
        for n in &mut self.normals {
            *n = n.try_normalize().unwrap_or(Vec3::Y);
        }
    }

    /// Nearest intersection distance of a world-space ray with this geometry
    /// placed by `world`
    ///
    /// Triangles are treated as double sided. The ray is moved into local
    /// space, which keeps the ray parameter equal to the world distance.
    pub fn intersect_ray(&self, ray: &Ray, world: Mat4) -> Option<f32> {
        let det = world.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv = world.inverse();
        let origin = inv.transform_point3(ray.origin);
        let direction = inv.transform_vector3(ray.direction);

        if let Some(bounds) = self.bounds() {
            // Local direction is not unit length; only hit/miss is used
            let local = Ray {
                origin,
                direction,
            };
            bounds.intersect_ray(&local)?;
        }

        let mut nearest: Option<f32> = None;
        for tri in self.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (
                self.positions.get(tri[0] as usize),
                self.positions.get(tri[1] as usize),
                self.positions.get(tri[2] as usize),
            ) else {
                continue;
            };
            if let Some(t) = intersect_triangle(origin, direction, *a, *b, *c) {
                if nearest.map_or(true, |best| t < best) {
                    nearest = Some(t);
                }
            }
        }
        nearest
    }
}

/// Möller–Trumbore ray/triangle test, double sided
fn intersect_triangle(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPS: f32 = 1e-7;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPS).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_counts() {
        let cube = MeshGeometry::cuboid(Vec3::splat(1.0));
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        let bounds = cube.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
    }

    #[test]
    fn test_ray_hits_front_face() {
        let cube = MeshGeometry::cuboid(Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = cube.intersect_ray(&ray, Mat4::IDENTITY).unwrap();
        assert!((t - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_distance_is_world_space_under_scale() {
        let cube = MeshGeometry::cuboid(Vec3::splat(1.0));
        let world = Mat4::from_scale(Vec3::splat(2.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = cube.intersect_ray(&ray, world).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_misses() {
        let cube = MeshGeometry::cuboid(Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(cube.intersect_ray(&ray, Mat4::IDENTITY).is_none());
    }

    #[test]
    fn test_ray_grazing_box_face_hits() {
        let bounds = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        // Runs along the y = max face with a zero y and z component
        let grazing = Ray::new(Vec3::new(-5.0, 1.0, 0.0), Vec3::X);
        assert_eq!(bounds.intersect_ray(&grazing), Some(4.0));

        let beside = Ray::new(Vec3::new(-5.0, 1.5, 0.0), Vec3::X);
        assert!(bounds.intersect_ray(&beside).is_none());

        let inside = Ray::new(Vec3::new(0.0, -1.0, 0.5), Vec3::NEG_Z);
        assert_eq!(bounds.intersect_ray(&inside), Some(0.0));
    }

    #[test]
    fn test_ensure_normals_fills_missing() {
        let mut geometry = MeshGeometry {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        geometry.ensure_normals();
        assert_eq!(geometry.normals.len(), 3);
        assert!((geometry.normals[0] - Vec3::Z).length() < 1e-6);
    }
}
