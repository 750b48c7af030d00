use bevy::prelude::*;

/// World-space picking ray. `direction` is unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl PickRay {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Pointer position in viewport pixels (y down) to NDC (y up, -1..1).
pub fn pointer_to_ndc(pointer: Vec2, viewport: Rect) -> Option<Vec2> {
    let size = viewport.size();
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    let local = (pointer - viewport.min) / size;
    Some(Vec2::new(local.x * 2.0 - 1.0, 1.0 - local.y * 2.0))
}

/// Unproject an NDC position into a world ray.
///
/// Uses reverse-Z: depth 1 is the near plane. A second point halfway into
/// the depth range gives the direction, which stays finite for infinite
/// far planes.
pub fn ndc_to_ray(ndc: Vec2, world_from_clip: Mat4) -> Option<PickRay> {
    let near = world_from_clip.project_point3(ndc.extend(1.0));
    let mid = world_from_clip.project_point3(ndc.extend(0.5));
    let direction = (mid - near).normalize_or_zero();
    if direction == Vec3::ZERO || !near.is_finite() {
        return None;
    }
    Some(PickRay {
        origin: near,
        direction,
    })
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if ray_direction.x != 0.0 { 1.0 / ray_direction.x } else { f32::INFINITY },
        if ray_direction.y != 0.0 { 1.0 / ray_direction.y } else { f32::INFINITY },
        if ray_direction.z != 0.0 { 1.0 / ray_direction.z } else { f32::INFINITY },
    );

    let (mut tmin, mut tmax) = ((min.x - ray_origin.x) * inv.x, (max.x - ray_origin.x) * inv.x);
    if tmin > tmax { std::mem::swap(&mut tmin, &mut tmax); }

    let (mut tymin, mut tymax) = ((min.y - ray_origin.y) * inv.y, (max.y - ray_origin.y) * inv.y);
    if tymin > tymax { std::mem::swap(&mut tymin, &mut tymax); }

    if (tmin > tymax) || (tymin > tmax) { return None; }
    if tymin > tmin { tmin = tymin; }
    if tymax < tmax { tmax = tymax; }

    let (mut tzmin, mut tzmax) = ((min.z - ray_origin.z) * inv.z, (max.z - ray_origin.z) * inv.z);
    if tzmin > tzmax { std::mem::swap(&mut tzmin, &mut tzmax); }

    if (tmin > tzmax) || (tzmin > tmax) { return None; }
    if tzmin > tmin { tmin = tzmin; }
    if tzmax < tmax { tmax = tzmax; }

    if tmax < 0.0 { return None; }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Closest approach between a ray and segment `a`-`b`.
/// Returns `(distance, t)` with `t` the ray parameter at the closest point.
pub fn ray_segment_distance(ray: &PickRay, a: Vec3, b: Vec3) -> (f32, f32) {
    let u = ray.direction;
    let v = b - a;
    let w = ray.origin - a;

    let uu = u.dot(u);
    let uv = u.dot(v);
    let vv = v.dot(v);
    let uw = u.dot(w);
    let vw = v.dot(w);
    let denom = uu * vv - uv * uv;

    // Segment parameter, clamped to the segment; parallel lines fall back to `a`.
    let mut s = if denom > f32::EPSILON * vv.max(1.0) {
        ((uu * vw - uv * uw) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if vv <= f32::EPSILON {
        s = 0.0;
    }

    let point = a + v * s;
    let t = (point - ray.origin).dot(u) / uu;
    let t = t.max(0.0);
    (ray.at(t).distance(point), t)
}

pub fn ray_sphere_hit(ray: &PickRay, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        // Origin inside the sphere.
        Some(0.0)
    } else {
        None
    }
}

/// Möller–Trumbore, double sided.
pub fn ray_triangle_hit(ray: &PickRay, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}
