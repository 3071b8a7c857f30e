use crate::prelude::Viewport;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Pointer location in normalized device coordinates: x right, y up, both in
/// `[-1, 1]` across the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Drops non-finite input and clamps the rest onto the viewport.
    pub fn sanitized(self) -> Option<Self> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        Some(Self {
            x: self.x.clamp(-1.0, 1.0),
            y: self.y.clamp(-1.0, 1.0),
        })
    }

    pub fn from_screen(px: f64, py: f64, viewport: &Viewport) -> Self {
        Self {
            x: (px / viewport.width) * 2.0 - 1.0,
            y: -(py / viewport.height) * 2.0 + 1.0,
        }
    }

    /// Pixel position, origin at the top-left corner.
    pub fn to_screen(&self, viewport: &Viewport) -> (f64, f64) {
        (
            self.x * viewport.width / 2.0 + viewport.width / 2.0,
            -self.y * viewport.height / 2.0 + viewport.height / 2.0,
        )
    }
}

/// Half-line in display space. `direction` is always unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Option<Self> {
        if !direction.norm().is_finite() {
            return None;
        }
        let direction = direction.try_normalize(f64::EPSILON)?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, distance: f64) -> Vector3<f64> {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the first point inside the sphere, if the ray
    /// reaches it at all.
    pub fn intersect_sphere(&self, center: &Vector3<f64>, radius: f64) -> Option<f64> {
        let to_center = center - self.origin;
        let along = to_center.dot(&self.direction);
        let closest_sq = to_center.norm_squared() - along * along;
        let radius_sq = radius * radius;
        if closest_sq > radius_sq {
            return None;
        }

        let half_chord = (radius_sq - closest_sq).sqrt();
        let near = along - half_chord;
        let far = along + half_chord;
        if far < 0.0 {
            None
        } else if near < 0.0 {
            Some(far)
        } else {
            Some(near)
        }
    }
}

/// Perspective camera looking into display space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vector3<f64>,
    pub target: Vector3<f64>,
    pub up: Vector3<f64>,
    pub fov_y_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Camera on the +Z axis at `distance`, aimed at the globe center.
    pub fn looking_at_origin(distance: f64, aspect: f64) -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, distance),
            target: Vector3::zeros(),
            up: Vector3::y(),
            fov_y_deg: 60.0,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    fn basis(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let forward = (self.target - self.position)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(|| -Vector3::z());
        let right = forward
            .cross(&self.up)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::x);
        let up = right.cross(&forward);
        (forward, right, up)
    }

    fn half_extent(&self) -> f64 {
        (self.fov_y_deg.to_radians() / 2.0).tan()
    }

    /// Ray from the camera through the pointer.
    pub fn ray_through(&self, pointer: PointerPosition) -> Ray {
        let (forward, right, up) = self.basis();
        let half = self.half_extent();
        let direction = forward + right * (pointer.x * half * self.aspect) + up * (pointer.y * half);
        Ray::new(self.position, direction).unwrap_or(Ray {
            origin: self.position,
            direction: forward,
        })
    }

    /// Pointer coordinates at which `point` appears, or `None` when it lies
    /// behind the near plane or beyond the far plane.
    pub fn project(&self, point: &Vector3<f64>) -> Option<PointerPosition> {
        let (forward, right, up) = self.basis();
        let offset = point - self.position;
        let depth = offset.dot(&forward);
        if depth < self.near || depth > self.far {
            return None;
        }

        let half = self.half_extent();
        Some(PointerPosition {
            x: offset.dot(&right) / (depth * half * self.aspect),
            y: offset.dot(&up) / (depth * half),
        })
    }
}
