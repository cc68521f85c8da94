//! Arc placement, viewport derivation and the matrices that carry a card onto
//! the screen.

/// Column-major 4x4, the layout WGSL expects for `mat4x4<f32>`.
pub type Mat4 = [[f32; 4]; 4];

/// World-space extent of the plane at z = 0 seen through the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub screen_width: f32,
    pub screen_height: f32,
    pub world_width: f32,
    pub world_height: f32,
}

impl Viewport {
    pub fn from_camera(screen_width: f32, screen_height: f32, fov_degrees: f32, distance: f32) -> Self {
        let world_height = 2.0 * (fov_degrees.to_radians() / 2.0).tan() * distance;
        let aspect = if screen_height > 0.0 {
            screen_width / screen_height
        } else {
            1.0
        };
        Self {
            screen_width,
            screen_height,
            world_width: world_height * aspect,
            world_height,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.world_width / self.world_height
    }

    pub fn half_width(&self) -> f32 {
        self.world_width / 2.0
    }
}

/// Vertical offset and Z-rotation of a card on the arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub y: f32,
    pub rotation: f32,
}

/// Circular arc spanning the viewport.
///
/// The arc passes through the viewport centre and dips (bend > 0) or rises
/// (bend < 0) by `|bend|` world units at the viewport edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub bend: f32,
}

impl Curve {
    pub fn new(bend: f32) -> Self {
        Self { bend }
    }

    pub fn is_flat(&self) -> bool {
        self.bend == 0.0
    }

    /// Radius of the circle through the centre and both viewport edges.
    pub fn radius(&self, half_width: f32) -> f32 {
        let b = self.bend.abs();
        (half_width * half_width + b * b) / (2.0 * b)
    }

    /// Distance the arc has dropped from its apex at horizontal offset `x`.
    /// Beyond the viewport edge the drop is held at its edge value.
    pub fn sagitta(&self, x: f32, half_width: f32) -> f32 {
        if self.is_flat() {
            return 0.0;
        }
        let r = self.radius(half_width);
        let clamped = x.abs().min(half_width);
        r - (r * r - clamped * clamped).max(0.0).sqrt()
    }

    pub fn place(&self, x: f32, half_width: f32) -> Placement {
        if self.is_flat() {
            return Placement {
                y: 0.0,
                rotation: 0.0,
            };
        }
        let r = self.radius(half_width);
        let clamped = x.abs().min(half_width);
        let arc = self.sagitta(x, half_width);
        let tilt = (clamped / r).clamp(-1.0, 1.0).asin();
        if self.bend > 0.0 {
            Placement {
                y: -arc,
                rotation: -sign(x) * tilt,
            }
        } else {
            Placement {
                y: arc,
                rotation: sign(x) * tilt,
            }
        }
    }
}

/// Sign with `sign(0) == 0`, so a centred card is never tilted.
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Which side of the viewport a card has fully left, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub is_before: bool,
    pub is_after: bool,
}

pub fn visibility(x: f32, card_width: f32, half_width: f32) -> Visibility {
    let half_card = card_width / 2.0;
    Visibility {
        is_before: x + half_card < -half_width,
        is_after: x - half_card > half_width,
    }
}

pub fn identity() -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// translate(x, y, 0) * rotate_z(rotation) * scale(width, height, 1)
pub fn model_matrix(x: f32, y: f32, rotation: f32, width: f32, height: f32) -> Mat4 {
    let (s, c) = rotation.sin_cos();
    [
        [c * width, s * width, 0.0, 0.0],
        [-s * height, c * height, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [x, y, 0.0, 1.0],
    ]
}

/// Right-handed perspective with a 0..1 depth range.
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y_degrees.to_radians() / 2.0).tan();
    let range = near - far;
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far / range, -1.0],
        [0.0, 0.0, near * far / range, 0.0],
    ]
}

/// Camera at (0, 0, distance) looking down -Z.
pub fn view_matrix(distance: f32) -> Mat4 {
    let mut view = identity();
    view[3][2] = -distance;
    view
}

pub fn mat_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (col, out_col) in out.iter_mut().enumerate() {
        for (row, cell) in out_col.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    out
}

pub fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, cell) in out.iter_mut().enumerate() {
        *cell = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
    }
    out
}
