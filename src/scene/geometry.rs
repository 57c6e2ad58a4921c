//! Geometry generators for the procedural bouquet

use super::graph::Mesh;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > f32::EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}

/// UV sphere (same vertex layout and winding as Three.js SphereGeometry), stretched along Y
pub fn uv_sphere(name: &str, radius: f32, stretch_y: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;

            let unit = [
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ];
            positions.push([unit[0] * radius, unit[1] * radius * stretch_y, unit[2] * radius]);
            normals.push(normalize(unit));
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Mesh {
        name: name.to_string(),
        positions,
        normals,
        indices,
    }
}

/// Extrudes a counter-clockwise outline along Z. Caps are fanned from `center`, so the outline
/// must be star-shaped with respect to it.
pub fn extrude_outline(name: &str, outline: &[[f32; 2]], center: [f32; 2], depth: f32) -> Mesh {
    let half = depth / 2.0;
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    let count = outline.len() as u32;

    // 正面 / 背面
    for (z, normal) in [(half, [0.0, 0.0, 1.0]), (-half, [0.0, 0.0, -1.0])] {
        let base = positions.len() as u32;
        positions.push([center[0], center[1], z]);
        normals.push(normal);
        for point in outline {
            positions.push([point[0], point[1], z]);
            normals.push(normal);
        }
        for i in 0..count {
            let current = base + 1 + i;
            let next = base + 1 + (i + 1) % count;
            if z > 0.0 {
                indices.extend_from_slice(&[base, current, next]);
            } else {
                indices.extend_from_slice(&[base, next, current]);
            }
        }
    }

    // 側面，每條邊獨立頂點以保持硬邊法線
    for i in 0..outline.len() {
        let p0 = outline[i];
        let p1 = outline[(i + 1) % outline.len()];
        let normal = normalize([p1[1] - p0[1], p0[0] - p1[0], 0.0]);

        let base = positions.len() as u32;
        positions.extend_from_slice(&[
            [p0[0], p0[1], half],
            [p0[0], p0[1], -half],
            [p1[0], p1[1], -half],
            [p1[0], p1[1], half],
        ]);
        normals.extend_from_slice(&[normal; 4]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh {
        name: name.to_string(),
        positions,
        normals,
        indices,
    }
}

pub fn heart_outline(size: f32, segments: u32) -> Vec<[f32; 2]> {
    let scale = size / 17.0;
    (0..segments.max(8))
        .map(|i| {
            let t = i as f32 / segments.max(8) as f32 * TAU;
            // 取 -x 讓輪廓為逆時針
            let x = -16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            [x * scale, y * scale]
        })
        .collect()
}

pub fn star_outline(outer_radius: f32, inner_radius: f32, points: u32) -> Vec<[f32; 2]> {
    let corners = points.max(3) * 2;
    (0..corners)
        .map(|i| {
            let angle = FRAC_PI_2 + i as f32 / corners as f32 * TAU;
            let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
            [radius * angle.cos(), radius * angle.sin()]
        })
        .collect()
}

/// Open cylinder along Y, centred on the origin, unit height unless scaled
pub fn cylinder(name: &str, radius: f32, height: f32, radial_segments: u32) -> Mesh {
    let segments = radial_segments.max(3);
    let half = height / 2.0;
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=segments {
        let theta = i as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        positions.push([radius * cos, -half, radius * sin]);
        positions.push([radius * cos, half, radius * sin]);
        normals.push([cos, 0.0, sin]);
        normals.push([cos, 0.0, sin]);
    }

    for i in 0..segments {
        let b0 = i * 2;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        indices.extend_from_slice(&[b0, t0, b1, b1, t0, t1]);
    }

    Mesh {
        name: name.to_string(),
        positions,
        normals,
        indices,
    }
}
