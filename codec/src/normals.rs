//! Octahedral normal mapping and mesh normal estimation.
//!
//! Normals travel as 2D octahedron coordinates quantized to an integer
//! grid. Decoding either applies per-vertex diffs directly or estimates
//! normals from the reconstructed positions and faces, correcting only
//! where the stream says the estimate is unreliable.

use glam::Vec3;

/// Projects a direction onto the octahedron and quantizes to `unit`.
pub fn to_octa(v: Vec3, unit: i32) -> [i32; 2] {
    let len = v.x.abs() + v.y.abs() + v.z.abs();
    let mut p = [v.x / len, v.y / len];
    if v.z < 0.0 {
        p = [1.0 - p[1].abs(), 1.0 - p[0].abs()];
        if v.x < 0.0 {
            p[0] = -p[0];
        }
        if v.y < 0.0 {
            p[1] = -p[1];
        }
    }
    let unit = unit as f32;
    [(p[0] * unit) as i32, (p[1] * unit) as i32]
}

/// Lifts a quantized octahedron point back to a unit direction.
pub fn to_sphere(v: [i32; 2], unit: i32) -> Vec3 {
    let mut n = Vec3::new(
        v[0] as f32,
        v[1] as f32,
        (unit - v[0].abs() - v[1].abs()) as f32,
    );
    if n.z < 0.0 {
        let sx = if v[0] > 0 { 1 } else { -1 };
        let sy = if v[1] > 0 { 1 } else { -1 };
        n.x = (sx * (unit - v[1].abs())) as f32;
        n.y = (sy * (unit - v[0].abs())) as f32;
    }
    n / n.length()
}

/// Accumulates area-weighted face normals per vertex from quantized
/// positions. Face indices must already be validated against `nvert`.
pub fn estimate_normals(nvert: usize, positions: &[i32], faces: &[u32]) -> Vec<Vec3> {
    let corner = |v: u32| {
        let i = v as usize * 3;
        Vec3::new(
            positions[i] as f32,
            positions[i + 1] as f32,
            positions[i + 2] as f32,
        )
    };
    let mut estimated = vec![Vec3::ZERO; nvert];
    for f in faces.chunks_exact(3) {
        let v0 = corner(f[0]);
        let v1 = corner(f[1]);
        let v2 = corner(f[2]);
        let n = (v1 - v0).cross(v2 - v0);
        estimated[f[0] as usize] += n;
        estimated[f[1] as usize] += n;
        estimated[f[2] as usize] += n;
    }
    estimated
}

/// Marks boundary vertices: interior vertices see every neighbour twice in
/// their incident faces, so the running XOR of opposite corners cancels to
/// zero exactly on closed fans.
pub fn mark_boundary(nvert: usize, faces: &[u32]) -> Vec<i32> {
    let mut boundary = vec![0i32; nvert];
    for f in faces.chunks_exact(3) {
        boundary[f[0] as usize] ^= f[1] as i32 ^ f[2] as i32;
        boundary[f[1] as usize] ^= f[2] as i32 ^ f[0] as i32;
        boundary[f[2] as usize] ^= f[0] as i32 ^ f[1] as i32;
    }
    boundary
}

/// Resolves final unit normals from estimates plus the decoded corrections.
///
/// Corrected vertices (all of them under full estimation, boundary vertices
/// only under border prediction) consume one 2D diff each, in vertex order.
/// The rest keep their normalized estimate, falling back to +Z when the
/// estimate is degenerate.
pub fn correct_estimates(
    estimated: &[Vec3],
    boundary: &[i32],
    diffs: &[i32],
    unit: i32,
    correct_all: bool,
) -> Vec<Vec3> {
    let mut count = 0usize;
    let mut normals = Vec::with_capacity(estimated.len());
    for (i, &e) in estimated.iter().enumerate() {
        if correct_all || boundary[i] != 0 {
            let d0 = diffs.get(count * 2).copied().unwrap_or(0);
            let d1 = diffs.get(count * 2 + 1).copied().unwrap_or(0);
            count += 1;
            let qn = to_octa(e, unit);
            normals.push(to_sphere([qn[0] + d0, qn[1] + d1], unit));
        } else {
            let len = e.length();
            if len < 0.000_01 {
                normals.push(Vec3::Z);
            } else {
                normals.push(e / len);
            }
        }
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn sphere_of_axis_points() {
        let unit = 512;
        assert_close(to_sphere([0, 0], unit), Vec3::Z);
        assert_close(to_sphere([unit, 0], unit), Vec3::X);
        assert_close(to_sphere([0, -unit], unit), -Vec3::Y);
    }

    #[test]
    fn octa_sphere_roundtrip_preserves_direction() {
        let unit = 1024;
        for v in [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.3, 0.9, -0.1),
            Vec3::new(0.0, -1.0, -1.0),
            Vec3::new(5.0, 0.1, -0.2),
        ] {
            let q = to_octa(v.normalize(), unit);
            let back = to_sphere(q, unit);
            assert!(
                back.dot(v.normalize()) > 0.999,
                "{v:?} came back as {back:?}"
            );
        }
    }

    #[test]
    fn lower_hemisphere_folds() {
        let unit = 256;
        let q = to_octa(Vec3::new(0.0, 0.0, -1.0), unit);
        // The -Z pole maps to a corner of the octahedron square.
        assert_eq!(q[0].abs() + q[1].abs(), 2 * unit);
        assert_close(to_sphere(q, unit), -Vec3::Z);
    }

    #[test]
    fn estimates_follow_face_winding() {
        // One CCW triangle in the z = 0 plane: normal points up +Z.
        let positions = [0, 0, 0, 10, 0, 0, 0, 10, 0];
        let faces = [0u32, 1, 2];
        let est = estimate_normals(3, &positions, &faces);
        for e in est {
            assert!(e.z > 0.0);
            assert_eq!(e.x, 0.0);
            assert_eq!(e.y, 0.0);
        }
    }

    #[test]
    fn closed_fan_has_no_boundary() {
        // Tetrahedron: every vertex is interior.
        let faces = [0u32, 1, 2, 0, 3, 1, 1, 3, 2, 2, 3, 0];
        let boundary = mark_boundary(4, &faces);
        assert_eq!(boundary, vec![0, 0, 0, 0]);
    }

    #[test]
    fn open_strip_is_all_boundary() {
        let faces = [0u32, 1, 2, 2, 1, 3];
        let boundary = mark_boundary(4, &faces);
        assert!(boundary.iter().all(|&b| b != 0));
    }

    #[test]
    fn correction_consumes_diffs_in_order() {
        let estimated = [Vec3::Z, Vec3::X, Vec3::Y];
        let boundary = [0, 1, 1]; // vertex 0 keeps its estimate
        let diffs = [0, 0, 0, 0];
        let normals = correct_estimates(&estimated, &boundary, &diffs, 512, false);
        assert_close(normals[0], Vec3::Z);
        assert_close(normals[1], Vec3::X);
        assert_close(normals[2], Vec3::Y);
    }

    #[test]
    fn degenerate_estimate_falls_back_to_up() {
        let estimated = [Vec3::ZERO];
        let normals = correct_estimates(&estimated, &[0], &[], 512, false);
        assert_eq!(normals[0], Vec3::Z);
    }
}
