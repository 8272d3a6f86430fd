//! Formatting and parsing of vectors on the command line

use anyhow::{Result, bail};
use glam::{Quat, Vec3};

/// `(x, y, z)` with three decimals
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// `(x, y, z, w)` with three decimals
pub fn format_quat(q: Quat) -> String {
    format!("({:.3}, {:.3}, {:.3}, {:.3})", q.x, q.y, q.z, q.w)
}

/// Comma separated floats, brackets omitted
pub fn format_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse `x,y,z`
pub fn parse_vec3(text: &str) -> Result<Vec3> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        &[x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => bail!("Expected three comma separated numbers, got '{text}'"),
    }
}
