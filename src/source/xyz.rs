//! Minimal XYZ reader: frames of `count`, comment, then `element x y z` per atom.

use crate::error::{CcrError, Result};
use ndarray::{Array2, Array3, Axis};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct XyzTrajectory {
    pub elements: Vec<String>,
    /// frames × atoms × 3
    pub coordinates: Array3<f64>,
}

impl XyzTrajectory {
    pub fn n_frames(&self) -> usize {
        self.coordinates.len_of(Axis(0))
    }

    pub fn n_atoms(&self) -> usize {
        self.elements.len()
    }

    /// The first frame, for single-structure files.
    pub fn first_frame(&self) -> Array2<f64> {
        self.coordinates.index_axis(Axis(0), 0).to_owned()
    }
}

pub fn read_xyz(path: impl AsRef<Path>) -> Result<XyzTrajectory> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| CcrError::io(path, source))?;
    parse_xyz(&text, path)
}

pub fn parse_xyz(text: &str, path: &Path) -> Result<XyzTrajectory> {
    let parse_err = |line: usize, reason: String| CcrError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut lines = text.lines().enumerate().peekable();
    let mut elements: Vec<String> = Vec::new();
    let mut flat: Vec<f64> = Vec::new();
    let mut n_frames = 0usize;

    loop {
        // skip blank lines between frames and at the end of the file
        while let Some((_, line)) = lines.peek() {
            if line.trim().is_empty() {
                lines.next();
            } else {
                break;
            }
        }
        let Some((idx, count_line)) = lines.next() else {
            break;
        };
        let count: usize = count_line
            .trim()
            .parse()
            .map_err(|_| {
                parse_err(idx + 1, format!("expected an atom count, found `{count_line}`"))
            })?;
        if n_frames > 0 && count != elements.len() {
            return Err(parse_err(
                idx + 1,
                format!("frame {n_frames} has {count} atoms, expected {}", elements.len()),
            ));
        }
        // comment line
        if lines.next().is_none() {
            return Err(parse_err(idx + 2, "missing comment line".to_string()));
        }
        for atom in 0..count {
            let (line_idx, line) = lines.next().ok_or_else(|| {
                parse_err(idx + 3 + atom, format!("frame {n_frames} ends after {atom} atoms"))
            })?;
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return Err(parse_err(
                    line_idx + 1,
                    "expected `element x y z`".to_string(),
                ));
            }
            if n_frames == 0 {
                elements.push(cols[0].to_string());
            }
            for col in &cols[1..4] {
                let value: f64 = col
                    .parse()
                    .map_err(|_| parse_err(line_idx + 1, format!("invalid coordinate `{col}`")))?;
                flat.push(value);
            }
        }
        n_frames += 1;
    }

    if n_frames == 0 {
        return Err(parse_err(1, "no frames found".to_string()));
    }
    let coordinates = Array3::from_shape_vec((n_frames, elements.len(), 3), flat)
        .map_err(|e| parse_err(1, e.to_string()))?;
    Ok(XyzTrajectory {
        elements,
        coordinates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str = "2\nframe 0\nC 0.0 0.0 0.0\nO 0.12 0.0 0.0\n\n\
                              2\nframe 1\nC 0.01 0.0 0.0\nO 0.13 0.02 -0.01\n";

    #[test]
    fn reads_frames() {
        let traj = parse_xyz(TWO_FRAMES, Path::new("t.xyz")).unwrap();
        assert_eq!(traj.n_frames(), 2);
        assert_eq!(traj.n_atoms(), 2);
        assert_eq!(traj.elements, vec!["C", "O"]);
        assert_eq!(traj.coordinates[[1, 1, 2]], -0.01);
        assert_eq!(traj.first_frame()[[1, 0]], 0.12);
    }

    #[test]
    fn inconsistent_atom_count() {
        let text = "1\na\nC 0 0 0\n2\nb\nC 0 0 0\nO 1 0 0\n";
        let err = parse_xyz(text, Path::new("t.xyz")).unwrap_err();
        assert!(matches!(err, CcrError::Parse { line: 4, .. }));
    }

    #[test]
    fn truncated_frame() {
        let text = "3\na\nC 0 0 0\nO 1 0 0\n";
        assert!(parse_xyz(text, Path::new("t.xyz")).is_err());
    }

    #[test]
    fn bad_coordinate() {
        let text = "1\na\nC 0 zero 0\n";
        let err = parse_xyz(text, Path::new("t.xyz")).unwrap_err();
        assert!(matches!(err, CcrError::Parse { line: 3, .. }));
    }

    #[test]
    fn empty_file() {
        assert!(parse_xyz("\n\n", Path::new("t.xyz")).is_err());
    }
}
