//! Export per-point residuals to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::report::ProfileResidual;

/// Write per-point residuals to a CSV file.
pub fn write_residuals_csv(path: &Path, residuals: &[ProfileResidual]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "z,u_obs,u_fit,residual")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(file, "{},{},{:.10},{:.10}", r.z, r.u_obs, r.u_fit, r.residual)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residuals.csv");
        let rows = vec![
            ProfileResidual { z: 22.0, u_obs: 41.8, u_fit: 41.75, residual: 0.05 },
            ProfileResidual { z: 55.0, u_obs: 50.4, u_fit: 50.5, residual: -0.1 },
        ];
        write_residuals_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "z,u_obs,u_fit,residual");
        assert!(lines[1].starts_with("22,41.8,41.75"));
        assert!(lines[2].contains(",-0.1000000000"));
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.csv");
        let err = write_residuals_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
