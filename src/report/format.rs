//! Plain-text report formatting.

use crate::domain::{FitResult, LogLawParams, Observations};
use crate::models::KAPPA;
use crate::report::{ProfileResidual, ReferenceComparison};

/// Format the fit summary (dataset stats + parameters + diagnostics).
pub fn format_fit_summary(obs: &Observations, guess: LogLawParams, fit: &FitResult) -> String {
    let mut out = String::new();
    let (z_min, z_max) = obs.height_range();

    out.push_str("=== logfit - law-of-the-wall fit ===\n");
    out.push_str(&format!("Model: u = (u*/{KAPPA}) ln(z/z_o)\n"));
    out.push_str(&format!(
        "Points: n={} | z=[{z_min:.3}, {z_max:.3}]\n",
        obs.len()
    ));
    out.push_str(&format!(
        "Initial guess: u*={:.4} z_o={:.4}\n",
        guess.u_star, guess.z_o
    ));

    out.push_str("\nParameters:\n");
    out.push_str(&format!(
        "- u*  = {:.5} ± {}\n",
        fit.u_star,
        fmt_se(fit.se_u_star)
    ));
    out.push_str(&format!(
        "- z_o = {:.5} ± {}\n",
        fit.z_o,
        fmt_se(fit.se_z_o)
    ));

    out.push_str("\nDiagnostics:\n");
    out.push_str(&format!(
        "- SSE={:.6} RMSE={:.6} dof={} iterations={}\n",
        fit.quality.sse, fit.quality.rmse, fit.quality.dof, fit.quality.iterations
    ));

    out
}

/// Format the per-point residual table.
pub fn format_residual_table(rows: &[ProfileResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>10} {:>12} {:>12} {:>12}",
            "z", "u_obs", "u_fit", "residual"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<12} {:-<12} {:-<12}\n", "", "", "", ""));

    for r in rows {
        out.push_str(&format!(
            "{:>10.3} {:>12.4} {:>12.4} {:>12.4}\n",
            r.z, r.u_obs, r.u_fit, r.residual
        ));
    }

    out
}

/// Format a comparison against a reference estimate.
pub fn format_comparison(label: &str, cmp: &ReferenceComparison) -> String {
    let mut out = String::new();
    out.push_str(&format!("Comparison with {label}:\n"));
    for (name, p) in [("u*", cmp.u_star), ("z_o", cmp.z_o)] {
        out.push_str(&format!(
            "- {name:<3} fitted={:.5} reference={:.5} delta={:+.5} ({} σ)\n",
            p.fitted,
            p.reference,
            p.delta,
            fmt_sigmas(p.in_std_errors)
        ));
    }
    out
}

/// Format an observation set as `z,u` lines.
pub fn format_observations(obs: &Observations) -> String {
    let mut out = String::from("z,u\n");
    for (z, u) in obs.iter() {
        out.push_str(&format!("{z},{u:.6}\n"));
    }
    out
}

fn fmt_se(se: f64) -> String {
    if se.is_finite() {
        format!("{se:.5}")
    } else {
        "n/a (not estimable)".to_string()
    }
}

fn fmt_sigmas(v: f64) -> String {
    if v.is_finite() {
        format!("{v:+.2}")
    } else {
        "∞".to_string()
    }
}
