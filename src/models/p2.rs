//! Closed form of the pairwise correlation `P2`.

/// `P2(thetaS, r1, r2, ds, a)` for the coalescent with recombination.
///
/// Division is left unguarded: a vanishing denominator yields an infinite or
/// NaN value, which callers treat as a failed evaluation.
pub fn calc_p2(theta_s: f64, r1: f64, r2: f64, ds: f64, a: f64) -> f64 {
    let t = theta_s;
    let s = 1.0 + r1 + r2 + a * t;

    let num = 2.0
        * (r2 * t + ds * r1 * s)
        * (r2 * t * t
            + ds * ds * s * (2.0 * r1 * r1 + r2 + 3.0 * r1 * r2 + r2 * r2 + a * (r1 + 2.0 * r2) * t)
            - ds * t * (2.0 * r2 + (r1 + r2).powi(2) + a * (r1 + 3.0 * r2) * t));

    let den = (r1 + r2).powi(2)
        * (1.0 + 2.0 * r1 + r2 + 2.0 * a * t)
        * (-(t * (r1 - r2 + a * t)) + ds * (2.0 * r1 + a * t) * s);

    num / den
}

/// Zero-recombination prediction `2θ / (1 + 2θa)`, flat in lag.
pub fn calc_p2_clonal(theta_s: f64, a: f64) -> f64 {
    2.0 * theta_s / (1.0 + 2.0 * theta_s * a)
}
