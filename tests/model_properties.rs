//! Properties of the correlation models, the null solver and Akaike weights.

use approx::assert_relative_eq;
use mcorr_fit::data::FittingSeries;
use mcorr_fit::fit::{akaike_weights, solve_null, FitConfig, Fitter, ModelComparison, ModelVariant};
use mcorr_fit::lm::SolverMethod;
use mcorr_fit::models::{calc_p2_clonal, FragmentKernel, ModelConstants};

const KERNELS: [FragmentKernel; 4] = [
    FragmentKernel::Constant,
    FragmentKernel::Exponential,
    FragmentKernel::Geometric,
    FragmentKernel::Zero,
];

fn three_point_series() -> FittingSeries {
    FittingSeries::new("all", vec![3.0, 4.0, 5.0], vec![0.02, 0.018, 0.016], 0.05).unwrap()
}

#[test]
fn test_kernels_vanish_at_zero_lag() {
    let w = ModelConstants::default().w;
    for kernel in KERNELS {
        for fbar in [3.0, 50.0, 1000.0, 30000.0] {
            assert_eq!(kernel.r1(0.0, fbar, 0.004, w), 0.0, "{} kernel, fbar {}", kernel, fbar);
        }
    }
}

#[test]
fn test_kernels_are_monotone_in_lag() {
    let w = ModelConstants::default().w;
    for kernel in KERNELS {
        let mut last = 0.0;
        for lag in 1..400 {
            let r1 = kernel.r1(lag as f64, 120.0, 0.004, w);
            assert!(r1 >= last, "{} kernel decreases at lag {}", kernel, lag);
            last = r1;
        }
    }
}

#[test]
fn test_constant_kernel_plateau() {
    let w = ModelConstants::default().w;
    let (fbar, phi_c) = (80.0, 0.003);
    let plateau = w * phi_c * fbar;
    for lag in [80.0, 81.0, 200.0, 5000.0] {
        assert_relative_eq!(FragmentKernel::Constant.r1(lag, fbar, phi_c, w), plateau);
    }
    assert!(FragmentKernel::Constant.r1(79.0, fbar, phi_c, w) < plateau);
}

#[test]
fn test_smooth_kernels_approach_plateau() {
    let w = ModelConstants::default().w;
    let (fbar, phi_c) = (40.0, 0.002);
    let plateau = w * phi_c * fbar;
    for kernel in [FragmentKernel::Exponential, FragmentKernel::Geometric] {
        assert_relative_eq!(kernel.r1(4000.0, fbar, phi_c, w), plateau, max_relative = 1e-12);
    }
}

#[test]
fn test_weights_form_a_distribution() {
    let triples = [
        [-10.0, -12.0, -9.5],
        [100.0, 100.0, 100.0],
        [-350.2, -351.9, -290.0],
        [0.0, 1e3, -1e3],
    ];
    for aics in triples {
        let weights = akaike_weights(&aics).unwrap();
        assert!(weights.iter().all(|&w| w >= 0.0));
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_weights_one_hot_for_perfect_fit() {
    let weights = akaike_weights(&[-20.0, f64::NEG_INFINITY, -25.0]).unwrap();
    assert_eq!(weights, vec![0.0, 1.0, 0.0]);

    let comparison = ModelComparison::from_aics(&[-20.0, f64::NEG_INFINITY, -25.0]).unwrap();
    assert_eq!(comparison.best, 1);
}

#[test]
fn test_null_on_identical_values() {
    let series = FittingSeries::new("all", vec![3.0, 4.0, 5.0, 6.0], vec![0.0078125; 4], 0.02).unwrap();
    let null = solve_null(&series, ModelConstants::default().a).unwrap();

    assert_eq!(null.chi_square, 0.0);
    assert_eq!(null.aic, f64::NEG_INFINITY);
    assert_eq!(null.reduced_chi_square, Some(0.0));
    assert!(null.residuals.iter().all(|&r| r == 0.0));
}

#[test]
fn test_null_single_point() {
    let series = FittingSeries::new("all", vec![10.0], vec![0.015], 0.02).unwrap();
    let null = solve_null(&series, ModelConstants::default().a).unwrap();

    assert_eq!(null.ndata, 1);
    assert_eq!(null.reduced_chi_square, None);
}

#[test]
fn test_null_matches_clonal_prediction() {
    let a = ModelConstants::default().a;
    let series = three_point_series();
    let null = solve_null(&series, a).unwrap();

    assert_relative_eq!(null.theta_s, 0.05 / (1.0 - a * 0.05), max_relative = 1e-12);
    assert_relative_eq!(null.d_clonal, null.theta_s / (1.0 + a * null.theta_s), max_relative = 1e-12);
    assert_relative_eq!(null.chi_square, 8e-6, max_relative = 1e-9);
    assert!(calc_p2_clonal(null.theta_s, a).is_finite());
}

#[test]
fn test_fragment_incorporation_scenario() {
    let config = FitConfig {
        kernel: FragmentKernel::Constant,
        fixed_fragment: false,
        ..FitConfig::default()
    };
    let fitter = Fitter::new(config.clone());
    let outcome = fitter.fit(&three_point_series(), ModelVariant::FragmentIncorporation).unwrap();

    assert!(outcome.success, "{:?}", outcome.message);
    assert!(outcome.theta_s >= 0.0);
    let fragment = outcome.fragment.unwrap();
    assert!((3.0..=config.genome_length).contains(&fragment));
    assert!(outcome.phi_s.unwrap() >= 0.0);
    assert_eq!(outcome.ndata, 3);
    assert_eq!(outcome.nvarys, 3);
}

#[test]
fn test_fit_respects_bounds_for_both_methods() {
    for method in [SolverMethod::LeastSquares, SolverMethod::LeastSq] {
        let config = FitConfig {
            method,
            ..FitConfig::default()
        };
        let fitter = Fitter::new(config);
        let series = three_point_series();
        for variant in [ModelVariant::FragmentIncorporation, ModelVariant::TemplateSwitching] {
            let outcome = fitter.fit(&series, variant).unwrap();
            assert!(outcome.theta_s >= 0.0, "{} with {}", variant, method);
            assert!(outcome.phi_s.unwrap() >= 0.0, "{} with {}", variant, method);
            let fragment = outcome.fragment.unwrap();
            assert!((3.0..=30000.0).contains(&fragment), "{} with {}", variant, method);
        }
    }
}

#[test]
fn test_three_model_comparison() {
    let fitter = Fitter::new(FitConfig::default());
    let series = three_point_series();
    let aics: Vec<f64> = [
        ModelVariant::FragmentIncorporation,
        ModelVariant::TemplateSwitching,
        ModelVariant::ZeroRecombination,
    ]
    .iter()
    .map(|&variant| fitter.fit(&series, variant).unwrap().aic)
    .collect();

    let comparison = ModelComparison::from_aics(&aics).unwrap();
    assert_relative_eq!(comparison.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    assert_eq!(comparison.evidence_ratios[comparison.best], 1.0);
}
