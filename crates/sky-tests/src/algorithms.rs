//! Cross-crate properties of the cut-level and color-mapping algorithms.

use approx::assert_relative_eq;
use sky_cmap::shift::shift_array;
use sky_cmap::{ColorDist, DistKind, MapperSettings, RgbMapper};
use sky_core::PixelBuffer;
use sky_cuts::levels::cut_levels;
use sky_cuts::{AutoCuts, AutoCutsKind, Histogram, StdDev};

fn uniform(w: usize, h: usize) -> PixelBuffer {
    PixelBuffer::mono(w, h, (0..w * h).map(|v| v as f32).collect()).unwrap()
}

#[test]
fn test_data_driven_algorithms_stay_inside_data_range() {
    let img = uniform(100, 100);
    // stddev levels are mean-relative and may leave the range
    for kind in AutoCutsKind::ALL.into_iter().filter(|k| *k != AutoCutsKind::StdDev) {
        let (lo, hi) = kind.default_algorithm().calc_cut_levels(&img).unwrap();
        assert!(lo <= hi, "{kind}: {lo} > {hi}");
        assert!(lo >= 0.0 && hi <= 9999.0, "{kind}: ({lo}, {hi})");
    }
}

#[test]
fn test_histogram_percentile() {
    let algo = AutoCuts::Histogram(Histogram { pct: 0.9, usecrop: false, ..Default::default() });
    let (lo, hi) = algo.calc_cut_levels(&uniform(100, 100)).unwrap();
    assert!((lo - 500.0).abs() < 20.0, "lo {lo}");
    assert!((hi - 9500.0).abs() < 20.0, "hi {hi}");
}

#[test]
fn test_stddev_one_sigma_band() {
    let algo = AutoCuts::StdDev(StdDev {
        hensa_lo: 40.0,
        hensa_hi: 60.0,
        usecrop: false,
        ..Default::default()
    });
    let (lo, hi) = algo.calc_cut_levels(&uniform(100, 100)).unwrap();
    assert_relative_eq!((lo + hi) / 2.0, 4999.5, epsilon = 1.0);
    // population sd of 0..9999
    assert_relative_eq!((hi - lo) / 2.0, 2886.75, epsilon = 1.0);
}

#[test]
fn test_nan_samples_do_not_poison_levels() {
    let mut img = uniform(64, 64);
    for v in img.data.iter_mut().step_by(7) {
        *v = f32::NAN;
    }
    for kind in AutoCutsKind::ALL {
        let (lo, hi) = kind.default_algorithm().calc_cut_levels(&img).unwrap();
        assert!(lo.is_finite() && hi.is_finite(), "{kind}");
    }
}

#[test]
fn test_cut_levels_properties() {
    let data: Vec<f32> = (-100..1100).map(|v| v as f32).collect();
    let out = cut_levels(&data, 0.0, 1000.0, 0.0, 255.0);
    assert!(out.iter().all(|v| (0.0..=255.0).contains(v)));
    assert!(out.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(out[0], 0.0);
    assert_eq!(*out.last().unwrap(), 255.0);

    // degenerate levels give a step
    let step = cut_levels(&[1.0, 5.0, 9.0], 5.0, 5.0, 0.0, 10.0);
    assert_eq!(step, vec![0.0, 10.0, 10.0]);
}

#[test]
fn test_dist_forward_inverse() {
    for name in DistKind::NAMES {
        let kind = DistKind::from_name(name).unwrap();
        for i in 1..10 {
            let x = i as f64 / 10.0;
            assert_relative_eq!(kind.inverse(kind.forward(x)), x, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_dist_tables_monotonic_and_bounded() {
    for name in DistKind::NAMES {
        let dist = ColorDist::new(DistKind::from_name(name).unwrap(), 4096, 256).unwrap();
        let table = dist.table();
        assert_eq!(table.len(), 4096);
        assert!(table.windows(2).all(|w| w[1] >= w[0]), "{name}");
        assert!(table.iter().all(|&v| v < 256), "{name}");
    }
}

#[test]
fn test_identity_shift_array() {
    for len in [256usize, 65536] {
        let sarr = shift_array(len, 0.5, 0.5, false);
        assert!(sarr.iter().enumerate().all(|(i, &v)| v == i as u32), "len {len}");
    }
    for bpp in [8, 16] {
        let mapper = RgbMapper::new(bpp).unwrap();
        assert!(mapper.get_sarr().iter().enumerate().all(|(i, &v)| v == i as u32), "bpp {bpp}");
    }
}

#[test]
fn test_histeq_matches_fast_path_shape() {
    // equalizing uniform indices is close to the linear curve
    let idx = PixelBuffer::mono(256, 256, (0..65536).map(|v| v as f32).collect()).unwrap();
    let linear = RgbMapper::from_settings(&MapperSettings::default()).unwrap();
    let histeq = RgbMapper::from_settings(&MapperSettings {
        dist: DistKind::Histeq,
        ..Default::default()
    })
    .unwrap();
    assert!(linear.has_fast_path());
    assert!(!histeq.has_fast_path());

    let a = linear.get_rgb_array(&idx, "RGB").unwrap();
    let b = histeq.get_rgb_array(&idx, "RGB").unwrap();
    for (x, y) in a.data.iter().zip(&b.data) {
        assert!((x - y).abs() <= 1.0);
    }
}

#[test]
fn test_mapper_settings_change_detection() {
    let mut mapper = RgbMapper::new(8).unwrap();
    assert!(!mapper.apply_settings(&MapperSettings::default()).unwrap());
    let heat = MapperSettings { color_map: "heat".into(), ..Default::default() };
    assert!(mapper.apply_settings(&heat).unwrap());
    assert_eq!(mapper.settings(), heat);
}
