// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use spendbook::charts::{
    BarLayout, FULL_CIRCLE, HorizontalAnchor, PALETTE, PieLayout, VerticalAnchor,
    category_series, monthly_series,
};
use spendbook::errors::LedgerError;
use spendbook::models::{CategoryMonthlyTotal, MonthlyTotal, YearMonth};

#[test]
fn pie_slices_follow_rounded_shares() {
    let chart = PieLayout::default()
        .layout(&[(30.0, "A"), (70.0, "B")])
        .unwrap();
    assert_eq!(chart.total, 100.0);
    let a = &chart.slices[0];
    let b = &chart.slices[1];
    assert_eq!((a.start_angle, a.span_angle), (0, 1728));
    assert_eq!((b.start_angle, b.end_angle()), (1728, FULL_CIRCLE));
    assert_eq!(a.color, PALETTE[0]);
    assert_eq!(b.color, PALETTE[1]);
}

#[test]
fn small_slices_get_no_label() {
    // 1/36 of the circle is exactly ten degrees
    let chart = PieLayout::default()
        .layout(&[(1.0, "edge"), (35.0, "rest")])
        .unwrap();
    assert_eq!(chart.slices[0].span_angle, 160);
    assert!(chart.slices[0].label_anchor.is_none());
    assert!(chart.slices[1].label_anchor.is_some());

    let chart = PieLayout::default()
        .layout(&[(1.0, "tiny"), (99.0, "big")])
        .unwrap();
    assert!(chart.slices[0].label_anchor.is_none());
}

#[test]
fn label_anchors_flip_toward_the_circle() {
    let chart = PieLayout::default()
        .layout(&[(30.0, "A"), (70.0, "B")])
        .unwrap();

    // A's midpoint sits at 54 degrees: upper right
    let a = chart.slices[0].label_anchor.unwrap();
    assert_eq!(a.horizontal, HorizontalAnchor::Left);
    assert_eq!(a.vertical, VerticalAnchor::Bottom);
    assert!((a.x - (150.0 + 54f64.to_radians().cos() * 155.0)).abs() < 1e-9);
    assert!((a.y - (150.0 - 54f64.to_radians().sin() * 155.0)).abs() < 1e-9);

    // B's midpoint sits at 234 degrees: lower left
    let b = chart.slices[1].label_anchor.unwrap();
    assert_eq!(b.horizontal, HorizontalAnchor::Right);
    assert_eq!(b.vertical, VerticalAnchor::Top);
    assert!(b.x < 150.0 && b.y > 150.0);
}

#[test]
fn rounding_never_overshoots_the_circle() {
    // 5760 / 256 = 22.5 rounds up for every slice
    let elements: Vec<(f64, String)> = (0..256).map(|i| (1.0, format!("s{}", i))).collect();
    let chart = PieLayout::default().layout(&elements).unwrap();
    assert!(chart.slices.iter().all(|s| s.end_angle() <= FULL_CIRCLE));
    assert_eq!(chart.slices.last().unwrap().end_angle(), FULL_CIRCLE);
    let sum: i32 = chart.slices.iter().map(|s| s.span_angle).sum();
    assert_eq!(sum, FULL_CIRCLE);
}

#[test]
fn palette_is_cyclic() {
    let elements: Vec<(f64, &str)> = (0..12).map(|_| (1.0, "x")).collect();
    let chart = PieLayout::default().layout(&elements).unwrap();
    assert_eq!(chart.slices[10].color, chart.slices[0].color);
    assert_eq!(chart.slices[11].color, chart.slices[1].color);
}

#[test]
fn pie_needs_a_positive_total() {
    let empty: [(f64, &str); 0] = [];
    assert!(matches!(
        PieLayout::default().layout(&empty),
        Err(LedgerError::Precondition(_))
    ));
    assert!(matches!(
        PieLayout::default().layout(&[(0.0, "a"), (0.0, "b")]),
        Err(LedgerError::Precondition(_))
    ));
    assert!(matches!(
        PieLayout::default().layout(&[(-1.0, "a"), (5.0, "b")]),
        Err(LedgerError::Precondition(_))
    ));
}

#[test]
fn bar_heights_scale_against_the_maximum() {
    let layout = BarLayout {
        default_max: 100.0,
        ..BarLayout::default()
    };
    let chart = layout.layout(&[("a", 50.0), ("b", 0.0)]).unwrap();
    assert_eq!(chart.max_magnitude, 100.0);
    assert_eq!(chart.bars[0].height, 100.0);
    assert_eq!(chart.bars[1].height, 0.0);
    assert_eq!(chart.bars[1].x, 60.0);
    assert_eq!(chart.bars[0].width, 30.0);
}

#[test]
fn empty_bar_chart_degenerates_to_a_baseline() {
    let empty: [(&str, f64); 0] = [];
    let chart = BarLayout::default().layout(&empty).unwrap();
    assert!(chart.bars.is_empty());
    assert_eq!(chart.max_magnitude, 10.0);
    assert_eq!(chart.gridlines.len(), 1);
    assert_eq!(chart.gridlines[0].height, 0.0);
    assert_eq!(chart.gridlines[0].label, "0");
    assert_eq!(chart.width, 0.0);
}

#[test]
fn maximum_grows_with_the_largest_bar() {
    let chart = BarLayout::default()
        .layout(&[("Jan", 1234.5), ("Feb", 300.0), ("Mar", 10.0)])
        .unwrap();
    assert_eq!(chart.max_magnitude, 1235.0);
    assert!(chart.bars[0].height <= 200.0);

    let labels: Vec<&str> = chart.gridlines.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["0", "200", "400", "600", "800", "1000", "1200"]);
    assert_eq!(chart.gridlines[1].x_end, 180.0);

    assert_eq!(chart.reference.magnitude, 800.0);
    assert!((chart.reference.height - 200.0 * 800.0 / 1235.0).abs() < 1e-9);
    assert_eq!(chart.reference.x_start, -30.0);
    assert_eq!(chart.reference.x_end, 210.0);
}

#[test]
fn gridline_step_widens_past_the_limit() {
    let layout = BarLayout {
        max_gridlines: 3,
        ..BarLayout::default()
    };
    let chart = layout.layout(&[("Jan", 1234.5)]).unwrap();
    let labels: Vec<&str> = chart.gridlines.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["0", "600", "1200"]);
}

#[test]
fn huge_magnitudes_keep_gridlines_bounded() {
    for big in [1e12, 1e20, f64::MAX / 4.0] {
        let chart = BarLayout::default().layout(&[("x", big)]).unwrap();
        assert!(chart.gridlines.len() <= 50, "{} gridlines for {}", chart.gridlines.len(), big);
        assert!(chart.gridlines.len() > 1);
        assert!(chart.gridlines.iter().all(|g| g.magnitude < chart.max_magnitude));
        assert_eq!(chart.bars[0].height, 200.0);
        assert!(chart.reference.height.is_finite());
    }

    let chart = BarLayout::default().layout(&[("x", 1e20)]).unwrap();
    assert_eq!(chart.gridlines.len(), 50);
    assert_eq!(chart.gridlines[1].magnitude, 2e18);
}

#[test]
fn negative_bar_is_rejected() {
    assert!(matches!(
        BarLayout::default().layout(&[("x", -3.0)]),
        Err(LedgerError::Precondition(_))
    ));
}

#[test]
fn store_aggregates_feed_the_layouts() {
    let totals = vec![
        MonthlyTotal {
            month: YearMonth::new(2024, 3).unwrap(),
            total: "12.50".parse().unwrap(),
        },
        MonthlyTotal {
            month: YearMonth::new(2024, 2).unwrap(),
            total: "7.00".parse().unwrap(),
        },
    ];
    assert_eq!(
        monthly_series(&totals),
        vec![("Feb".to_string(), 7.0), ("Mar".to_string(), 12.5)]
    );

    let cats = vec![CategoryMonthlyTotal {
        category_id: 4,
        category_name: "Food".into(),
        total: "3.25".parse().unwrap(),
    }];
    assert_eq!(category_series(&cats), vec![(3.25, "Food".to_string())]);
}
