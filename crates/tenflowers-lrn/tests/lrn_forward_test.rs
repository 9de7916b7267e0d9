use approx::assert_relative_eq;
use tenflowers_lrn::{
    lrn_forward, lrn_forward_with_config, BlockWidth, Dims4, DriverConfig, Layout,
    LocalResponseNorm, LrnMode, LrnParams, StridedLayout, Tensor4D,
};

fn sample_values(dims: Dims4) -> Vec<f32> {
    (0..dims.numel())
        .map(|i| ((i * 7919) % 23) as f32 * 0.17 - 1.9)
        .collect()
}

fn all_layouts(dims: Dims4) -> Vec<Layout> {
    vec![
        Layout::Planar,
        Layout::ChannelLast,
        Layout::ChannelBlocked(BlockWidth::W8),
        Layout::ChannelBlocked(BlockWidth::W16),
        Layout::channel_blocked(4).unwrap(),
        Layout::Generic(StridedLayout::from_axis_order(dims, [0, 3, 1, 2]).unwrap()),
    ]
}

/// Forward in `layout`, returning (output, workspace) in logical order
fn forward_logical(
    values: &[f32],
    dims: Dims4,
    layout: Layout,
    params: &LrnParams<f32>,
    mode: LrnMode,
) -> (Vec<f32>, Vec<f32>) {
    let src = Tensor4D::from_logical(values, dims, layout).unwrap();
    let mut dst = Tensor4D::zeros(dims, layout);
    let mut ws = Tensor4D::zeros(dims, layout);
    lrn_forward(
        src.as_slice(),
        dst.as_mut_slice(),
        Some(ws.as_mut_slice()),
        dims,
        params,
        mode,
        &layout,
    );
    (dst.to_logical(), ws.to_logical())
}

#[test]
fn test_end_to_end_channel_wise_example() {
    let dims = Dims4::new(1, 4, 1, 1);
    let params = LrnParams::new(3, 1.0f32, 0.75, 1.0);
    let (dst, ws) = forward_logical(&[1.0, 2.0, 3.0, 4.0], dims, Layout::Planar, &params, LrnMode::ChannelWise);

    let omegas = [2.6666667f32, 5.6666667, 10.333333, 9.333333];
    for i in 0..4 {
        assert_relative_eq!(ws[i], omegas[i], max_relative = 1e-5);
    }
    let expected = [
        1.0 * 2.6666667f32.powf(-0.75),
        2.0 * 5.6666667f32.powf(-0.75),
        3.0 * 10.333333f32.powf(-0.75),
        4.0 * 9.333333f32.powf(-0.75),
    ];
    for i in 0..4 {
        assert_relative_eq!(dst[i], expected[i], max_relative = 1e-5);
    }
}

#[test]
fn test_layout_independence_channel_wise() {
    // C = 19 leaves a partial block for every blocked width
    let dims = Dims4::new(2, 19, 3, 4);
    let values = sample_values(dims);
    let params = LrnParams::new(5, 0.3f32, 0.75, 1.5);
    let (reference, reference_ws) =
        forward_logical(&values, dims, Layout::Planar, &params, LrnMode::ChannelWise);

    for layout in all_layouts(dims) {
        let (dst, ws) = forward_logical(&values, dims, layout, &params, LrnMode::ChannelWise);
        for i in 0..dims.numel() {
            assert_relative_eq!(dst[i], reference[i], max_relative = 1e-6);
            assert_relative_eq!(ws[i], reference_ws[i], max_relative = 1e-6);
        }
    }
}

#[test]
fn test_layout_independence_spatial() {
    let dims = Dims4::new(1, 9, 5, 6);
    let values = sample_values(dims);
    let params = LrnParams::new(3, 0.8f32, 0.6, 2.0);
    let (reference, _) = forward_logical(&values, dims, Layout::Planar, &params, LrnMode::Spatial);

    for layout in all_layouts(dims) {
        let (dst, _) = forward_logical(&values, dims, layout, &params, LrnMode::Spatial);
        for i in 0..dims.numel() {
            assert_relative_eq!(dst[i], reference[i], max_relative = 1e-6);
        }
    }
}

#[test]
fn test_border_under_normalization() {
    let dims = Dims4::new(1, 1, 1, 1);
    let params = LrnParams::new(5, 0.7f32, 0.75, 1.25);
    let src = 1.8f32;

    let (_, ws) = forward_logical(&[src], dims, Layout::Planar, &params, LrnMode::ChannelWise);
    assert_relative_eq!(ws[0], 1.25 + 0.7 * src * src / 5.0, max_relative = 1e-6);

    let (_, ws) = forward_logical(&[src], dims, Layout::Planar, &params, LrnMode::Spatial);
    assert_relative_eq!(ws[0], 1.25 + 0.7 * src * src / 25.0, max_relative = 1e-6);
}

#[test]
fn test_forward_is_deterministic() {
    let dims = Dims4::new(3, 16, 7, 9);
    let values = sample_values(dims);
    let params = LrnParams::<f32>::default();
    for layout in all_layouts(dims) {
        let (first, first_ws) = forward_logical(&values, dims, layout, &params, LrnMode::ChannelWise);
        let (second, second_ws) = forward_logical(&values, dims, layout, &params, LrnMode::ChannelWise);
        assert_eq!(first, second);
        assert_eq!(first_ws, second_ws);
    }
}

#[test]
fn test_parallel_matches_sequential_bitwise() {
    let dims = Dims4::new(2, 24, 8, 8);
    let values = sample_values(dims);
    let params = LrnParams::new(5, 1e-2f32, 0.75, 1.0);

    for layout in all_layouts(dims) {
        let src = Tensor4D::from_logical(&values, dims, layout).unwrap();
        let mut outputs = Vec::new();
        for config in [
            DriverConfig::sequential(),
            DriverConfig::parallel(),
            DriverConfig::parallel().with_partitions(5),
        ] {
            let mut dst = Tensor4D::zeros(dims, layout);
            lrn_forward_with_config(
                src.as_slice(),
                dst.as_mut_slice(),
                None,
                dims,
                &params,
                LrnMode::ChannelWise,
                &layout,
                &config,
            );
            outputs.push(dst.into_vec());
        }
        assert_eq!(outputs[0], outputs[1], "{layout}");
        assert_eq!(outputs[0], outputs[2], "{layout}");
    }
}

#[test]
fn test_general_beta_path() {
    let dims = Dims4::new(1, 3, 1, 1);
    let params = LrnParams::new(3, 2.0f64, 0.5, 1.0);
    let src = Tensor4D::from_logical(&[1.0f64, -1.0, 2.0], dims, Layout::ChannelLast).unwrap();
    let mut dst = Tensor4D::zeros(dims, Layout::ChannelLast);
    lrn_forward(
        src.as_slice(),
        dst.as_mut_slice(),
        None,
        dims,
        &params,
        LrnMode::ChannelWise,
        &Layout::ChannelLast,
    );
    let omega_1 = 1.0 + 2.0 * (1.0 + 1.0 + 4.0) / 3.0;
    assert_relative_eq!(dst.to_logical()[1], -1.0 / f64::sqrt(omega_1), max_relative = 1e-12);
}

#[test]
fn test_non_finite_input_propagates() {
    let dims = Dims4::new(1, 3, 1, 1);
    let params = LrnParams::new(3, 1.0f32, 0.75, 1.0);
    let (dst, _) = forward_logical(&[1.0, f32::NAN, 1.0], dims, Layout::Planar, &params, LrnMode::ChannelWise);
    assert!(dst.iter().all(|v| v.is_nan()));
}

#[test]
fn test_layer_forward_matches_kernel() {
    let dims = Dims4::new(1, 6, 2, 3);
    let values = sample_values(dims);
    let layout = Layout::ChannelBlocked(BlockWidth::W8);
    let lrn = LocalResponseNorm::new(3, 0.4f32, 0.75, 1.0);
    let input = Tensor4D::from_logical(&values, dims, layout).unwrap();
    let output = lrn.forward(&input).unwrap();

    let (expected, _) = forward_logical(&values, dims, layout, lrn.params(), LrnMode::ChannelWise);
    assert_eq!(output.layout(), layout);
    assert_eq!(output.to_logical(), expected);
}
