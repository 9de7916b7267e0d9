/// LRN Kernel Benchmarks
///
/// Measures forward and backward throughput for each physical layout on
/// AlexNet-like activation shapes.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tenflowers_lrn::{
    lrn_backward, lrn_forward, BlockWidth, Dims4, Layout, LrnMode, LrnParams, Tensor4D,
};

/// Benchmark configuration for different activation shapes
struct BenchConfig {
    name: &'static str,
    dims: Dims4,
}

const SHAPES: &[BenchConfig] = &[
    BenchConfig {
        name: "small_8x16x14x14",
        dims: Dims4::new(8, 16, 14, 14),
    },
    BenchConfig {
        name: "alexnet_conv1_1x96x55x55",
        dims: Dims4::new(1, 96, 55, 55),
    },
];

fn layouts() -> [Layout; 4] {
    [
        Layout::Planar,
        Layout::ChannelLast,
        Layout::ChannelBlocked(BlockWidth::W8),
        Layout::ChannelBlocked(BlockWidth::W16),
    ]
}

fn input(dims: Dims4, layout: Layout) -> Tensor4D<f32> {
    let values: Vec<f32> = (0..dims.numel()).map(|i| (i % 97) as f32 * 0.01).collect();
    Tensor4D::from_logical(&values, dims, layout).expect("bench input")
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("lrn_forward");
    let params = LrnParams::<f32>::default();

    for shape in SHAPES {
        group.throughput(Throughput::Elements(shape.dims.numel() as u64));
        for layout in layouts() {
            let src = input(shape.dims, layout);
            let mut dst = Tensor4D::zeros(shape.dims, layout);
            let mut ws = Tensor4D::zeros(shape.dims, layout);
            group.bench_with_input(
                BenchmarkId::new(layout.name(), shape.name),
                &shape.dims,
                |b, &dims| {
                    b.iter(|| {
                        lrn_forward(
                            black_box(src.as_slice()),
                            dst.as_mut_slice(),
                            Some(ws.as_mut_slice()),
                            dims,
                            &params,
                            LrnMode::ChannelWise,
                            &layout,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_backward(c: &mut Criterion) {
    let mut group = c.benchmark_group("lrn_backward");
    let params = LrnParams::<f32>::default();

    for shape in SHAPES {
        group.throughput(Throughput::Elements(shape.dims.numel() as u64));
        for layout in layouts() {
            let src = input(shape.dims, layout);
            let diff_dst = input(shape.dims, layout);
            let mut diff_src = Tensor4D::zeros(shape.dims, layout);
            group.bench_with_input(
                BenchmarkId::new(layout.name(), shape.name),
                &shape.dims,
                |b, &dims| {
                    b.iter(|| {
                        lrn_backward(
                            black_box(src.as_slice()),
                            black_box(diff_dst.as_slice()),
                            diff_src.as_mut_slice(),
                            dims,
                            &params,
                            LrnMode::ChannelWise,
                            &layout,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_forward, bench_backward);
criterion_main!(benches);
