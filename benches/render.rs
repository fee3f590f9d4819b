#[macro_use]
extern crate criterion;
extern crate mandelbrot;

use criterion::Criterion;
use mandelbrot::{
    compute_row, evaluate, planes::PlaneMapper, render, CancelToken, RasterConfig, RenderRequest,
    Viewport,
};

fn bench_evaluate(c: &mut Criterion) {
    c.bench_function("evaluate inside the cardioid", |b| {
        b.iter(|| evaluate(-0.5, 0.0, 1000))
    });
    c.bench_function("evaluate near the boundary", |b| {
        b.iter(|| evaluate(-0.7436, 0.1318, 1000))
    });
}

fn bench_row(c: &mut Criterion) {
    let config = RasterConfig {
        width: 1000,
        height: 1000,
        max_iter: 200,
    };
    let plane = PlaneMapper::new(&Viewport::default(), &config);
    let stop = CancelToken::new();
    c.bench_function("one 1000-pixel row", move |b| {
        b.iter(|| compute_row(500, &plane, &config, &stop))
    });
}

fn bench_render(c: &mut Criterion) {
    let request = RenderRequest {
        config: RasterConfig {
            width: 200,
            height: 200,
            max_iter: 100,
        },
        ..RenderRequest::default()
    };
    c.bench_function("200x200 render", move |b| b.iter(|| render(&request)));
}

criterion_group!(benches, bench_evaluate, bench_row, bench_render);
criterion_main!(benches);
