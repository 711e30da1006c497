use {
    criterion::{black_box, criterion_group, criterion_main, Benchmark, Criterion},
    fixed_grid::{
        constants::NODATA,
        orient::{orient, Field},
    },
    ndarray::Array2,
};

fn field(nx: usize, ny: usize) -> (Field, Array2<bool>) {
    let data = Array2::from_shape_fn((nx, ny), |(i, j)| (i * ny + j) as f64);
    let mask = Array2::from_shape_fn((nx, ny), |(i, j)| (i + j) % 7 == 0);
    (Field::solver("h", data), mask)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench(
        "orient",
        Benchmark::new("256x256", |b| {
            let (field, mask) = field(256, 256);
            b.iter(|| orient(black_box(&field), Some(&mask), NODATA).unwrap())
        }),
    );

    c.bench(
        "orient",
        Benchmark::new("1024x512", |b| {
            let (field, mask) = field(1024, 512);
            b.iter(|| orient(black_box(&field), Some(&mask), NODATA).unwrap())
        })
        .sample_size(20),
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
