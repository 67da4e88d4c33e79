use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cd20::{prelude::*, scan::Lexer};

fn criterion_benchmark(c: &mut Criterion) {
    let source_code = include_str!("../tests/fixtures/sums.cd");

    c.bench_function("sums lexer", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(source_code));
            while !lexer.at_end() {
                black_box(lexer.next_token());
            }
        })
    });

    {
        let conf = CompileConf::default();

        c.bench_function("sums compile", |b| {
            b.iter(|| black_box(compile_str(black_box(source_code), &conf)))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
