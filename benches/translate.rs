use criterion::{Criterion, black_box, criterion_group, criterion_main};
use j2py::diag::{DiagnosticSink, Mode};
use j2py::parser::Parser;
use j2py::{Options, lexer, translate};

const WORKLOADS: [(&str, &str); 2] = [
    ("fields", include_str!("../tests/programs/fields/program.java")),
    ("loops", include_str!("../tests/programs/loops/program.java")),
];

fn bench_translate(c: &mut Criterion) {
    for (label, source) in WORKLOADS {
        c.bench_function(&format!("frontend_tokenize_{label}"), |b| {
            b.iter(|| {
                let lines = lexer::tokenize(black_box(source));
                black_box(lines);
            })
        });

        c.bench_function(&format!("frontend_parse_{label}"), |b| {
            b.iter(|| {
                let mut diags = DiagnosticSink::new(Mode::Fatal);
                let classes = Parser::new(black_box(source), &mut diags)
                    .parse()
                    .expect("parse");
                black_box(classes);
            })
        });

        c.bench_function(&format!("translate_{label}"), |b| {
            let options = Options::default();
            b.iter(|| {
                let output = translate(black_box(source), &options).expect("translate");
                black_box(output);
            })
        });
    }
}

criterion_group!(benches, bench_translate);
criterion_main!(benches);
