use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire_model::builders::{doc, p, txt};
use quire_model::{Mark, MarkKind, Node};
use quire_transform::{Assoc, Mappable, Transform};

fn long_document() -> Node {
    doc((0..300)
        .map(|_| p(vec![txt("The quick brown fox jumps over the lazy dog.")]))
        .collect())
}

fn typing(c: &mut Criterion) {
    let d = long_document();

    c.bench_function("insert_100_characters", |b| {
        b.iter(|| {
            let mut tr = Transform::new(d.clone());
            for i in 0..100 {
                let pos = 1 + i;
                if tr.insert_text("x", pos, pos, Vec::new()).is_err() {
                    break;
                }
            }
            black_box(tr.mapping().map(500, Assoc::After))
        })
    });
}

fn bold_everything(c: &mut Criterion) {
    let d = long_document();
    let size = d.content().size();

    c.bench_function("add_mark_whole_document", |b| {
        b.iter(|| {
            let mut tr = Transform::new(d.clone());
            black_box(tr.add_mark(0, size, Mark::of(MarkKind::Bold)).is_ok())
        })
    });
}

criterion_group!(benches, typing, bold_everything);
criterion_main!(benches);
