extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use stylemerge_lib::dom::dom_tree::ElementNode;
use stylemerge_lib::RuleStore;

fn stylesheet(rules: usize, prefix: &str) -> String {
    let mut css = String::with_capacity(rules * 40);
    for i in 0..rules {
        css.push_str(&format!(
            ".{}{} {{ color: #{:06x}; margin: {}px }}\n",
            prefix,
            i,
            i,
            i % 7
        ));
    }
    css
}

fn bench_parse(c: &mut Criterion) {
    let css = stylesheet(5_000, "c");
    c.bench_function("parse_5000_rules", |b| b.iter(|| RuleStore::parse(&css)));
}

fn bench_get_styles(c: &mut Criterion) {
    let store = RuleStore::parse(&stylesheet(5_000, "c"));
    let elem = ElementNode::new("div").with_attribute("class", "c10 c2500 c4999");
    c.bench_function("get_styles_5000_rules", |b| b.iter(|| store.get_styles(&elem)));
}

fn bench_merge_conflicts(c: &mut Criterion) {
    let base = RuleStore::parse(&stylesheet(500, "c"));
    // same selectors, different styles: every rule needs a fresh name
    let incoming = RuleStore::parse(&stylesheet(500, "c").replace("color", "background"));
    c.bench_function("merge_500_conflicts", |b| {
        b.iter(|| {
            let mut store = base.clone();
            store.merge(&incoming)
        })
    });
}

criterion_group!(benches, bench_parse, bench_get_styles, bench_merge_conflicts);
criterion_main!(benches);
