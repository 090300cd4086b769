extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use csssniff_lib::extract::used_css;
use csssniff_lib::parser::html::create_dom_tree;
use csssniff_lib::SniffConfig;

fn build_page(rules: usize, elements: usize) -> String {
    let mut css = String::with_capacity(rules * 48);
    for i in 0..rules {
        css.push_str(&format!(".c{} > p, .c{}:hover {{ margin: {}px; }}\n", i, i, i));
        if i % 10 == 0 {
            css.push_str(&format!("@media print {{ .c{} {{ display: none; }} }}\n", i));
        }
    }
    let mut html = format!("<html><head><style>{}</style></head><body>", css);
    for i in 0..elements {
        html.push_str(&format!("<div class=\"c{}\"><p>Test</p></div>", i % rules));
    }
    html.push_str("</body></html>");
    html
}

fn bench_parse(c: &mut Criterion) {
    let page = build_page(500, 2_000);
    c.bench_function("parse_document", |b| b.iter(|| create_dom_tree(&page)));
}

fn bench_sniff(c: &mut Criterion) {
    let page = build_page(500, 2_000);
    let config = SniffConfig::default();
    c.bench_function("sniff_body", |b| {
        b.iter(|| used_css::extract(&page, "body", &config))
    });
}

criterion_group!(benches, bench_parse, bench_sniff);
criterion_main!(benches);
