use criterion::{Criterion, black_box, criterion_group, criterion_main};
use headline_bias::classification::{Gates, LexiconSet};

fn synthetic_headlines(count: usize) -> Vec<String> {
    const TEMPLATES: [&str; 6] = [
        "Weather forecast predicts heavy rainfall in {} this week",
        "Local bakery in {} wins award for best bread",
        "Supreme Court hears plea from {} on new education policy",
        "BJP and Congress clash over farm laws in {}",
        "Cricket team from {} meets the prime minister",
        "Scores of commuters stranded in {} after storm",
    ];
    const CITIES: [&str; 5] = ["Mumbai", "Delhi", "Chennai", "Kolkata", "Lucknow"];
    (0..count)
        .map(|i| TEMPLATES[i % TEMPLATES.len()].replace("{}", CITIES[i % CITIES.len()]))
        .collect()
}

fn bench_gates(c: &mut Criterion) {
    let gates = Gates::compile(&LexiconSet::embedded().expect("embedded lexicon"))
        .expect("gates compile");
    let headlines = synthetic_headlines(1000);

    c.bench_function("gate_routing_1k_headlines", |b| {
        b.iter(|| {
            let routed = headlines
                .iter()
                .filter(|headline| {
                    !gates.non_political.classify_nonpolitical(headline)
                        && gates.political.classify_political(headline)
                })
                .count();
            black_box(routed);
        });
    });
}

fn bench_lexicon_compile(c: &mut Criterion) {
    let lexicons = LexiconSet::embedded().expect("embedded lexicon");
    c.bench_function("lexicon_compile", |b| {
        b.iter(|| black_box(Gates::compile(&lexicons).expect("gates compile")));
    });
}

criterion_group!(benches, bench_gates, bench_lexicon_compile);
criterion_main!(benches);
