use criterion::{black_box, criterion_group, criterion_main, Criterion};
use warden_core::condition::Conditions;
use warden_core::matcher::{Matcher, RegexMatcher};
use warden_core::{Effect, Policy, PolicyAuthorizer, PolicyStore, Request, StoreError};

struct MemoryStore(Vec<Policy>);

impl PolicyStore for MemoryStore {
    fn get_all(&self) -> Result<Vec<Policy>, StoreError> {
        Ok(self.0.clone())
    }
}

fn create_policies(count: usize) -> Vec<Policy> {
    (0..count)
        .map(|i| {
            Policy::new(
                format!("policy-{i}"),
                Effect::Allow,
                vec![format!("user{i}"), "<admin:[0-9]+>".to_string()],
                vec![format!("urn:resource:{i}:<.+>")],
                vec!["get".to_string(), "<create|delete>".to_string()],
                Conditions::new(),
            )
            .unwrap()
        })
        .collect()
}

fn benchmark_pattern_matching(c: &mut Criterion) {
    let matcher = RegexMatcher::new();
    let patterns = vec![
        "max".to_string(),
        "peter".to_string(),
        "<zac|ken>".to_string(),
    ];

    c.bench_function("match_literal_hit", |b| {
        b.iter(|| matcher.matches(black_box(&patterns), black_box("peter")));
    });

    c.bench_function("match_regex_warm_cache", |b| {
        b.iter(|| matcher.matches(black_box(&patterns), black_box("ken")));
    });

    c.bench_function("match_regex_cold_cache", |b| {
        b.iter(|| {
            let cold = RegexMatcher::new();
            cold.matches(black_box(&patterns), black_box("ken"))
        });
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let warden_10 = PolicyAuthorizer::new(MemoryStore(create_policies(10)));
    let warden_100 = PolicyAuthorizer::new(MemoryStore(create_policies(100)));
    let warden_1000 = PolicyAuthorizer::new(MemoryStore(create_policies(1000)));

    let request = Request::new("admin:42", "get", "urn:resource:5:file");

    c.bench_function("evaluate_10_policies", |b| {
        b.iter(|| warden_10.is_allowed(black_box(&request)));
    });

    c.bench_function("evaluate_100_policies", |b| {
        b.iter(|| warden_100.is_allowed(black_box(&request)));
    });

    c.bench_function("evaluate_1000_policies", |b| {
        b.iter(|| warden_1000.is_allowed(black_box(&request)));
    });
}

criterion_group!(benches, benchmark_pattern_matching, benchmark_evaluation);
criterion_main!(benches);
