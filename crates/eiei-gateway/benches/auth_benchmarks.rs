//! Performance benchmarks for the auth core.
//!
//! Run with: cargo bench -p eiei-gateway

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use eiei_core::SigningSecret;
use eiei_core::config::HashingSettings;
use eiei_gateway::auth::{CredentialHasher, RevocationRegistry, TokenIssuer};
use tempfile::TempDir;

/// Benchmark password hashing at a few memory costs.
fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("password_hash");
    group.sample_size(10);

    for memory_kib in [4 * 1024, 19 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("memory_kib", memory_kib),
            &memory_kib,
            |b, &memory_kib| {
                let hasher = CredentialHasher::new(HashingSettings {
                    memory_kib,
                    ..HashingSettings::default()
                })
                .unwrap();
                let salt = CredentialHasher::generate_salt();

                b.iter(|| hasher.hash(black_box("Secret123+"), &salt).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark token issue and verify.
fn bench_tokens(c: &mut Criterion) {
    let issuer = TokenIssuer::new(&SigningSecret::generate(), chrono::Duration::minutes(60));

    c.bench_function("token_issue", |b| {
        b.iter(|| issuer.issue(black_box("user_123"), "vendor", None).unwrap());
    });

    let token = issuer.issue("user_123", "vendor", None).unwrap().token;
    c.bench_function("token_verify", |b| {
        b.iter(|| issuer.verify(black_box(&token)).unwrap());
    });
}

/// Benchmark revocation lookups against a populated registry.
fn bench_revocation(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let db = sled::open(temp_dir.path()).unwrap();
    let registry = RevocationRegistry::with_db(&db).unwrap();

    for i in 0..1000 {
        registry.revoke(&format!("token-{i}"), None).unwrap();
    }

    c.bench_function("is_revoked_hit", |b| {
        b.iter(|| registry.is_revoked(black_box("token-500")).unwrap());
    });
    c.bench_function("is_revoked_miss", |b| {
        b.iter(|| registry.is_revoked(black_box("token-x")).unwrap());
    });
}

criterion_group!(benches, bench_hash, bench_tokens, bench_revocation);
criterion_main!(benches);
