use secrecy::SecretString;

use sealdrop_core::{CryptoConfig, Payload, RecipientIdentity};
use sealdrop_crypto::{derive_key, seal, unseal, KdfParams};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn bench_config() -> CryptoConfig {
    CryptoConfig {
        payload_cost_factor: 10_000,
        wrap_cost_factor: 10_000,
        ..CryptoConfig::default()
    }
}

fn recipients(count: usize) -> Vec<RecipientIdentity> {
    (0..count)
        .map(|i| RecipientIdentity::new(&format!("0xrecipient{i:040}")).unwrap())
        .collect()
}

#[divan::bench(args = [10_000, 100_000])]
fn bench_derive_key(bencher: divan::Bencher, cost_factor: u32) {
    let salt = [7u8; 32];
    let params = KdfParams::new(cost_factor);
    bencher.bench(|| {
        derive_key(
            divan::black_box(b"0xaaa0000000000000000000000000000000000001"),
            divan::black_box(&salt),
            &params,
        )
        .unwrap()
    });
}

#[divan::bench(args = [1, 5, 10])]
fn bench_seal(bencher: divan::Bencher, recipient_count: usize) {
    let config = bench_config();
    let payload = Payload::new("bench.bin", "application/octet-stream", make_data(65536));
    let recipients = recipients(recipient_count);
    let secret = SecretString::from("bench-secret");
    bencher.bench(|| {
        seal(
            divan::black_box(&payload),
            divan::black_box(&recipients),
            &secret,
            &config,
        )
        .unwrap()
    });
}

#[divan::bench]
fn bench_unseal(bencher: divan::Bencher) {
    let config = bench_config();
    let payload = Payload::new("bench.bin", "application/octet-stream", make_data(65536));
    let recipients = recipients(5);
    let secret = SecretString::from("bench-secret");
    let bytes = seal(&payload, &recipients, &secret, &config).unwrap();
    bencher.bench(|| unseal(divan::black_box(&bytes), divan::black_box(&recipients[2])).unwrap());
}

fn main() {
    divan::main();
}
