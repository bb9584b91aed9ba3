use safeshare_crypto::{decrypt, encrypt, PlaintextFile};

fn make_file(size: usize) -> PlaintextFile {
    let bytes = (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect();
    PlaintextFile::new("bench.bin", "application/octet-stream", bytes)
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let file = make_file(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| encrypt(divan::black_box(&file)).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let file = make_file(size);
    let (blob, metadata) = encrypt(&file).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            decrypt(
                divan::black_box(&blob),
                divan::black_box(&metadata),
                "bench.bin",
            )
            .unwrap()
        });
}

fn main() {
    divan::main();
}
