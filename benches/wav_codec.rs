use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use spk::audio::{AudioFormat, encode_wav, parse_wav, trim_silence};
use spk::markup::segment;
use spk::stitcher::Stitcher;
use spk::synth::{MockSynthesizer, SynthParams};

/// One second of a sawtooth wrapped in a second of zero padding each side.
fn padded_tone(format: AudioFormat) -> Vec<i16> {
    let second = format.samples_per_second() as usize;
    let mut samples = vec![0i16; second];
    samples.extend((0..second).map(|i| ((i % 200) as i16 - 100) * 100 + 1));
    samples.extend(vec![0i16; second]);
    samples
}

fn codec_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("wav_codec");

    for format in [AudioFormat::new(1, 22050), AudioFormat::new(2, 48000)] {
        let samples = padded_tone(format);
        let wav = encode_wav(&samples, format);
        group.throughput(Throughput::Bytes(wav.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", format), &samples, |b, samples| {
            b.iter(|| encode_wav(black_box(samples), format))
        });
        group.bench_with_input(BenchmarkId::new("parse", format), &wav, |b, wav| {
            b.iter(|| parse_wav(black_box(wav)))
        });
        group.bench_with_input(BenchmarkId::new("trim", format), &samples, |b, samples| {
            b.iter(|| trim_silence(black_box(samples)).len())
        });
    }

    group.finish();
}

fn stitch_benchmark(c: &mut Criterion) {
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Skipping stitch benchmark: {}", e);
            return;
        }
    };
    let text = "Chapter one [1500] It was a bright cold day in April [400] \
                and the clocks were striking thirteen [2000] Part two";
    let segments = match segment(text) {
        Ok(segments) => segments,
        Err(e) => {
            eprintln!("Skipping stitch benchmark: {}", e);
            return;
        }
    };
    let stitcher = Stitcher::new(
        MockSynthesizer::new(AudioFormat::new(1, 22050))
            .with_samples_per_char(400)
            .with_padding(2000),
    );
    let params = SynthParams::default();

    c.bench_function("stitch_mock_paragraph", |b| {
        b.iter(|| runtime.block_on(stitcher.stitch(black_box(&segments), &params)))
    });
}

criterion_group!(benches, codec_benchmark, stitch_benchmark);
criterion_main!(benches);
