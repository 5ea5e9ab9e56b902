//! Writes synthetic simulator output for trying out `freqscan`:
//!
//! - `scan1.out`..`scan5.out`: frequency scans with `F(Hz)  |Z+|(ohms)`
//!   headers, 60..3000 Hz, each with resonances at known frequencies
//! - `wave1.out`, `wave2.out` plus `wave.inf`: headerless time-domain traces
//!   whose columns are named by the description file
//!
//! Usage: `generate_sample [OUTPUT_DIR]` (default `sample_data`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Lorentzian resonance centred at `f0` with half-width `gamma`.
fn resonance(f: f64, f0: f64, gamma: f64, amplitude: f64) -> f64 {
    amplitude * gamma.powi(2) / ((f - f0).powi(2) + gamma.powi(2))
}

fn generate_scan(frequencies: &[f64], resonances: &[(f64, f64, f64)], noise_level: f64, rng: &mut SimpleRng) -> Vec<f64> {
    frequencies
        .iter()
        .map(|&f| {
            // Inductive background rising with frequency.
            let background = 0.2 + f * 1e-4;
            let signal: f64 = resonances
                .iter()
                .map(|&(f0, gamma, amp)| resonance(f, f0, gamma, amp))
                .sum();
            (background + signal + rng.gauss(0.0, noise_level)).max(0.0)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_scans(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    // 60 → 3000 Hz, step 5
    let frequencies: Vec<f64> = (0..=588).map(|i| 60.0 + i as f64 * 5.0).collect();

    let cases: [&[(f64, f64, f64)]; 5] = [
        &[(420.0, 15.0, 40.0)],
        &[(660.0, 20.0, 25.0), (1740.0, 30.0, 12.0)],
        &[(300.0, 10.0, 60.0)],
        &[(900.0, 25.0, 18.0), (2100.0, 40.0, 9.0)],
        &[(1260.0, 20.0, 30.0)],
    ];

    for (i, resonances) in cases.iter().enumerate() {
        let z = generate_scan(&frequencies, resonances, 0.01, rng);
        let path = dir.join(format!("scan{}.out", i + 1));
        let mut out = create(&path)?;
        writeln!(out, "    F(Hz)          |Z+|(ohms)      ANG(Z+)")?;
        for (f, z) in frequencies.iter().zip(&z) {
            let angle = rng.gauss(0.0, 30.0);
            writeln!(out, "  {f:12.4}  {z:16.8}  {angle:10.4}")?;
        }
        out.flush()?;
    }
    Ok(cases.len())
}

fn write_waves(dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let names = ["Ia", "Ib", "Ic", "Va", "Vb", "Vc"];

    let mut inf = create(&dir.join("wave.inf"))?;
    for (i, name) in names.iter().enumerate() {
        writeln!(inf, "PGB({}) Output Desc=\"{name}\" Group=\"Main\" Max=2.0 Min=-2.0 Units=\"kA\"", i + 1)?;
    }
    inf.flush()?;

    // Three traces per file, sampled in seconds; the report shows minutes.
    for (file, offset) in [(1usize, 0usize), (2, 3)] {
        let mut out = create(&dir.join(format!("wave{file}.out")))?;
        for step in 0..=600 {
            let t = step as f64 * 0.5;
            write!(out, " {t:10.4}")?;
            for k in 0..3 {
                let phase = (offset + k) as f64 * 2.0 * std::f64::consts::PI / 3.0;
                let v = (2.0 * std::f64::consts::PI * t / 120.0 + phase).sin() + rng.gauss(0.0, 0.01);
                write!(out, " {v:12.6}")?;
            }
            writeln!(out)?;
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let scans = write_scans(&dir, &mut rng)?;
    write_waves(&dir, &mut rng)?;

    println!(
        "Wrote {scans} frequency scans and 2 time-domain files (+ wave.inf) to {}",
        dir.display()
    );
    Ok(())
}
