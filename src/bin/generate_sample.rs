//! Writes synthetic instrument exports for trying the reporter without a
//! potentiostat: `.pssession` chronopotentiometry sessions (UTF-16, as the
//! instrument software saves them) and `.txt` cyclic-voltammetry sweeps.
//!
//! ```text
//! cargo run --bin generate_sample -- sample_data
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut state = [0u64; 4];
        let mut x = seed;
        for slot in &mut state {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state }
    }

    fn next_u64(&mut self) -> u64 {
        let s = &mut self.state;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;
        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Session with a noisy potential settling towards `level` volts. Roughly
/// one sample in twelve carries a non-zero status flag.
fn session_json(level: f64, n: usize, rng: &mut SimpleRng) -> serde_json::Value {
    let time: Vec<_> = (0..n)
        .map(|i| json!({ "V": i as f64 * 0.1, "S": 0 }))
        .collect();
    let potential: Vec<_> = (0..n)
        .map(|i| {
            let settle = 1.0 - (-(i as f64) / 15.0).exp();
            let v = level * settle + rng.gauss(0.0, level * 0.02);
            let status = if rng.next_f64() < 1.0 / 12.0 { 2 } else { 0 };
            json!({ "V": v, "S": status })
        })
        .collect();

    json!({
        "Type": "PalmSens.DataFiles.SessionFile",
        "Measurements": [{
            "Title": "Chronopotentiometry",
            "DataSet": { "Values": [
                { "Description": "potential", "Unit": { "S": "V" }, "DataValues": potential },
                { "Description": "time", "Unit": { "S": "s" }, "DataValues": time }
            ]}
        }]
    })
}

fn write_utf16(path: &Path, text: &str) -> Result<()> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

/// Sweep from -0.6 V to +0.6 V with an oxidation peak scaled by concentration.
fn sweep_text(concentration: f64, rng: &mut SimpleRng) -> String {
    let mut out = String::from("Method: CV\nScan rate: 0.05 V/s\nE (V)\ti (uA)\n");
    for i in 0..=240 {
        let e = -0.6 + i as f64 * 0.005;
        let i_ua = 0.35 + 0.042 * concentration * gaussian(e, 0.18, 0.06, 1.0)
            + 0.8 * e
            + rng.gauss(0.0, 0.01);
        out.push_str(&format!("{e:.3}\t{i_ua:.5}\t0\n"));
    }
    out
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let levels = [0.0011, 0.0024, 0.0052, 0.0098];
    for (i, &level) in levels.iter().enumerate() {
        let path = out_dir.join(format!("creatinine_{:02}.pssession", i + 1));
        let text = serde_json::to_string(&session_json(level, 120, &mut rng))?;
        write_utf16(&path, &text)?;
    }

    let concentrations = [5.0, 25.0, 50.0, 100.0];
    for &c in &concentrations {
        let path = out_dir.join(format!("cv_{c:.0}uM.txt"));
        std::fs::write(&path, sweep_text(c, &mut rng))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "Wrote {} sessions and {} sweeps to {}",
        levels.len(),
        concentrations.len(),
        out_dir.display()
    );
    Ok(())
}
