use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

/// Band-power feature columns, one per (channel, band).
const CHANNELS: [&str; 2] = ["fp1", "c3"];
const BANDS: [&str; 4] = ["delta", "theta", "alpha", "beta"];

/// Mean log band power per band for class 0 (baseline) and class 1 (event).
const BASELINE: [f64; 4] = [1.0, 0.6, 1.2, 0.4];
const EVENT: [f64; 4] = [2.2, 1.5, 0.5, 0.3];

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

fn column_names() -> Vec<String> {
    CHANNELS
        .iter()
        .flat_map(|ch| BANDS.iter().map(move |band| format!("{ch}_{band}")))
        .collect()
}

/// Class means laid out in column order.
fn class_means(bands: &[f64; 4]) -> Vec<f64> {
    CHANNELS.iter().flat_map(|_| bands.iter().copied()).collect()
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let names = column_names();
    let means = [class_means(&BASELINE), class_means(&EVENT)];

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for i in 0..60 {
        let class = usize::from(i % 3 == 0);
        rows.push(means[class].iter().map(|&m| rng.gauss(m, 0.25)).collect());
    }

    // CSV
    let csv_path = "sample_eeg.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV");
    writer.write_record(&names).expect("Failed to write header");
    for row in &rows {
        writer
            .write_record(row.iter().map(|v| format!("{v:.5}")))
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");

    // Parquet
    let schema = Arc::new(Schema::new(
        names
            .iter()
            .map(|n| Field::new(n, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));
    let columns: Vec<ArrayRef> = (0..names.len())
        .map(|c| Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r[c]))) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let parquet_path = "sample_eeg.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // Model manifests
    let width = names.len();
    let centroid = json!({
        "estimator": {
            "type": "nearest_centroid",
            "classes": [0, 1],
            "centroids": [means[0], means[1]],
        }
    });
    // Linear boundary halfway between the class means.
    let direction: Vec<f64> = means[1].iter().zip(&means[0]).map(|(a, b)| a - b).collect();
    let midpoint: Vec<f64> = means[1].iter().zip(&means[0]).map(|(a, b)| (a + b) / 2.0).collect();
    let intercept = -direction.iter().zip(&midpoint).map(|(d, m)| d * m).sum::<f64>();
    let linear = json!({
        "estimator": {
            "type": "linear",
            "classes": [0, 1],
            "coefficients": [direction],
            "intercepts": [intercept],
        }
    });
    let scaled = json!({
        "scaler": { "mean": midpoint, "scale": vec![0.5; width] },
        "estimator": {
            "type": "linear",
            "classes": [0, 1],
            "coefficients": [direction.iter().map(|d| d * 0.5).collect::<Vec<_>>()],
            "intercepts": [0.0],
        }
    });

    let single = json!({ "kind": "single", "model": centroid });
    let ensemble = json!({
        "kind": "ensemble",
        "batches": [
            { "models": [
                merge_name("centroid", &centroid),
                merge_name("linear", &linear),
            ] },
            { "models": [ merge_name("scaled", &scaled) ] },
        ]
    });

    for (path, manifest) in [("model.json", &single), ("ensemble.json", &ensemble)] {
        let text = serde_json::to_string_pretty(manifest).expect("Failed to serialise manifest");
        std::fs::write(path, text).expect("Failed to write manifest");
    }

    println!(
        "Wrote {} rows × {width} features to {csv_path} and {parquet_path}; manifests model.json and ensemble.json",
        rows.len()
    );
}

fn merge_name(name: &str, model: &serde_json::Value) -> serde_json::Value {
    let mut entry = model.clone();
    entry["name"] = json!(name);
    entry
}
