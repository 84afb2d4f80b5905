//! JSON result writer for alignment and landmark outputs.

use std::fs;
use std::path::{Path, PathBuf};

use mica_curve::{AnnotatedCurve, Category, Provenance};
use mica_pica::IntervalDecomposition;
use mica_progressive::AlignmentNode;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::RunName;
use crate::IoError;

/// Writes alignment and landmark results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{run}_alignment.json` and `{run}_landmarks.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    run: RunName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), run = %run))]
    pub fn new(output_dir: &Path, run: RunName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            run,
        })
    }

    /// Return the path of the alignment result file.
    #[must_use]
    pub fn alignment_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_alignment.json", self.run.as_str()))
    }

    /// Return the path of the landmark result file.
    #[must_use]
    pub fn landmarks_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_landmarks.json", self.run.as_str()))
    }

    /// Write a progressive alignment to `{run}_alignment.json`.
    ///
    /// Records the guide tree, the distance of the final fusion, every warped
    /// member curve in input order, and the consensus.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_alignment(&self, root: &AlignmentNode) -> Result<(), IoError> {
        let path = self.alignment_path();
        let curves: Vec<CurveEntry> = root
            .members()
            .iter()
            .zip(root.input_indices())
            .map(|(m, &input)| CurveEntry::new(m, Some(input)))
            .collect();

        let artifact = AlignmentArtifact {
            run: self.run.as_str(),
            guide_tree: root.guide_tree(),
            distance: root.alignment().map(|a| a.distance()),
            n_curves: curves.len(),
            n_intervals: root.consensus().size(),
            curves,
            consensus: CurveEntry::new(root.consensus(), None),
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "alignment result written");
        Ok(())
    }

    /// Write the filtered landmarks of every curve to `{run}_landmarks.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_curves = curves.len()))]
    pub fn write_landmarks<C: AsRef<AnnotatedCurve>>(&self, curves: &[C]) -> Result<(), IoError> {
        let path = self.landmarks_path();
        let entries: Vec<LandmarkCurveEntry> = curves
            .iter()
            .map(|c| {
                let c = c.as_ref();
                let x = c.curve().x();
                let y = c.curve().y();
                let landmarks = c
                    .filtered_landmarks()
                    .iter()
                    .map(|l| LandmarkEntry {
                        index: l.index,
                        x: x[l.index],
                        y: y[l.index],
                        category: l.category(),
                        provenance: l.kind.provenance(),
                    })
                    .collect();
                LandmarkCurveEntry {
                    name: c.name(),
                    landmarks,
                }
            })
            .collect();

        let artifact = LandmarksArtifact {
            run: self.run.as_str(),
            curves: entries,
        };
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "landmarks written");
        Ok(())
    }

    fn write_json<T: Serialize>(&self, path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).expect("serialization cannot fail");
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct AlignmentArtifact<'a> {
    run: &'a str,
    guide_tree: String,
    distance: Option<f64>,
    n_curves: usize,
    n_intervals: usize,
    curves: Vec<CurveEntry<'a>>,
    consensus: CurveEntry<'a>,
}

#[derive(Serialize)]
struct CurveEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_index: Option<usize>,
    x: &'a [f64],
    y: &'a [f64],
    slope: Vec<f64>,
    boundaries: Vec<f64>,
}

impl<'a> CurveEntry<'a> {
    fn new(d: &'a IntervalDecomposition, input_index: Option<usize>) -> Self {
        Self {
            name: d.name(),
            input_index,
            x: d.curve().x(),
            y: d.curve().y(),
            slope: d.curve().slopes().to_vec(),
            boundaries: d.boundary_positions(),
        }
    }
}

#[derive(Serialize)]
struct LandmarksArtifact<'a> {
    run: &'a str,
    curves: Vec<LandmarkCurveEntry<'a>>,
}

#[derive(Serialize)]
struct LandmarkCurveEntry<'a> {
    name: &'a str,
    landmarks: Vec<LandmarkEntry>,
}

#[derive(Serialize)]
struct LandmarkEntry {
    index: usize,
    x: f64,
    y: f64,
    category: Category,
    provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use mica_pica::{CancelToken, Distance, PicaConfig};
    use mica_progressive::MicaConfig;
    use tempfile::TempDir;

    fn bump(name: &str, centre: f64) -> Arc<AnnotatedCurve> {
        let y = (0..61)
            .map(|i| {
                let t = f64::from(i) / 60.0 - centre;
                (-t * t * 40.0).exp()
            })
            .collect();
        Arc::new(AnnotatedCurve::new(name, y).unwrap())
    }

    fn test_curves() -> Vec<Arc<AnnotatedCurve>> {
        vec![bump("A", 0.5), bump("B", 0.4), bump("C", 0.6)]
    }

    fn aligned(curves: &[Arc<AnnotatedCurve>]) -> AlignmentNode {
        MicaConfig::new(PicaConfig::new(Distance::mean_absolute(50).unwrap()))
            .align(curves, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap()
    }

    fn splits(node: &AlignmentNode) -> usize {
        match node.children() {
            Some((left, right)) => {
                node.alignment().map_or(0, |a| a.splits()) + splits(left) + splits(right)
            }
            None => 0,
        }
    }

    fn read(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn write_alignment_json_structure() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), RunName::new("test_run".into()).unwrap()).unwrap();
        let root = aligned(&test_curves());
        writer.write_alignment(&root).unwrap();

        let content = read(&dir.path().join("test_run_alignment.json"));
        assert_eq!(content["run"], "test_run");
        assert_eq!(content["n_curves"], 3);
        assert!(content["distance"].is_number());
        assert!(content["guide_tree"].as_str().unwrap().starts_with('('));

        let curves = content["curves"].as_array().unwrap();
        assert_eq!(curves.len(), 3);
        for (entry, name) in curves.iter().zip(["A", "B", "C"]) {
            assert_eq!(entry["name"], name);
            let n = entry["x"].as_array().unwrap().len();
            assert_eq!(entry["y"].as_array().unwrap().len(), n);
            assert_eq!(entry["slope"].as_array().unwrap().len(), n);
        }
        assert!(splits(&root) > 0);
        assert!(content["consensus"]["input_index"].is_null());
        assert!(content["consensus"]["boundaries"].is_array());
    }

    #[test]
    fn write_landmarks_lists_filtered_landmarks() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), RunName::new("lm".into()).unwrap()).unwrap();
        let curves = test_curves();
        writer.write_landmarks(&curves).unwrap();

        let content = read(&dir.path().join("lm_landmarks.json"));
        let first = &content["curves"][0];
        assert_eq!(first["name"], "A");
        let landmarks = first["landmarks"].as_array().unwrap();
        assert_eq!(landmarks.first().unwrap()["category"], "start");
        assert_eq!(landmarks.last().unwrap()["category"], "end");
        assert!(landmarks
            .iter()
            .any(|l| l["category"] == "maximum" && l["index"] == 30 && l["provenance"] == "automatic"));
    }

    #[test]
    fn creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("deep");
        let writer = ResultWriter::new(&nested, RunName::new("nested_test".into()).unwrap()).unwrap();
        writer.write_landmarks(&test_curves()).unwrap();
        assert!(nested.join("nested_test_landmarks.json").exists());
    }

    #[test]
    fn single_curve_alignment_has_no_distance() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), RunName::new("one".into()).unwrap()).unwrap();
        let root = aligned(&test_curves()[..1]);
        writer.write_alignment(&root).unwrap();
        let content = read(&writer.alignment_path());
        assert!(content["distance"].is_null());
        assert_eq!(content["guide_tree"], "A");
    }
}
