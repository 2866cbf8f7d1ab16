//! JSON file access for the command line front end. The checks themselves
//! never touch storage.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};

use crate::{Feature, PolygonFeature};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        return Err(anyhow::anyhow!("The provided path {:?} does not exist", path));
    }
    let file = File::open(path).with_context(|| format!("Could not open {path:?}"))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse {path:?}"))
}

/// Line features: `[{"id": 1, "parts": [[{"x": 0.0, "y": 0.0}, ...]]}, ...]`.
pub fn read_features(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let features: Vec<Feature> = read_json(path)?;
    tracing::info!(path = %path.display(), features = features.len(), "input loaded");
    Ok(features)
}

/// Polygon features: `[{"id": 1, "polygon": {"exterior": [...], "interiors": []}}, ...]`.
pub fn read_polygon_features(path: &Path) -> anyhow::Result<Vec<PolygonFeature>> {
    let features: Vec<PolygonFeature> = read_json(path)?;
    tracing::info!(path = %path.display(), features = features.len(), "input loaded");
    Ok(features)
}

pub fn write_json<T: Serialize + ?Sized>(value: &T, out_path: &Path) -> anyhow::Result<()> {
    let file =
        File::create(out_path).with_context(|| format!("Could not create {out_path:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    tracing::info!(path = %out_path.display(), "results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn missing_file() {
        let error = read_features(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn features_round_trip_through_a_file() {
        let path = std::env::temp_dir().join(format!("road-topology-io-{}.json", std::process::id()));
        let features = vec![Feature::new(
            4,
            vec![line_string![(x: 0., y: 0.), (x: 1., y: 2.)]],
        )];
        write_json(&features, &path).unwrap();
        let read = read_features(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read, features);
    }

    #[test]
    fn parses_documented_layout() {
        let feature: Feature =
            serde_json::from_str(r#"{"id": 9, "parts": [[{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}]]}"#)
                .unwrap();
        assert_eq!(feature.id, 9);
        assert_eq!(feature.parts[0], line_string![(x: 1., y: 2.), (x: 3., y: 4.)]);
    }
}
