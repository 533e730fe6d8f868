//! Exported configuration records for placement results and vehicle routes.
//!
//! With the `serde` feature the records serialize to JSON in the shapes
//!
//! ```text
//! [{"classIdentity": "...", "transforms": [{"location": [x, y, z], "rotation": [pitch, yaw, roll]}]}]
//! {"vehicleClass": "...", "speedLimit": 13.9, "waypoints": [[x, y, z], ...]}
//! ```
//!
//! Import is lenient: a malformed field is reported as a [`ConfigIssue`], logged, and left
//! at its default while the rest of the document is still read.
use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{Rotator, Transform};
use crate::placement::PlacementResult;
use crate::scene::ClassId;

/// One exported transform.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformRecord {
    pub location: [f32; 3],
    pub rotation: [f32; 3],
}

impl From<&Transform> for TransformRecord {
    fn from(t: &Transform) -> Self {
        Self {
            location: t.location.to_array(),
            rotation: t.rotation.to_array(),
        }
    }
}

impl From<&TransformRecord> for Transform {
    fn from(r: &TransformRecord) -> Self {
        Transform::new(Vec3::from_array(r.location), Rotator::from(r.rotation))
    }
}

/// Accepted transforms of one class.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnedObjectRecord {
    pub class_identity: ClassId,
    pub transforms: Vec<TransformRecord>,
}

/// Exported result of a placement pass.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnedObjectsConfig {
    pub records: Vec<SpawnedObjectRecord>,
}

impl SpawnedObjectsConfig {
    pub fn from_result(result: &PlacementResult) -> Self {
        let records = result
            .iter()
            .map(|(class, transforms)| SpawnedObjectRecord {
                class_identity: class.clone(),
                transforms: transforms.iter().map(TransformRecord::from).collect(),
            })
            .collect();
        Self { records }
    }

    /// Transforms grouped by class, in record order. Repeated classes are concatenated.
    pub fn transforms_by_class(&self) -> BTreeMap<ClassId, Vec<Transform>> {
        let mut out: BTreeMap<ClassId, Vec<Transform>> = BTreeMap::new();
        for record in &self.records {
            out.entry(record.class_identity.clone())
                .or_default()
                .extend(record.transforms.iter().map(Transform::from));
        }
        out
    }

    pub fn total_transforms(&self) -> usize {
        self.records.iter().map(|r| r.transforms.len()).sum()
    }
}

impl From<&PlacementResult> for SpawnedObjectsConfig {
    fn from(result: &PlacementResult) -> Self {
        Self::from_result(result)
    }
}

/// Exported vehicle route. `speed_limit` is in meters per second.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePathConfig {
    pub vehicle_class: ClassId,
    pub speed_limit: f32,
    pub waypoints: Vec<[f32; 3]>,
}

impl VehiclePathConfig {
    pub fn waypoint_locations(&self) -> Vec<Vec3> {
        self.waypoints.iter().copied().map(Vec3::from_array).collect()
    }
}

/// A field that could not be read during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// JSON path of the field, e.g. `[0].transforms[2].location`.
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An imported value plus every issue met while reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported<T> {
    pub value: T,
    pub issues: Vec<ConfigIssue>,
}

impl<T> Imported<T> {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(feature = "serde")]
mod json {
    use serde_json::{Map, Value};
    use tracing::warn;

    use super::*;
    use crate::error::Result;

    const CLASS_IDENTITY: &str = "classIdentity";
    const TRANSFORMS: &str = "transforms";
    const LOCATION: &str = "location";
    const ROTATION: &str = "rotation";
    const VEHICLE_CLASS: &str = "vehicleClass";
    const SPEED_LIMIT: &str = "speedLimit";
    const WAYPOINTS: &str = "waypoints";

    struct Reader {
        issues: Vec<ConfigIssue>,
    }

    impl Reader {
        fn new() -> Self {
            Self { issues: Vec::new() }
        }

        fn issue(&mut self, field: &str, message: impl Into<String>) {
            let issue = ConfigIssue::new(field, message);
            warn!("Config import: {issue}.");
            self.issues.push(issue);
        }

        fn finish<T>(self, value: T) -> Imported<T> {
            Imported {
                value,
                issues: self.issues,
            }
        }

        fn string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> String {
            let field = format!("{path}.{key}");
            match obj.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(_) => {
                    self.issue(&field, "expected a string");
                    String::new()
                }
                None => {
                    self.issue(&field, "missing");
                    String::new()
                }
            }
        }

        fn number(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> f32 {
            let field = format!("{path}.{key}");
            match obj.get(key).map(Value::as_f64) {
                Some(Some(n)) => n as f32,
                Some(None) => {
                    self.issue(&field, "expected a number");
                    0.0
                }
                None => {
                    self.issue(&field, "missing");
                    0.0
                }
            }
        }

        fn array<'v>(&mut self, value: Option<&'v Value>, field: &str) -> &'v [Value] {
            match value {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    self.issue(field, "expected an array");
                    &[]
                }
                None => {
                    self.issue(field, "missing");
                    &[]
                }
            }
        }

        /// Three numbers, or zeros with an issue.
        fn triple(&mut self, value: Option<&Value>, field: &str) -> [f32; 3] {
            let items = self.array(value, field);
            if items.is_empty() && !matches!(value, Some(Value::Array(_))) {
                return [0.0; 3];
            }
            if items.len() != 3 {
                self.issue(
                    field,
                    format!(
                        "Instead of size 3, the JSON array is of size {}",
                        items.len()
                    ),
                );
                return [0.0; 3];
            }
            let mut out = [0.0; 3];
            for (i, item) in items.iter().enumerate() {
                match item.as_f64() {
                    Some(n) => out[i] = n as f32,
                    None => {
                        self.issue(&format!("{field}[{i}]"), "expected a number");
                        return [0.0; 3];
                    }
                }
            }
            out
        }

        fn object<'v>(&mut self, value: &'v Value, field: &str) -> Option<&'v Map<String, Value>> {
            match value {
                Value::Object(obj) => Some(obj),
                _ => {
                    self.issue(field, "expected an object");
                    None
                }
            }
        }
    }

    impl SpawnedObjectsConfig {
        pub fn to_json_string(&self) -> Result<String> {
            Ok(serde_json::to_string(self)?)
        }

        pub fn to_json_pretty(&self) -> Result<String> {
            Ok(serde_json::to_string_pretty(self)?)
        }

        /// Reads records leniently. Only text that is not JSON at all is an error.
        pub fn from_json_str(text: &str) -> Result<Imported<Self>> {
            let root: Value = serde_json::from_str(text)?;
            let mut reader = Reader::new();
            let mut records = Vec::new();

            for (i, item) in reader.array(Some(&root), "$").iter().enumerate() {
                let path = format!("[{i}]");
                let Some(obj) = reader.object(item, &path) else {
                    continue;
                };
                let class_identity = reader.string(obj, CLASS_IDENTITY, &path);
                let transforms_path = format!("{path}.{TRANSFORMS}");
                let transforms = reader
                    .array(obj.get(TRANSFORMS), &transforms_path)
                    .iter()
                    .enumerate()
                    .filter_map(|(j, t)| {
                        let tpath = format!("{transforms_path}[{j}]");
                        let tobj = reader.object(t, &tpath)?;
                        Some(TransformRecord {
                            location: reader
                                .triple(tobj.get(LOCATION), &format!("{tpath}.{LOCATION}")),
                            rotation: reader
                                .triple(tobj.get(ROTATION), &format!("{tpath}.{ROTATION}")),
                        })
                    })
                    .collect();
                records.push(SpawnedObjectRecord {
                    class_identity,
                    transforms,
                });
            }

            Ok(reader.finish(Self { records }))
        }
    }

    impl VehiclePathConfig {
        pub fn to_json_string(&self) -> Result<String> {
            Ok(serde_json::to_string(self)?)
        }

        pub fn to_json_pretty(&self) -> Result<String> {
            Ok(serde_json::to_string_pretty(self)?)
        }

        /// Reads a route leniently. Only text that is not JSON at all is an error.
        pub fn from_json_str(text: &str) -> Result<Imported<Self>> {
            let root: Value = serde_json::from_str(text)?;
            let mut reader = Reader::new();
            let Some(obj) = reader.object(&root, "$") else {
                return Ok(reader.finish(Self::default()));
            };

            let vehicle_class = reader.string(obj, VEHICLE_CLASS, "$");
            let speed_limit = reader.number(obj, SPEED_LIMIT, "$");
            let waypoints_path = format!("$.{WAYPOINTS}");
            let waypoints = reader
                .array(obj.get(WAYPOINTS), &waypoints_path)
                .iter()
                .enumerate()
                .map(|(i, w)| reader.triple(Some(w), &format!("{waypoints_path}[{i}]")))
                .collect();

            Ok(reader.finish(Self {
                vehicle_class,
                speed_limit,
                waypoints,
            }))
        }
    }

}
