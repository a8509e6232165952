use serde::{Deserialize, Serialize};

/// Ratios of the overall image size, as Rekognition reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
    pub left: f32,
    pub top: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    pub confidence: f32,
}

/// `{"Name": ..}` entries used by `Parents`, `Aliases` and `Categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LabelName {
    pub name: String,
}

impl LabelName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One general label. The JSON shape follows the DetectLabels response so
/// callers see the upstream structure unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    pub name: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Instance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<LabelName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<LabelName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<LabelName>,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
            instances: Vec::new(),
            parents: Vec::new(),
            aliases: Vec::new(),
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polygon: Vec<Point>,
}

/// One label from the custom model, shaped like a DetectCustomLabels entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomLabel {
    pub name: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl CustomLabel {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
            geometry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_json_shape() {
        let mut label = Label::new("Car", 98.5);
        label.instances.push(Instance {
            bounding_box: Some(BoundingBox {
                width: 0.5,
                height: 0.25,
                left: 0.1,
                top: 0.2,
            }),
            confidence: 97.0,
        });
        label.parents.push(LabelName::new("Vehicle"));
        label.categories.push(LabelName::new("Vehicles and Automotive"));

        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(value["Name"], "Car");
        assert_eq!(value["Instances"][0]["BoundingBox"]["Width"], 0.5);
        assert_eq!(value["Parents"][0]["Name"], "Vehicle");
        assert_eq!(value["Categories"][0]["Name"], "Vehicles and Automotive");
        assert!(value.get("Aliases").is_none());
    }

    #[test]
    fn test_custom_label_json_shape() {
        let mut label = CustomLabel::new("scratch", 88.0);
        assert!(serde_json::to_value(&label).unwrap().get("Geometry").is_none());

        label.geometry = Some(Geometry {
            bounding_box: Some(BoundingBox {
                width: 0.5,
                height: 0.5,
                left: 0.25,
                top: 0.25,
            }),
            polygon: vec![Point { x: 0.25, y: 0.25 }],
        });

        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(value["Geometry"]["BoundingBox"]["Left"], 0.25);
        assert_eq!(value["Geometry"]["Polygon"][0]["X"], 0.25);
        assert!(value.get("Instances").is_none());
    }
}
