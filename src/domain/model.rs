use crate::utils::error::{BouquetError, Result};
use crate::utils::validation::{validate_hex_color, validate_required_field, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 花束中的七個氣球位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    Top,
    Middle1,
    Middle2,
    Middle3,
    Bottom1,
    Bottom2,
    Bottom3,
}

impl SlotId {
    pub const ALL: [SlotId; 7] = [
        SlotId::Top,
        SlotId::Middle1,
        SlotId::Middle2,
        SlotId::Middle3,
        SlotId::Bottom1,
        SlotId::Bottom2,
        SlotId::Bottom3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotId::Top => "top",
            SlotId::Middle1 => "middle1",
            SlotId::Middle2 => "middle2",
            SlotId::Middle3 => "middle3",
            SlotId::Bottom1 => "bottom1",
            SlotId::Bottom2 => "bottom2",
            SlotId::Bottom3 => "bottom3",
        }
    }

    /// 不分大小寫 (`Top`、`middle1` 皆可)
    pub fn parse(value: &str) -> Option<Self> {
        SlotId::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotId {
    type Err = BouquetError;

    fn from_str(s: &str) -> Result<Self> {
        SlotId::parse(s).ok_or_else(|| BouquetError::validation(format!("Unknown slot: {}", s)))
    }
}

/// A = latex (round), B = heart, C = star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    A,
    B,
    C,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::A, Shape::B, Shape::C];

    pub fn letter(&self) -> char {
        match self {
            Shape::A => 'A',
            Shape::B => 'B',
            Shape::C => 'C',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Shape::A),
            'B' => Some(Shape::B),
            'C' => Some(Shape::C),
            _ => None,
        }
    }
}

impl FromStr for Shape {
    type Err = BouquetError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Shape::from_letter(letter),
            _ => None,
        }
        .ok_or_else(|| BouquetError::validation(format!("Unknown shape: {}", s)))
    }
}

/// 表面材質。無法辨識的字串一律視為 standard。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Finish {
    #[default]
    Standard,
    Metallic,
    /// matte 與 pearl 共用同一組參數
    Matte,
}

impl Finish {
    pub fn as_str(&self) -> &'static str {
        match self {
            Finish::Standard => "standard",
            Finish::Metallic => "metallic",
            Finish::Matte => "matte",
        }
    }
}

impl From<&str> for Finish {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "metallic" => Finish::Metallic,
            "matte" | "pearl" => Finish::Matte,
            _ => Finish::Standard,
        }
    }
}

impl From<String> for Finish {
    fn from(value: String) -> Self {
        Finish::from(value.as_str())
    }
}

impl From<Finish> for String {
    fn from(value: Finish) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalloonSpec {
    pub shape: Shape,
    pub color: String,
    pub finish: Finish,
}

impl BalloonSpec {
    pub fn new(shape: Shape, color: impl Into<String>, finish: Finish) -> Self {
        Self {
            shape,
            color: color.into(),
            finish,
        }
    }
}

impl Default for BalloonSpec {
    fn default() -> Self {
        Self::new(Shape::A, DEFAULT_COLOR, Finish::Standard)
    }
}

pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// 使用者的花束設定：每個位置一筆形狀、顏色與材質
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ConfigurationPayload", try_from = "ConfigurationPayload")]
pub struct Configuration {
    pub slots: BTreeMap<SlotId, BalloonSpec>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, slot: SlotId, spec: BalloonSpec) -> Self {
        self.slots.insert(slot, spec);
        self
    }

    pub fn slot(&self, slot: SlotId) -> Option<&BalloonSpec> {
        self.slots.get(&slot)
    }

    /// 未設定的位置預設為 A
    pub fn effective_shape(&self, slot: SlotId) -> Shape {
        self.slots.get(&slot).map(|spec| spec.shape).unwrap_or_default()
    }

    /// Parses the camelCase request body. Any shape problem is a validation error, never a 5xx.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let payload: ConfigurationPayload = serde_json::from_slice(bytes)
            .map_err(|e| BouquetError::validation(format!("Malformed configuration body: {}", e)))?;
        Configuration::try_from(payload)
    }
}

impl Validate for Configuration {
    fn validate(&self) -> Result<()> {
        for (slot, spec) in &self.slots {
            validate_hex_color(&format!("balloonColors.{}", slot), &spec.color)?;
        }
        Ok(())
    }
}

/// HTTP 傳輸格式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPayload {
    pub balloon_shapes: Option<BTreeMap<String, String>>,
    pub balloon_colors: Option<BTreeMap<String, String>>,
    #[serde(alias = "balloonMaterials", skip_serializing_if = "Option::is_none")]
    pub balloon_finishes: Option<BTreeMap<String, String>>,
}

impl TryFrom<ConfigurationPayload> for Configuration {
    type Error = BouquetError;

    fn try_from(payload: ConfigurationPayload) -> Result<Self> {
        let shapes = validate_required_field("balloonShapes", &payload.balloon_shapes)?;
        let colors = validate_required_field("balloonColors", &payload.balloon_colors)?;
        let finishes = payload.balloon_finishes.clone().unwrap_or_default();

        let mut configuration = Configuration::new();

        for (key, value) in shapes {
            let Some(slot) = SlotId::parse(key) else {
                tracing::debug!("Ignoring unknown slot '{}' in balloonShapes", key);
                continue;
            };
            let shape = value.parse::<Shape>().map_err(|_| BouquetError::InvalidConfigValueError {
                field: format!("balloonShapes.{}", key),
                value: value.clone(),
                reason: "Shape must be one of A, B, C".to_string(),
            })?;
            configuration.slots.entry(slot).or_default().shape = shape;
        }

        for (key, value) in colors {
            let Some(slot) = SlotId::parse(key) else {
                tracing::debug!("Ignoring unknown slot '{}' in balloonColors", key);
                continue;
            };
            validate_hex_color(&format!("balloonColors.{}", key), value)?;
            configuration.slots.entry(slot).or_default().color = value.clone();
        }

        for (key, value) in &finishes {
            if let Some(slot) = SlotId::parse(key) {
                configuration.slots.entry(slot).or_default().finish = Finish::from(value.as_str());
            }
        }

        Ok(configuration)
    }
}

impl From<Configuration> for ConfigurationPayload {
    fn from(configuration: Configuration) -> Self {
        let mut shapes = BTreeMap::new();
        let mut colors = BTreeMap::new();
        let mut finishes = BTreeMap::new();

        for (slot, spec) in configuration.slots {
            shapes.insert(slot.to_string(), spec.shape.letter().to_string());
            colors.insert(slot.to_string(), spec.color);
            finishes.insert(slot.to_string(), spec.finish.as_str().to_string());
        }

        Self {
            balloon_shapes: Some(shapes),
            balloon_colors: Some(colors),
            balloon_finishes: Some(finishes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationId(pub String);

impl ConfigurationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigurationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfiguration {
    pub id: ConfigurationId,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub configuration: Configuration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_payload() {
        let body = json!({
            "balloonShapes": {"top": "A", "middle1": "B"},
            "balloonColors": {"top": "#FF0000", "middle1": "#00FF00"},
            "balloonFinishes": {"top": "standard", "middle1": "metallic"}
        });

        let configuration = Configuration::from_json_slice(body.to_string().as_bytes()).unwrap();

        assert_eq!(configuration.slots.len(), 2);
        let middle1 = configuration.slot(SlotId::Middle1).unwrap();
        assert_eq!(middle1.shape, Shape::B);
        assert_eq!(middle1.color, "#00FF00");
        assert_eq!(middle1.finish, Finish::Metallic);
        assert_eq!(configuration.effective_shape(SlotId::Bottom3), Shape::A);
    }

    #[test]
    fn test_missing_colors_is_validation_error() {
        let body = json!({"balloonShapes": {"top": "A"}});
        let err = Configuration::from_json_slice(body.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("balloonColors"));
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let err = Configuration::from_json_slice(b"{not json").unwrap_err();
        assert!(matches!(err, BouquetError::ValidationError { .. }));
    }

    #[test]
    fn test_unknown_slots_are_ignored() {
        let body = json!({
            "balloonShapes": {"top": "C", "sideways": "B"},
            "balloonColors": {"top": "#123456", "sideways": "#000000"}
        });
        let configuration = Configuration::from_json_slice(body.to_string().as_bytes()).unwrap();
        assert_eq!(configuration.slots.len(), 1);
        assert_eq!(configuration.effective_shape(SlotId::Top), Shape::C);
    }

    #[test]
    fn test_invalid_shape_and_color_rejected() {
        let bad_shape = json!({"balloonShapes": {"top": "D"}, "balloonColors": {}});
        assert!(Configuration::from_json_slice(bad_shape.to_string().as_bytes()).is_err());

        let bad_color = json!({"balloonShapes": {}, "balloonColors": {"top": "red"}});
        let err = Configuration::from_json_slice(bad_color.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, BouquetError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_finish_is_lenient() {
        assert_eq!(Finish::from("METALLIC"), Finish::Metallic);
        assert_eq!(Finish::from("pearl"), Finish::Matte);
        assert_eq!(Finish::from("matte"), Finish::Matte);
        assert_eq!(Finish::from("glitter"), Finish::Standard);
        assert_eq!(Finish::from(""), Finish::Standard);
    }

    #[test]
    fn test_materials_alias_and_partial_slots() {
        let body = json!({
            "balloonShapes": {"bottom2": "b"},
            "balloonColors": {"top": "#abc"},
            "balloonMaterials": {"bottom2": "pearl"}
        });
        let configuration = Configuration::from_json_slice(body.to_string().as_bytes()).unwrap();

        let bottom2 = configuration.slot(SlotId::Bottom2).unwrap();
        assert_eq!(bottom2.shape, Shape::B);
        assert_eq!(bottom2.color, DEFAULT_COLOR);
        assert_eq!(bottom2.finish, Finish::Matte);
        assert_eq!(configuration.slot(SlotId::Top).unwrap().shape, Shape::A);
    }

    #[test]
    fn test_serialize_back_to_wire_format() {
        let configuration = Configuration::new().with_slot(
            SlotId::Middle3,
            BalloonSpec::new(Shape::C, "#0000FF", Finish::Matte),
        );
        let value = serde_json::to_value(&configuration).unwrap();
        assert_eq!(value["balloonShapes"]["middle3"], "C");
        assert_eq!(value["balloonColors"]["middle3"], "#0000FF");
        assert_eq!(value["balloonFinishes"]["middle3"], "matte");
    }

    #[test]
    fn test_slot_parsing() {
        assert_eq!(SlotId::parse("Top"), Some(SlotId::Top));
        assert_eq!(SlotId::parse("BOTTOM3"), Some(SlotId::Bottom3));
        assert_eq!(SlotId::parse("middle4"), None);
        assert_eq!("middle2".parse::<SlotId>().unwrap(), SlotId::Middle2);
    }
}
