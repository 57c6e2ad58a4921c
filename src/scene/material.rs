//! Material Resolver: (slot, color, finish) → shared material instance.

use crate::domain::model::{Configuration, Finish, SlotId};
use std::collections::HashMap;
use std::sync::Arc;

/// Linear RGBA
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 解析 sRGB 十六進位色碼 (`#RGB` / `#RRGGBB`) 並轉為線性色彩空間
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let (r, g, b) = match digits.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);
                (nibble(0)?, nibble(1)?, nibble(2)?)
            }
            6 => {
                let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
                (byte(0)?, byte(2)?, byte(4)?)
            }
            _ => return None,
        };

        Some(Self::rgba(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
            1.0,
        ))
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Which faces are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    /// Back faces culled
    #[default]
    Front,
    Double,
}

/// PBR metallic-roughness material description
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub name: String,
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub side: Side,
}

impl MaterialDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
            side: Side::Front,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn is_double_sided(&self) -> bool {
        self.side == Side::Double
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishPreset {
    pub metalness: f32,
    pub roughness: f32,
}

impl FinishPreset {
    pub fn for_finish(finish: Finish) -> Self {
        match finish {
            Finish::Metallic => Self {
                metalness: 1.0,
                roughness: 0.1,
            },
            Finish::Matte => Self {
                metalness: 0.1,
                roughness: 0.9,
            },
            Finish::Standard => Self {
                metalness: 0.3,
                roughness: 0.3,
            },
        }
    }
}

pub const STRING_MATERIAL_NAME: &str = "balloon_string";

/// 綁繩材質。細長幾何若雙面渲染會出現瑕疵，必須只渲染正面。
pub fn string_material() -> MaterialDescriptor {
    MaterialDescriptor::new(STRING_MATERIAL_NAME)
        .color(Color::WHITE)
        .roughness(0.8)
        .metalness(0.1)
        .side(Side::Front)
}

/// Cache key: the three fields concatenated
pub fn material_key(slot: SlotId, color: &str, finish: Finish) -> String {
    format!("{}{}{}", slot, color, finish.as_str())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Builds balloon materials once per key and hands out the same `Arc` afterwards, so the
/// exporter can deduplicate materials by identity. One resolver per export call.
#[derive(Debug)]
pub struct MaterialResolver {
    cache: HashMap<String, Arc<MaterialDescriptor>>,
    string_material: Arc<MaterialDescriptor>,
    hits: u64,
    misses: u64,
}

impl MaterialResolver {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            string_material: Arc::new(string_material()),
            hits: 0,
            misses: 0,
        }
    }

    pub fn resolve(&mut self, slot: SlotId, color: &str, finish: Finish) -> Arc<MaterialDescriptor> {
        let key = material_key(slot, color, finish);
        if let Some(material) = self.cache.get(&key) {
            self.hits += 1;
            return Arc::clone(material);
        }

        self.misses += 1;
        let parsed = Color::from_hex(color).unwrap_or_else(|| {
            tracing::warn!("Unparseable color '{}' for slot {}, using white", color, slot);
            Color::WHITE
        });
        let preset = FinishPreset::for_finish(finish);
        let material = Arc::new(
            MaterialDescriptor::new(format!(
                "{}_{}_{}",
                slot,
                finish.as_str(),
                color.trim_start_matches('#')
            ))
            .color(parsed)
            .metalness(preset.metalness)
            .roughness(preset.roughness),
        );

        self.cache.insert(key, Arc::clone(&material));
        material
    }

    /// 只查快取，不建立新材質
    pub fn lookup(&self, slot: SlotId, color: &str, finish: Finish) -> Option<Arc<MaterialDescriptor>> {
        self.cache.get(&material_key(slot, color, finish)).cloned()
    }

    /// Resolves a material for every configured slot ahead of the scene traversal
    pub fn warm(&mut self, configuration: &Configuration) -> usize {
        for (slot, spec) in &configuration.slots {
            self.resolve(*slot, &spec.color, spec.finish);
        }
        self.cache.len()
    }

    pub fn string_material(&self) -> Arc<MaterialDescriptor> {
        Arc::clone(&self.string_material)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            entries: self.cache.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

impl Default for MaterialResolver {
    fn default() -> Self {
        Self::new()
    }
}
