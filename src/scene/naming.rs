//! Node-name conventions of the bouquet model.
//!
//! Both `balloon_top_A` / `string_top` and the concatenated `topA` / `stringTop` forms are
//! recognised; the slot part is case-insensitive, the shape letter is not.

use crate::domain::model::{Shape, SlotId};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Balloon { slot: SlotId, shape: Shape },
    String { slot: SlotId },
    /// 燈光、相機、群組等，不處理
    Other,
}

fn balloon_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?i:balloon)?[_-]?((?i:top|middle[123]|bottom[123]))[_-]?([ABC])$")
            .expect("balloon node pattern is valid")
    })
}

fn string_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?i:string)[_-]?((?i:top|middle[123]|bottom[123]))$")
            .expect("string node pattern is valid")
    })
}

pub fn classify(name: &str) -> NodeRole {
    if let Some(caps) = balloon_pattern().captures(name) {
        let slot = SlotId::parse(&caps[1]);
        let shape = caps[2].chars().next().and_then(Shape::from_letter);
        if let (Some(slot), Some(shape)) = (slot, shape) {
            return NodeRole::Balloon { slot, shape };
        }
    }

    if let Some(caps) = string_pattern().captures(name) {
        if let Some(slot) = SlotId::parse(&caps[1]) {
            return NodeRole::String { slot };
        }
    }

    NodeRole::Other
}

pub fn balloon_node_name(slot: SlotId, shape: Shape) -> String {
    format!("balloon_{}_{}", slot, shape.letter())
}

pub fn string_node_name(slot: SlotId) -> String {
    format!("string_{}", slot)
}
